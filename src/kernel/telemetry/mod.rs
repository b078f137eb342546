//! Session telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside decision logic (Reactor, Classifier, Extractor).
//!
//! # PRIVACY INVARIANT
//! Telemetry events must **NEVER** contain call content (transcript text,
//! caller name, phone, address). Only revisions, configured category ids,
//! field keys, enums and counts are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;
