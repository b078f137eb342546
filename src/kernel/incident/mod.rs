//! Incident triage pipeline.
//!
//! transcript -> `detect_keywords` -> `classify`
//! transcript -> `extract_fields`
//!
//! Every entry point here is a total, pure function of its inputs plus the
//! `RuleSet`. Nothing logs, nothing fails, nothing is kept between calls.

pub mod classifier;
pub mod extractor;
pub mod matcher;
pub mod rules;
pub mod types;

pub use classifier::*;
pub use extractor::*;
pub use matcher::*;
pub use rules::*;
pub use types::*;

use serde::{Deserialize, Serialize};

use crate::kernel::event::TranscriptRevision;

/// One full pipeline pass, stamped with the transcript revision it read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub revision: TranscriptRevision,
    pub detected: Vec<DetectedKeyword>,
    pub classification: ClassificationResult,
    pub fields: ExtractedFieldSet,
}

pub fn analyse(
    transcript: &str,
    revision: TranscriptRevision,
    previous_fields: Option<&ExtractedFieldSet>,
    rules: &RuleSet,
) -> Analysis {
    let detected = detect_keywords(transcript, &rules.keywords);
    let classification = classify(&detected, rules);
    let fields = extract_fields(transcript, previous_fields, rules);

    Analysis {
        revision,
        detected,
        classification,
        fields,
    }
}
