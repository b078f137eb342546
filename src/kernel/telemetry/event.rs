use serde::{Deserialize, Serialize};

use crate::kernel::event::TranscriptRevision;
use crate::kernel::incident::{CategoryId, ClassificationSource, FieldKey, Severity};
use crate::kernel::time::Tick;

// Allowed: IDs, Revisions, Field keys, Counts, Enums
// Forbidden: Transcript text, Caller identity, Addresses

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    TranscriptAppended {
        revision: TranscriptRevision,
        bytes: usize,
    },

    /// Analysis computed against an older revision and dropped.
    StaleAnalysisDiscarded {
        analysed: TranscriptRevision,
        current: TranscriptRevision,
    },

    ClassificationChanged {
        category: Option<CategoryId>,
        severity: Severity,
        source: ClassificationSource,
    },

    FieldLifecycle {
        field: FieldKey,
        event: FieldEventKind,
    },

    Dispatch {
        event: DispatchEventKind,
        tick: Tick,
    },

    CallEnded {
        duration_ticks: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldEventKind {
    Extracted,
    Verified,
    Reopened,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DispatchEventKind {
    Issued,
    Rejected,
}
