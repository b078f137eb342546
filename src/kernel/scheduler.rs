use super::event::TranscriptRevision;
use super::state::ResultsView;
use crate::dispatch::{DispatchPriority, DispatchRequest};
use crate::kernel::incident::{ClassificationResult, ExtractedFieldSet, FieldKey};

pub struct Scheduler;

/// What the driver must do after a step. The kernel never performs these itself.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    Log(String),
    ClassificationChanged {
        revision: TranscriptRevision,
        result: ClassificationResult,
    },
    FieldsUpdated {
        revision: TranscriptRevision,
        changed: Vec<FieldKey>,
        fields: ExtractedFieldSet,
    },
    /// The dispatch gate flipped.
    DispatchReadiness {
        ready: bool,
        priority: DispatchPriority,
    },
    Dispatched(DispatchRequest),
    DispatchRejected { reason: String },
}

impl Scheduler {
    /// Pure Projection: (before, after) -> SideEffects for whatever changed.
    pub fn project(
        &self,
        before: &ResultsView,
        after: &ResultsView,
        revision: TranscriptRevision,
    ) -> Vec<SideEffect> {
        let mut effects = Vec::new();

        if before.classification != after.classification {
            effects.push(SideEffect::ClassificationChanged {
                revision,
                result: after.classification.clone(),
            });
        }

        let changed = after.fields.changed_keys(&before.fields);
        if !changed.is_empty() {
            effects.push(SideEffect::FieldsUpdated {
                revision,
                changed,
                fields: after.fields.clone(),
            });
        }

        if before.dispatch_ready != after.dispatch_ready {
            effects.push(SideEffect::DispatchReadiness {
                ready: after.dispatch_ready,
                priority: DispatchPriority::for_classification(&after.classification),
            });
        }

        effects
    }
}
