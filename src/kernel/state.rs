use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::event::TranscriptRevision;
use super::time::Tick;
use crate::dispatch::protocols::recommend;
use crate::dispatch::{can_dispatch, DispatchPriority, DispatchRequest};
use crate::kernel::incident::{
    Analysis, ClassificationResult, DetectedKeyword, ExtractedFieldSet, FieldEdit, FieldKey,
    IncidentCategory, IncidentClassifier, RuleSet, Severity,
};

/// Chunks are joined the way the live transcript panel shows them.
pub const CHUNK_SEPARATOR: &str = "\n\n";

/// Strict state delta. This is the ONLY way session state mutates.
#[derive(Debug, Clone)]
pub enum StateDelta {
    Tick(Tick),
    TranscriptAppended(String),
    CallerPhoneReceived(String),
    AnalysisCompleted(Analysis),
    /// Already resolved against the rule set.
    CategorySelected(IncidentCategory),
    SeveritySelected(Severity),
    OverrideCleared,
    FieldEdited(FieldEdit),
    FieldReopened(FieldKey),
    Dispatched(DispatchRequest),
    CallEnded,
}

/// The parts of the session the outside world reacts to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub classification: ClassificationResult,
    pub fields: ExtractedFieldSet,
    pub dispatch_ready: bool,
}

/// Serializable picture of the session for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub revision: TranscriptRevision,
    pub call_active: bool,
    pub detected: Vec<DetectedKeyword>,
    pub classification: ClassificationResult,
    pub fields: ExtractedFieldSet,
    pub dispatch_ready: bool,
    pub priority: DispatchPriority,
    pub recommended_protocols: Vec<String>,
    pub dispatch: Option<DispatchRequest>,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub session_id: Uuid,
    transcript: String,
    pub revision: TranscriptRevision,
    // Revision the current results were computed from
    analysed_revision: Option<TranscriptRevision>,
    // Monotonic, bumped by every delta
    pub version: u64,
    pub last_tick: Tick,
    pub call_active: bool,
    pub call_started_at: Tick,

    detected: Vec<DetectedKeyword>,
    classifier: IncidentClassifier,
    fields: ExtractedFieldSet,
    dispatch: Option<DispatchRequest>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            transcript: String::new(),
            revision: TranscriptRevision::default(),
            analysed_revision: None,
            version: 0,
            last_tick: Tick::new(),
            call_active: true,
            call_started_at: Tick::new(),
            detected: Vec::new(),
            classifier: IncidentClassifier::new(),
            fields: ExtractedFieldSet::default(),
            dispatch: None,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure reduction: State + Delta -> Mutated State
    pub fn reduce(&mut self, delta: StateDelta) {
        self.version += 1;

        match delta {
            StateDelta::Tick(t) => {
                self.last_tick = t;
            }
            StateDelta::TranscriptAppended(text) => {
                if !self.transcript.is_empty() {
                    self.transcript.push_str(CHUNK_SEPARATOR);
                }
                self.transcript.push_str(&text);
                self.revision = self.revision.next();
            }
            StateDelta::CallerPhoneReceived(phone) => {
                self.fields.set_caller_phone(&phone);
            }
            StateDelta::AnalysisCompleted(analysis) => {
                // Stale: computed against text that is no longer current.
                if analysis.revision != self.revision {
                    return;
                }
                self.detected = analysis.detected;
                self.classifier.observe(analysis.classification);
                self.fields = analysis.fields;
                self.analysed_revision = Some(analysis.revision);
            }
            StateDelta::CategorySelected(category) => {
                self.classifier.select_category(&category);
            }
            StateDelta::SeveritySelected(severity) => {
                self.classifier.select_severity(severity);
            }
            StateDelta::OverrideCleared => {
                self.classifier.clear_override();
            }
            StateDelta::FieldEdited(edit) => {
                self.fields.apply_edit(edit);
            }
            StateDelta::FieldReopened(key) => {
                self.fields.reopen(key);
            }
            StateDelta::Dispatched(request) => {
                self.dispatch = Some(request);
            }
            StateDelta::CallEnded => {
                self.call_active = false;
                self.transcript.clear();
                // Anything computed before the hang-up is now stale
                self.revision = self.revision.next();
                self.analysed_revision = None;
                self.detected.clear();
                self.classifier.reset();
                self.fields = ExtractedFieldSet::default();
            }
        }
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn analysed_revision(&self) -> Option<TranscriptRevision> {
        self.analysed_revision
    }

    pub fn detected(&self) -> &[DetectedKeyword] {
        &self.detected
    }

    pub fn classification(&self) -> &ClassificationResult {
        self.classifier.current()
    }

    pub fn is_overridden(&self) -> bool {
        self.classifier.is_overridden()
    }

    pub fn fields(&self) -> &ExtractedFieldSet {
        &self.fields
    }

    pub fn dispatch(&self) -> Option<&DispatchRequest> {
        self.dispatch.as_ref()
    }

    pub fn dispatch_ready(&self) -> bool {
        self.call_active && self.dispatch.is_none() && can_dispatch(self.classification())
    }

    pub fn view(&self) -> ResultsView {
        ResultsView {
            classification: self.classification().clone(),
            fields: self.fields.clone(),
            dispatch_ready: self.dispatch_ready(),
        }
    }

    pub fn snapshot(&self, rules: &RuleSet) -> SessionSnapshot {
        let classification = self.classification().clone();
        SessionSnapshot {
            session_id: self.session_id,
            revision: self.revision,
            call_active: self.call_active,
            detected: self.detected.clone(),
            priority: DispatchPriority::for_classification(&classification),
            recommended_protocols: recommend(&rules.protocols, &classification)
                .into_iter()
                .map(|p| p.id.clone())
                .collect(),
            classification,
            fields: self.fields.clone(),
            dispatch_ready: self.dispatch_ready(),
            dispatch: self.dispatch.clone(),
        }
    }
}
