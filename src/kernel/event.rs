use serde::{Deserialize, Serialize};

use crate::kernel::incident::{CategoryId, FieldEdit, FieldKey, Severity};

/// Monotonic counter of transcript updates. Every appended chunk bumps it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct TranscriptRevision(pub u64);

impl TranscriptRevision {
    pub fn next(&self) -> Self {
        TranscriptRevision(self.0 + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Signals from the call: transcript text, call metadata.
    Input(InputEvent),
    /// Deliberate operator decisions from the console.
    Operator(OperatorAction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputEvent {
    pub source: String,
    pub content: InputContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputContent {
    /// A new chunk of transcribed speech, appended to what came before.
    Transcript(String),
    /// Caller number from the telephony side.
    CallMetadata { caller_phone: String },
}

impl InputEvent {
    pub fn transcript(source: &str, text: &str) -> Self {
        Self {
            source: source.to_string(),
            content: InputContent::Transcript(text.to_string()),
        }
    }

    pub fn call_metadata(source: &str, caller_phone: &str) -> Self {
        Self {
            source: source.to_string(),
            content: InputContent::CallMetadata {
                caller_phone: caller_phone.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperatorAction {
    SelectCategory(CategoryId),
    SelectSeverity(Severity),
    ClearOverride,
    EditField(FieldEdit),
    ReopenField(FieldKey),
    RequestDispatch,
    EndCall,
}
