//! Dispatch gating.
//!
//! The dispatch action consumes nothing from the pipeline except the go/no-go
//! decision and a handful of fields copied into the request.

pub mod protocols;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{TriageError, TriageResult};
use crate::kernel::event::TranscriptRevision;
use crate::kernel::incident::{CategoryId, ClassificationResult, ExtractedFieldSet, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchPriority {
    Emergency,
    Urgent,
    Standard,
}

impl DispatchPriority {
    pub fn for_classification(classification: &ClassificationResult) -> Self {
        if !classification.is_classified() {
            return DispatchPriority::Standard;
        }
        match classification.severity {
            Severity::Critical => DispatchPriority::Emergency,
            Severity::Moderate => DispatchPriority::Urgent,
            Severity::Stable => DispatchPriority::Standard,
        }
    }
}

impl fmt::Display for DispatchPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DispatchPriority::Emergency => "emergency",
            DispatchPriority::Urgent => "urgent",
            DispatchPriority::Standard => "standard",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    pub id: Uuid,
    pub session_id: Uuid,
    pub revision: TranscriptRevision,
    pub category: CategoryId,
    pub severity: Severity,
    pub priority: DispatchPriority,
    pub address: String,
    pub coordinates: String,
    pub patient_count: u32,
}

pub fn can_dispatch(classification: &ClassificationResult) -> bool {
    classification.is_classified()
}

/// Gate and build. The only hard requirement is a category.
pub fn build_request(
    session_id: Uuid,
    revision: TranscriptRevision,
    classification: &ClassificationResult,
    fields: &ExtractedFieldSet,
) -> TriageResult<DispatchRequest> {
    let category = classification.category.clone().ok_or_else(|| {
        TriageError::DispatchBlocked("incident is not classified".to_string())
    })?;

    Ok(DispatchRequest {
        id: Uuid::new_v4(),
        session_id,
        revision,
        category,
        severity: classification.severity,
        priority: DispatchPriority::for_classification(classification),
        address: fields.address.value.clone(),
        coordinates: fields.coordinates.value.clone(),
        patient_count: fields.patient_count.value,
    })
}
