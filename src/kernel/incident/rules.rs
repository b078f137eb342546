use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use super::types::{CategoryId, IncidentCategory, KeywordEntry, KeywordSeverity};
use crate::dispatch::protocols::{default_protocols, EmergencyProtocol};
use crate::error::{TriageError, TriageResult};

/// Best category must score strictly above this to be committed.
pub const CLASSIFY_THRESHOLD: f32 = 0.7;
/// Score strictly above this (without a critical phrase) is "moderate".
pub const MODERATE_THRESHOLD: f32 = 0.85;
/// Score strictly above this is "critical" on its own.
pub const CRITICAL_THRESHOLD: f32 = 0.95;

pub const ADDRESS_CONFIDENCE: f32 = 0.92;
pub const PATIENT_COUNT_CONFIDENCE: f32 = 0.88;
pub const CALLER_CONFIDENCE: f32 = 0.85;

/// No geocoding exists. A successful address match is paired with this.
pub const PLACEHOLDER_COORDINATES: &str = "40.7128, -74.0060";

/// Category whose protocols are always offered alongside the classified one.
pub const GENERAL_CATEGORY: &str = "other";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub classify: f32,
    pub moderate: f32,
    pub critical: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            classify: CLASSIFY_THRESHOLD,
            moderate: MODERATE_THRESHOLD,
            critical: CRITICAL_THRESHOLD,
        }
    }
}

/// Fixed confidences reported by the field extractor on a match.
/// These are constants, not scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldConfidences {
    pub address: f32,
    pub patient_count: f32,
    pub caller: f32,
}

impl Default for FieldConfidences {
    fn default() -> Self {
        Self {
            address: ADDRESS_CONFIDENCE,
            patient_count: PATIENT_COUNT_CONFIDENCE,
            caller: CALLER_CONFIDENCE,
        }
    }
}

/// Everything the pipeline needs, passed in explicitly.
/// `RuleSet::default()` is the built-in console configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub keywords: Vec<KeywordEntry>,
    pub categories: Vec<IncidentCategory>,
    pub critical_phrases: Vec<String>,
    pub thresholds: Thresholds,
    pub field_confidences: FieldConfidences,
    pub placeholder_coordinates: String,
    pub protocols: Vec<EmergencyProtocol>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            categories: default_categories(),
            critical_phrases: default_critical_phrases(),
            thresholds: Thresholds::default(),
            field_confidences: FieldConfidences::default(),
            placeholder_coordinates: PLACEHOLDER_COORDINATES.to_string(),
            protocols: default_protocols(),
        }
    }
}

impl RuleSet {
    pub fn category(&self, id: &CategoryId) -> Option<&IncidentCategory> {
        self.categories.iter().find(|c| &c.id == id)
    }

    pub fn has_category(&self, id: &CategoryId) -> bool {
        self.category(id).is_some()
    }

    /// Manual selection may only name a configured category.
    pub fn require_category(&self, id: &CategoryId) -> TriageResult<&IncidentCategory> {
        self.category(id)
            .ok_or_else(|| TriageError::UnknownCategory(id.to_string()))
    }

    pub fn from_json_str(json: &str) -> TriageResult<Self> {
        let rules: RuleSet = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn from_json_file(path: &Path) -> TriageResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Rejects tables the pipeline could not honour (out-of-range confidences,
    /// duplicate ids, inverted thresholds).
    pub fn validate(&self) -> TriageResult<()> {
        for entry in &self.keywords {
            if entry.phrase.trim().is_empty() {
                return Err(TriageError::InvalidRules("keyword phrase is empty".to_string()));
            }
            if !in_unit_range(entry.confidence) {
                return Err(TriageError::InvalidRules(format!(
                    "keyword '{}' has confidence {} outside [0, 1]",
                    entry.phrase, entry.confidence
                )));
            }
        }

        if self.categories.is_empty() {
            return Err(TriageError::InvalidRules("no incident categories configured".to_string()));
        }

        let mut seen = HashSet::new();
        for category in &self.categories {
            if category.id.as_str().trim().is_empty() {
                return Err(TriageError::InvalidRules("category id is empty".to_string()));
            }
            if !seen.insert(category.id.clone()) {
                return Err(TriageError::InvalidRules(format!(
                    "duplicate category id '{}'",
                    category.id
                )));
            }
            if category.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(TriageError::InvalidRules(format!(
                    "category '{}' has an empty trigger keyword",
                    category.id
                )));
            }
        }

        if self.critical_phrases.iter().any(|p| p.trim().is_empty()) {
            return Err(TriageError::InvalidRules("critical phrase is empty".to_string()));
        }

        let t = &self.thresholds;
        if ![t.classify, t.moderate, t.critical].iter().all(|v| in_unit_range(*v)) {
            return Err(TriageError::InvalidRules("thresholds must lie in [0, 1]".to_string()));
        }
        if !(t.classify <= t.moderate && t.moderate <= t.critical) {
            return Err(TriageError::InvalidRules(format!(
                "thresholds out of order: classify {} / moderate {} / critical {}",
                t.classify, t.moderate, t.critical
            )));
        }

        let f = &self.field_confidences;
        if ![f.address, f.patient_count, f.caller].iter().all(|v| in_unit_range(*v)) {
            return Err(TriageError::InvalidRules("field confidences must lie in [0, 1]".to_string()));
        }

        for protocol in &self.protocols {
            if !self.has_category(&protocol.category) {
                return Err(TriageError::InvalidRules(format!(
                    "protocol '{}' references unknown category '{}'",
                    protocol.id, protocol.category
                )));
            }
        }

        Ok(())
    }
}

fn in_unit_range(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

/// Phrases the console listens for. The first five are the ones the live
/// transcript highlights; the rest give every category something to hit.
pub fn default_keywords() -> Vec<KeywordEntry> {
    use KeywordSeverity::*;
    vec![
        KeywordEntry::new("chest pain", 0.98, High),
        KeywordEntry::new("can't breathe", 0.95, High),
        KeywordEntry::new("pale", 0.92, Medium),
        KeywordEntry::new("sweating", 0.89, Medium),
        KeywordEntry::new("pain getting worse", 0.96, High),
        KeywordEntry::new("heart attack", 0.97, High),
        KeywordEntry::new("cardiac arrest", 0.99, High),
        KeywordEntry::new("not breathing", 0.97, High),
        KeywordEntry::new("shortness of breath", 0.9, High),
        KeywordEntry::new("palpitations", 0.86, Medium),
        KeywordEntry::new("severe bleeding", 0.97, High),
        KeywordEntry::new("bleeding", 0.9, High),
        KeywordEntry::new("accident", 0.9, Medium),
        KeywordEntry::new("crash", 0.91, High),
        KeywordEntry::new("broken", 0.84, Medium),
        KeywordEntry::new("injured", 0.88, Medium),
        KeywordEntry::new("trauma", 0.87, Medium),
        KeywordEntry::new("unconscious", 0.95, High),
        KeywordEntry::new("stroke", 0.94, High),
        KeywordEntry::new("seizure", 0.93, High),
        KeywordEntry::new("paralysis", 0.9, High),
        KeywordEntry::new("speech problems", 0.88, Medium),
        KeywordEntry::new("emergency", 0.75, Low),
        KeywordEntry::new("urgent", 0.78, Low),
    ]
}

pub fn default_categories() -> Vec<IncidentCategory> {
    vec![
        category(
            "cardiac",
            "Cardiac Emergency",
            &["chest pain", "heart attack", "cardiac arrest", "palpitations", "shortness of breath"],
            "error",
            "Heart",
            "Heart-related medical emergency",
        ),
        category(
            "accident",
            "Accident/Trauma",
            &["accident", "crash", "bleeding", "broken", "injured", "trauma"],
            "warning",
            "AlertTriangle",
            "Physical injury or trauma",
        ),
        category(
            "stroke",
            "Stroke/Neurological",
            &["stroke", "seizure", "unconscious", "paralysis", "speech problems"],
            "primary",
            "Brain",
            "Brain or nervous system emergency",
        ),
        category(
            GENERAL_CATEGORY,
            "Other Emergency",
            &["emergency", "help", "urgent", "critical"],
            "secondary",
            "HelpCircle",
            "General emergency situation",
        ),
    ]
}

pub fn default_critical_phrases() -> Vec<String> {
    ["cardiac arrest", "unconscious", "not breathing", "severe bleeding"]
        .iter()
        .map(|p| p.to_string())
        .collect()
}

fn category(
    id: &str,
    name: &str,
    keywords: &[&str],
    color: &str,
    icon: &str,
    description: &str,
) -> IncidentCategory {
    IncidentCategory {
        id: CategoryId::new(id),
        name: name.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        color: color.to_string(),
        icon: icon.to_string(),
        description: description.to_string(),
    }
}
