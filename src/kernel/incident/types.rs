use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Clamp any confidence into [0.0, 1.0]. NaN collapses to 0.0.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Severity tag attached to a configured phrase (used for highlighting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordSeverity {
    High,
    Medium,
    Low,
}

/// A configured emergency phrase. Phrase is stored lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub phrase: String,
    pub confidence: f32, // 0.0 to 1.0
    pub severity: KeywordSeverity,
}

impl KeywordEntry {
    pub fn new(phrase: &str, confidence: f32, severity: KeywordSeverity) -> Self {
        Self {
            phrase: phrase.to_lowercase(),
            confidence: clamp_confidence(confidence),
            severity,
        }
    }
}

/// A `KeywordEntry` found in a transcript. Created fresh per matching pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedKeyword {
    pub word: String,
    pub confidence: f32,
    pub severity: KeywordSeverity,
}

impl From<&KeywordEntry> for DetectedKeyword {
    fn from(entry: &KeywordEntry) -> Self {
        Self {
            word: entry.phrase.clone(),
            confidence: clamp_confidence(entry.confidence),
            severity: entry.severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

impl CategoryId {
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CategoryId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentCategory {
    pub id: CategoryId,
    pub name: String,
    /// Trigger keywords, in declaration order.
    pub keywords: Vec<String>,
    /// Presentation only. The pipeline never reads these two.
    pub color: String,
    pub icon: String,
    pub description: String,
}

/// Three-level urgency attached to a classified incident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    /// Console opens on "moderate" before anything is classified.
    #[default]
    Moderate,
    Stable,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Critical => "critical",
            Severity::Moderate => "moderate",
            Severity::Stable => "stable",
        };
        f.write_str(label)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "moderate" => Ok(Severity::Moderate),
            "stable" => Ok(Severity::Stable),
            other => Err(format!("unknown severity '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassificationSource {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// None until a category clears the threshold (or the operator picks one).
    pub category: Option<CategoryId>,
    pub severity: Severity,
    pub confidence: f32,
    pub source: ClassificationSource,
}

impl ClassificationResult {
    pub fn unclassified() -> Self {
        Self {
            category: None,
            severity: Severity::default(),
            confidence: 0.0,
            source: ClassificationSource::Automatic,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.category.is_some()
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::unclassified()
    }
}
