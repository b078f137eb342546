use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use super::rules::RuleSet;
use super::types::clamp_confidence;

static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[0-9]+\s+[\w\s]+(?:street|st|avenue|ave|road|rd|drive|dr|boulevard|blvd|lane|ln|court|ct|place|pl)")
        .expect("address pattern")
});

static UNIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)apartment\s+(\w+)|apt\s+(\w+)|unit\s+(\w+)").expect("unit pattern")
});

static PATIENT_COUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([0-9]+)\s+(?:people|person|patient|victim)").expect("patient count pattern")
});

static CALLER_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)my name is (\w+\s+\w+)|i'm (\w+\s+\w+)|this is (\w+\s+\w+)").expect("caller name pattern")
});

static RELATIONSHIP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)my (husband|wife|son|daughter|father|mother|brother|sister|friend)")
        .expect("relationship pattern")
});

pub const DEFAULT_PATIENT_COUNT: u32 = 1;
pub const DEFAULT_RELATIONSHIP: &str = "caller";

/// A value pulled from the transcript (or typed by the operator).
///
/// Invariant: `verified` implies `confidence == 1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedField<T> {
    pub value: T,
    pub confidence: f32,
    pub verified: bool,
}

impl<T> ExtractedField<T> {
    pub fn empty(value: T) -> Self {
        Self { value, confidence: 0.0, verified: false }
    }

    pub fn extracted(value: T, confidence: f32) -> Self {
        Self { value, confidence: clamp_confidence(confidence), verified: false }
    }

    /// Manual edit. Overrides the heuristic confidence, never blends with it.
    pub fn confirm(&mut self, value: T) {
        self.value = value;
        self.confidence = 1.0;
        self.verified = true;
    }

    /// Operator re-opened the field; automatic extraction may write it again.
    pub fn reopen(&mut self) {
        self.verified = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    Address,
    Coordinates,
    PatientCount,
    CallerName,
    CallerPhone,
    CallerRelationship,
}

impl FieldKey {
    pub const ALL: [FieldKey; 6] = [
        FieldKey::Address,
        FieldKey::Coordinates,
        FieldKey::PatientCount,
        FieldKey::CallerName,
        FieldKey::CallerPhone,
        FieldKey::CallerRelationship,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Address => "address",
            FieldKey::Coordinates => "coordinates",
            FieldKey::PatientCount => "patient_count",
            FieldKey::CallerName => "caller_name",
            FieldKey::CallerPhone => "caller_phone",
            FieldKey::CallerRelationship => "caller_relationship",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        FieldKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown field '{}'", s))
    }
}

/// An operator edit of exactly one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldEdit {
    Address(String),
    Coordinates(String),
    PatientCount(u32),
    CallerName(String),
    CallerPhone(String),
    CallerRelationship(String),
}

impl FieldEdit {
    pub fn key(&self) -> FieldKey {
        match self {
            FieldEdit::Address(_) => FieldKey::Address,
            FieldEdit::Coordinates(_) => FieldKey::Coordinates,
            FieldEdit::PatientCount(_) => FieldKey::PatientCount,
            FieldEdit::CallerName(_) => FieldKey::CallerName,
            FieldEdit::CallerPhone(_) => FieldKey::CallerPhone,
            FieldEdit::CallerRelationship(_) => FieldKey::CallerRelationship,
        }
    }

    /// Build an edit from console input. Patient count must parse as an integer.
    pub fn parse(key: FieldKey, value: &str) -> Result<Self, String> {
        let value = value.trim().to_string();
        Ok(match key {
            FieldKey::Address => FieldEdit::Address(value),
            FieldKey::Coordinates => FieldEdit::Coordinates(value),
            FieldKey::PatientCount => FieldEdit::PatientCount(
                value.parse().map_err(|_| format!("patient count '{}' is not a number", value))?,
            ),
            FieldKey::CallerName => FieldEdit::CallerName(value),
            FieldKey::CallerPhone => FieldEdit::CallerPhone(value),
            FieldKey::CallerRelationship => FieldEdit::CallerRelationship(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFieldSet {
    pub address: ExtractedField<String>,
    /// Placeholder paired with a matched address. There is no geocoding.
    pub coordinates: ExtractedField<String>,
    pub patient_count: ExtractedField<u32>,
    pub caller_name: ExtractedField<String>,
    /// Never extracted. Comes from call metadata and is carried across passes.
    pub caller_phone: ExtractedField<String>,
    pub caller_relationship: ExtractedField<String>,
}

impl Default for ExtractedFieldSet {
    fn default() -> Self {
        Self {
            address: ExtractedField::empty(String::new()),
            coordinates: ExtractedField::empty(String::new()),
            patient_count: ExtractedField::empty(DEFAULT_PATIENT_COUNT),
            caller_name: ExtractedField::empty(String::new()),
            caller_phone: ExtractedField::empty(String::new()),
            caller_relationship: ExtractedField::empty(DEFAULT_RELATIONSHIP.to_string()),
        }
    }
}

impl ExtractedFieldSet {
    pub fn apply_edit(&mut self, edit: FieldEdit) {
        match edit {
            FieldEdit::Address(v) => {
                self.address.confirm(v);
                self.unpair_coordinates();
            }
            FieldEdit::Coordinates(v) => self.coordinates.confirm(v),
            FieldEdit::PatientCount(v) => self.patient_count.confirm(v),
            FieldEdit::CallerName(v) => self.caller_name.confirm(v),
            FieldEdit::CallerPhone(v) => self.caller_phone.confirm(v),
            FieldEdit::CallerRelationship(v) => self.caller_relationship.confirm(v),
        }
    }

    pub fn reopen(&mut self, key: FieldKey) {
        match key {
            FieldKey::Address => self.address.reopen(),
            FieldKey::Coordinates => self.coordinates.reopen(),
            FieldKey::PatientCount => self.patient_count.reopen(),
            FieldKey::CallerName => self.caller_name.reopen(),
            FieldKey::CallerPhone => self.caller_phone.reopen(),
            FieldKey::CallerRelationship => self.caller_relationship.reopen(),
        }
    }

    /// Placeholder coordinates belong to the extracted address. Once the
    /// operator types an address they no longer describe it.
    fn unpair_coordinates(&mut self) {
        if !self.coordinates.verified {
            self.coordinates = ExtractedField::empty(String::new());
        }
    }

    /// Phone number reported by the call system, not by the caller.
    pub fn set_caller_phone(&mut self, phone: &str) {
        if !self.caller_phone.verified {
            self.caller_phone = ExtractedField::extracted(phone.to_string(), 1.0);
        }
    }

    pub fn is_verified(&self, key: FieldKey) -> bool {
        match key {
            FieldKey::Address => self.address.verified,
            FieldKey::Coordinates => self.coordinates.verified,
            FieldKey::PatientCount => self.patient_count.verified,
            FieldKey::CallerName => self.caller_name.verified,
            FieldKey::CallerPhone => self.caller_phone.verified,
            FieldKey::CallerRelationship => self.caller_relationship.verified,
        }
    }

    pub fn confidence(&self, key: FieldKey) -> f32 {
        match key {
            FieldKey::Address => self.address.confidence,
            FieldKey::Coordinates => self.coordinates.confidence,
            FieldKey::PatientCount => self.patient_count.confidence,
            FieldKey::CallerName => self.caller_name.confidence,
            FieldKey::CallerPhone => self.caller_phone.confidence,
            FieldKey::CallerRelationship => self.caller_relationship.confidence,
        }
    }

    /// Keys whose value, confidence or verified flag differ from `other`.
    pub fn changed_keys(&self, other: &ExtractedFieldSet) -> Vec<FieldKey> {
        FieldKey::ALL
            .iter()
            .copied()
            .filter(|k| match k {
                FieldKey::Address => self.address != other.address,
                FieldKey::Coordinates => self.coordinates != other.coordinates,
                FieldKey::PatientCount => self.patient_count != other.patient_count,
                FieldKey::CallerName => self.caller_name != other.caller_name,
                FieldKey::CallerPhone => self.caller_phone != other.caller_phone,
                FieldKey::CallerRelationship => self.caller_relationship != other.caller_relationship,
            })
            .collect()
    }

    /// Verified fields of `previous` win over anything freshly extracted.
    /// The phone is carried over regardless since it never comes from text.
    fn keep_frozen(&mut self, previous: &ExtractedFieldSet) {
        if previous.address.verified {
            self.address = previous.address.clone();
            self.unpair_coordinates();
        }
        if previous.coordinates.verified {
            self.coordinates = previous.coordinates.clone();
        }
        if previous.patient_count.verified {
            self.patient_count = previous.patient_count.clone();
        }
        if previous.caller_name.verified {
            self.caller_name = previous.caller_name.clone();
        }
        if previous.caller_relationship.verified {
            self.caller_relationship = previous.caller_relationship.clone();
        }
        self.caller_phone = previous.caller_phone.clone();
    }
}

/// Field extraction over the full transcript.
///
/// Pure and idempotent. Each field has its own pattern and a fixed confidence
/// on match; a miss leaves the field at its default. Matched text keeps the
/// transcript's casing, except the relationship which is a fixed vocabulary.
pub fn extract_fields(
    transcript: &str,
    previous: Option<&ExtractedFieldSet>,
    rules: &RuleSet,
) -> ExtractedFieldSet {
    let confidences = &rules.field_confidences;
    let mut fields = ExtractedFieldSet::default();

    if let Some(address) = extract_address(transcript) {
        fields.address = ExtractedField::extracted(address, confidences.address);
        fields.coordinates =
            ExtractedField::extracted(rules.placeholder_coordinates.clone(), confidences.address);
    }

    if let Some(count) = extract_patient_count(transcript) {
        fields.patient_count = ExtractedField::extracted(count, confidences.patient_count);
    }

    if let Some(name) = extract_caller_name(transcript) {
        fields.caller_name = ExtractedField::extracted(name, confidences.caller);
    }

    if let Some(relationship) = extract_relationship(transcript) {
        fields.caller_relationship = ExtractedField::extracted(relationship, confidences.caller);
    }

    if let Some(previous) = previous {
        fields.keep_frozen(previous);
    }

    fields
}

/// Street address plus an optional ", apartment X" style modifier.
pub fn extract_address(transcript: &str) -> Option<String> {
    let base = ADDRESS_PATTERN.find(transcript)?;
    let mut address = base.as_str().to_string();
    if let Some(unit) = UNIT_PATTERN.find(transcript) {
        address.push_str(", ");
        address.push_str(unit.as_str());
    }
    Some(address)
}

/// First mention that fits the field. An overflowing digit run is skipped.
pub fn extract_patient_count(transcript: &str) -> Option<u32> {
    PATIENT_COUNT_PATTERN
        .captures_iter(transcript)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .next()
}

pub fn extract_caller_name(transcript: &str) -> Option<String> {
    let caps = CALLER_NAME_PATTERN.captures(transcript)?;
    (1..=3)
        .filter_map(|i| caps.get(i))
        .map(|m| m.as_str().to_string())
        .next()
}

pub fn extract_relationship(transcript: &str) -> Option<String> {
    let caps = RELATIONSHIP_PATTERN.captures(transcript)?;
    caps.get(1).map(|m| m.as_str().to_lowercase())
}
