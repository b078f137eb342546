use super::rules::RuleSet;
use super::types::*;

/// Detected keywords that fall under a category: the detected word contains
/// one of the category's trigger keywords (case-insensitive).
pub fn matching_keywords<'a>(
    detected: &'a [DetectedKeyword],
    category: &IncidentCategory,
) -> Vec<&'a DetectedKeyword> {
    detected
        .iter()
        .filter(|d| {
            let word = d.word.to_lowercase();
            category
                .keywords
                .iter()
                .any(|k| !k.is_empty() && word.contains(&k.to_lowercase()))
        })
        .collect()
}

/// Arithmetic mean of the matching confidences, or None when nothing matched.
pub fn category_score(detected: &[DetectedKeyword], category: &IncidentCategory) -> Option<f32> {
    let matching = matching_keywords(detected, category);
    if matching.is_empty() {
        return None;
    }
    let sum: f32 = matching.iter().map(|k| k.confidence).sum();
    Some(sum / matching.len() as f32)
}

/// Stage 2: pick the best category and derive a severity.
///
/// - Highest mean score wins; ties go to the category declared first.
/// - The winner is only committed when its score is strictly above
///   `thresholds.classify`. Otherwise the result is unclassified.
/// - Severity is derived only for a committed category.
pub fn classify(detected: &[DetectedKeyword], rules: &RuleSet) -> ClassificationResult {
    let mut best: Option<(&IncidentCategory, f32)> = None;

    for category in &rules.categories {
        if let Some(score) = category_score(detected, category) {
            let highest = best.map(|(_, s)| s).unwrap_or(0.0);
            // Strictly greater: the earlier category keeps a tie.
            if score > highest {
                best = Some((category, score));
            }
        }
    }

    match best {
        Some((category, score)) if score > rules.thresholds.classify => ClassificationResult {
            category: Some(category.id.clone()),
            severity: derive_severity(detected, score, rules),
            confidence: clamp_confidence(score),
            source: ClassificationSource::Automatic,
        },
        _ => ClassificationResult::unclassified(),
    }
}

/// Critical phrase anywhere in the detected set, or a score above the critical
/// threshold, escalates to `Critical` regardless of anything else.
pub fn derive_severity(detected: &[DetectedKeyword], best_score: f32, rules: &RuleSet) -> Severity {
    let has_critical_phrase = detected.iter().any(|d| {
        let word = d.word.to_lowercase();
        rules
            .critical_phrases
            .iter()
            .any(|p| !p.is_empty() && word.contains(&p.to_lowercase()))
    });

    if has_critical_phrase || best_score > rules.thresholds.critical {
        Severity::Critical
    } else if best_score > rules.thresholds.moderate {
        Severity::Moderate
    } else {
        Severity::Stable
    }
}

/// Operator picked a category by hand. Bypasses scoring entirely: confidence
/// is pinned to 1.0 and severity stays whatever it was.
pub fn manual_select(category: &IncidentCategory, current: &ClassificationResult) -> ClassificationResult {
    ClassificationResult {
        category: Some(category.id.clone()),
        severity: current.severity,
        confidence: 1.0,
        source: ClassificationSource::Manual,
    }
}

/// Session-scoped holder for the live classification.
///
/// Automatic results flow in through `observe`. Operator choices pin the
/// category and/or severity until `clear_override`.
#[derive(Debug, Clone, Default)]
pub struct IncidentClassifier {
    current: ClassificationResult,
    category_pinned: bool,
    severity_pinned: bool,
}

impl IncidentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &ClassificationResult {
        &self.current
    }

    pub fn is_overridden(&self) -> bool {
        self.category_pinned || self.severity_pinned
    }

    /// Fold a fresh automatic result in. Returns true if the visible result changed.
    pub fn observe(&mut self, automatic: ClassificationResult) -> bool {
        if self.category_pinned {
            return false;
        }

        let mut next = automatic;
        if self.severity_pinned {
            next.severity = self.current.severity;
        }

        let changed = next != self.current;
        self.current = next;
        changed
    }

    /// The category must already be resolved against the rule set
    /// (`RuleSet::require_category`).
    pub fn select_category(&mut self, category: &IncidentCategory) -> bool {
        let next = manual_select(category, &self.current);
        let changed = next != self.current;
        self.current = next;
        self.category_pinned = true;
        changed
    }

    /// Independent of the category: no derivation, no bypass logic.
    pub fn select_severity(&mut self, severity: Severity) -> bool {
        self.severity_pinned = true;
        let changed = self.current.severity != severity;
        self.current.severity = severity;
        changed
    }

    /// Hand control back to the heuristic. The next `observe` takes effect.
    pub fn clear_override(&mut self) {
        self.category_pinned = false;
        self.severity_pinned = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
