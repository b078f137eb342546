use serde::{Deserialize, Serialize};

use crate::kernel::incident::{CategoryId, ClassificationResult, GENERAL_CATEGORY};

/// How many protocols the console offers before anything is classified.
const UNCLASSIFIED_PROTOCOLS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyProtocol {
    pub id: String,
    pub name: String,
    pub category: CategoryId,
    pub description: String,
}

pub fn default_protocols() -> Vec<EmergencyProtocol> {
    vec![
        protocol("cpr", "CPR Instructions", "cardiac", "Cardiopulmonary resuscitation guidance"),
        protocol("bleeding", "Bleeding Control", "accident", "Stop severe bleeding techniques"),
        protocol("choking", "Choking Response", GENERAL_CATEGORY, "Heimlich maneuver instructions"),
        protocol("stroke", "Stroke Assessment", "stroke", "FAST stroke evaluation"),
    ]
}

/// Protocols to put in front of the operator.
/// Unclassified: the first couple. Classified: that category's plus the general ones.
pub fn recommend<'a>(
    protocols: &'a [EmergencyProtocol],
    classification: &ClassificationResult,
) -> Vec<&'a EmergencyProtocol> {
    match &classification.category {
        None => protocols.iter().take(UNCLASSIFIED_PROTOCOLS).collect(),
        Some(category) => protocols
            .iter()
            .filter(|p| &p.category == category || p.category.as_str() == GENERAL_CATEGORY)
            .collect(),
    }
}

fn protocol(id: &str, name: &str, category: &str, description: &str) -> EmergencyProtocol {
    EmergencyProtocol {
        id: id.to_string(),
        name: name.to_string(),
        category: CategoryId::new(category),
        description: description.to_string(),
    }
}
