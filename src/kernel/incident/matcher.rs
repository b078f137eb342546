use super::types::{DetectedKeyword, KeywordEntry};

/// Stage 1: literal, case-insensitive substring search.
///
/// Returns every table entry whose phrase occurs in the transcript, in table
/// order. No tokenizing, no stemming: "chest pain" is found inside
/// "chest pains" but "breathing" is not found inside "breathe".
pub fn detect_keywords(transcript: &str, table: &[KeywordEntry]) -> Vec<DetectedKeyword> {
    if transcript.is_empty() {
        return Vec::new();
    }

    let haystack = transcript.to_lowercase();

    table
        .iter()
        // An empty phrase is contained in everything.
        .filter(|entry| !entry.phrase.is_empty())
        .filter(|entry| haystack.contains(&entry.phrase.to_lowercase()))
        .map(DetectedKeyword::from)
        .collect()
}
