//! Free-text to answer-ID matching.
//!
//! Every search term resolves to exactly one [`MatchResult`]. Matching is
//! case-insensitive and runs in two passes over the catalog:
//!
//! 1. exact / substring: an exact match anywhere wins; otherwise the first
//!    catalog entry where one string contains the other is taken, in catalog
//!    order (not by best score);
//! 2. fuzzy: the highest [`similarity`] at or above the threshold.

use serde::Serialize;

use crate::client::AnswerRecord;

/// Threshold used when the caller does not supply one.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.75;

/// How a search term was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Texts are equal ignoring case.
    Exact,
    /// One text contains the other.
    Substring,
    /// Best similarity at or above the threshold.
    Fuzzy,
    /// Nothing matched.
    None,
}

/// Outcome of matching one search term against the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// The term exactly as the caller supplied it.
    pub search_term: String,
    /// Resolved answer token; `None` iff `match_type` is `None`.
    pub answer_id: Option<String>,
    /// Canonical text of the resolved answer.
    pub matched_text: Option<String>,
    /// Question label of the resolved answer.
    pub question: Option<String>,
    /// Description of the resolved answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the resolved answer is offerable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// How the term was resolved.
    pub match_type: MatchType,
    /// 1.0 for exact matches, 0.0 when nothing matched.
    pub similarity: f64,
    /// Explanation for unresolved terms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MatchResult {
    fn found(term: &str, answer: &AnswerRecord, match_type: MatchType, similarity: f64) -> Self {
        Self {
            search_term: term.to_string(),
            answer_id: Some(answer.id.clone()),
            matched_text: Some(answer.text.clone()),
            question: Some(answer.question.clone()),
            description: Some(answer.description.clone()),
            is_active: Some(answer.is_active),
            match_type,
            similarity,
            message: None,
        }
    }

    fn not_found(term: &str, threshold: f64) -> Self {
        Self {
            search_term: term.to_string(),
            answer_id: None,
            matched_text: None,
            question: None,
            description: None,
            is_active: None,
            match_type: MatchType::None,
            similarity: 0.0,
            message: Some(format!(
                "No matching answer found (threshold: {})",
                threshold
            )),
        }
    }

    /// Whether the term resolved to an answer.
    pub fn is_match(&self) -> bool {
        self.answer_id.is_some()
    }
}

/// Resolve each search term to one [`MatchResult`], in input order.
pub fn match_terms<S: AsRef<str>>(
    catalog: &[AnswerRecord],
    terms: &[S],
    threshold: f64,
) -> Vec<MatchResult> {
    let lowered: Vec<String> = terms
        .iter()
        .map(|t| t.as_ref().trim().to_lowercase())
        .collect();
    let mut results: Vec<Option<MatchResult>> = vec![None; terms.len()];

    // Pass 1: exact and substring.
    for answer in catalog.iter().filter(|a| !a.text.is_empty()) {
        let text = answer.text.to_lowercase();
        for (i, term) in lowered.iter().enumerate() {
            if term.is_empty() {
                continue;
            }
            let current = results[i].as_ref().map(|r| r.match_type);
            if current == Some(MatchType::Exact) {
                continue;
            }
            if *term == text {
                results[i] = Some(MatchResult::found(
                    terms[i].as_ref(),
                    answer,
                    MatchType::Exact,
                    1.0,
                ));
            } else if current.is_none() && (text.contains(term.as_str()) || term.contains(&text)) {
                results[i] = Some(MatchResult::found(
                    terms[i].as_ref(),
                    answer,
                    MatchType::Substring,
                    similarity(term, &text),
                ));
            }
        }
    }

    // Pass 2: fuzzy, for whatever pass 1 left open.
    for (i, term) in lowered.iter().enumerate() {
        if results[i].is_some() || term.is_empty() {
            continue;
        }
        let mut best: Option<(&AnswerRecord, f64)> = None;
        for answer in catalog.iter().filter(|a| !a.text.is_empty()) {
            let score = similarity(term, &answer.text);
            if score >= threshold && best.map_or(true, |(_, b)| score > b) {
                best = Some((answer, score));
            }
        }
        results[i] = best
            .map(|(answer, score)| MatchResult::found(terms[i].as_ref(), answer, MatchType::Fuzzy, score));
    }

    results
        .into_iter()
        .zip(terms)
        .map(|(r, term)| r.unwrap_or_else(|| MatchResult::not_found(term.as_ref(), threshold)))
        .collect()
}

/// Case-insensitive edit-distance similarity in `[0, 1]`.
///
/// `1 - levenshtein(a, b) / max(|a|, |b|)` over lower-cased text, so it is
/// symmetric and equals 1.0 for identical strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}
