//! Search utilities for the message view filter.
//!
//! Provides consistent search semantics for text matching, including:
//! - Multi-term AND queries with '+' operator
//! - ASCII case-insensitive matching against body and sender

use crate::models::Message;

/// Parse a search query into individual search terms.
///
/// The '+' operator splits the query into multiple terms that must ALL match
/// (AND semantics at the message level). Each term is trimmed and lowercased.
///
/// # Examples
/// - "error" -> ["error"]
/// - "error+timeout" -> ["error", "timeout"]
/// - "error++timeout" -> ["error", "timeout"] (empty terms ignored)
/// - "" -> []
pub fn parse_search_terms(query: &str) -> Vec<String> {
    query
        .split('+')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Check if text contains a search term (ASCII case-insensitive)
pub fn text_contains_term(text: &str, term: &str) -> bool {
    let text_chars: Vec<char> = text.chars().collect();
    let term_chars: Vec<char> = term.chars().collect();

    if term_chars.is_empty() {
        return true;
    }

    if text_chars.len() < term_chars.len() {
        return false;
    }

    for start_idx in 0..=(text_chars.len() - term_chars.len()) {
        let matches = term_chars.iter().enumerate().all(|(i, tc)| {
            text_chars
                .get(start_idx + i)
                .map_or(false, |c| c.eq_ignore_ascii_case(tc))
        });
        if matches {
            return true;
        }
    }
    false
}

/// A message matches when every term is found in its body or its sender id
pub fn message_matches(message: &Message, terms: &[String]) -> bool {
    terms.iter().all(|term| {
        text_contains_term(&message.body, term) || text_contains_term(&message.sender_id, term)
    })
}
