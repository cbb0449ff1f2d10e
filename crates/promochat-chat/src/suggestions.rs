//! The `body|||s1|s2|s3` reply convention.
//!
//! The relay's system prompt asks the model to append follow-up questions
//! after a `|||` separator. Everything before the first separator is shown to
//! the visitor; everything after it becomes quick-reply buttons.

use promochat_types::MAX_SUGGESTIONS;

/// Separates the display body from the suggestion list
pub const SUGGESTION_SEPARATOR: &str = "|||";

/// Separates individual suggestions
const ITEM_SEPARATOR: char = '|';

/// Quick-replies shown when a reply carries none of its own
pub const DEFAULT_SUGGESTIONS: [&str; 3] = ["了解游戏机制", "查看技术架构", "了解变现模式"];

pub fn default_suggestions() -> Vec<String> {
    DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect()
}

/// A decoded assistant reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub body: String,
    pub suggestions: Vec<String>,
    /// The raw text contained the separator
    pub delimited: bool,
}

/// Split raw reply text into its body and suggestions.
///
/// Suggestions are trimmed, empty ones dropped and at most
/// [`MAX_SUGGESTIONS`] kept. Without a separator, or when the separator is
/// followed by nothing usable, the default triple is returned.
pub fn decode(raw: &str) -> ParsedReply {
    match raw.split_once(SUGGESTION_SEPARATOR) {
        Some((body, tail)) => {
            let suggestions = clean_suggestions(tail.split(ITEM_SEPARATOR));
            ParsedReply {
                body: body.trim().to_string(),
                suggestions: if suggestions.is_empty() {
                    default_suggestions()
                } else {
                    suggestions
                },
                delimited: true,
            }
        }
        None => ParsedReply {
            body: raw.trim().to_string(),
            suggestions: default_suggestions(),
            delimited: false,
        },
    }
}

/// Decode text that does not follow the convention: never split.
pub fn decode_body_only(raw: &str) -> ParsedReply {
    ParsedReply {
        body: raw.trim().to_string(),
        suggestions: default_suggestions(),
        delimited: false,
    }
}

/// Inverse of [`decode`]; an empty list yields the body alone.
pub fn encode<S: AsRef<str>>(body: &str, suggestions: &[S]) -> String {
    if suggestions.is_empty() {
        return body.to_string();
    }
    let items: Vec<&str> = suggestions.iter().map(|s| s.as_ref()).collect();
    format!("{}{}{}", body, SUGGESTION_SEPARATOR, items.join("|"))
}

/// Trim, drop empties, cap at [`MAX_SUGGESTIONS`]
pub fn clean_suggestions<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_SUGGESTIONS)
        .collect()
}

/// The part of a still-streaming reply that is safe to display.
///
/// Stops at the separator, and holds back trailing `|` characters that may
/// be the start of one.
pub fn streaming_body(partial: &str) -> &str {
    match partial.find(SUGGESTION_SEPARATOR) {
        Some(pos) => &partial[..pos],
        None => partial.trim_end_matches(ITEM_SEPARATOR),
    }
}
