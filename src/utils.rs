//! Shared HTTP client construction and text utilities.

use crate::config::get_http_timeout_secs;
use reqwest::Client as HttpClient;
use std::time::Duration;

/// Creates an HTTP client configured with the standard outbound timeout.
///
/// Uses the `HTTP_TIMEOUT_SECS` environment variable or a 30s default.
/// This prevents infinite hangs when an upstream service is unresponsive.
#[must_use]
pub fn create_http_client() -> HttpClient {
    let timeout = Duration::from_secs(get_http_timeout_secs());
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| HttpClient::new())
}

/// Splits `text` into consecutive slices of at most `size` characters.
///
/// Slicing counts `char`s, never bytes, so multi-byte text cannot be cut
/// mid-codepoint. Empty input yields no chunks.
#[must_use]
pub fn chunk_chars(text: &str, size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Splits a long message into parts that each fit within `limit` characters.
///
/// Prefers breaking at line boundaries; a single line longer than the limit
/// is hard-split at character boundaries.
#[must_use]
pub fn split_long_message(text: &str, limit: usize) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len > 0 && current_len + line_len > limit {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > limit {
            let mut pieces = chunk_chars(line, limit);
            if let Some(last) = pieces.pop() {
                parts.append(&mut pieces);
                current_len = last.chars().count();
                current = last;
            }
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }
    if current_len > 0 {
        parts.push(current);
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunking_produces_fixed_slices_in_order() {
        let text = "a".repeat(2500);
        let chunks = chunk_chars(&text, 1024);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 1024);
        assert_eq!(chunks[1].chars().count(), 1024);
        assert_eq!(chunks[2].chars().count(), 452);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn chunking_counts_chars_not_bytes() {
        // 4 chars, 12 bytes
        let text = "日本語字";
        let chunks = chunk_chars(text, 2);
        assert_eq!(chunks, vec!["日本", "語字"]);
    }

    #[test]
    fn chunking_empty_input_yields_nothing() {
        assert!(chunk_chars("", 1024).is_empty());
    }

    #[test]
    fn short_messages_pass_through_whole() {
        let parts = split_long_message("hello\nworld", 100);
        assert_eq!(parts, vec!["hello\nworld"]);
    }

    #[test]
    fn long_messages_split_at_line_boundaries() {
        let text = format!("{}\n{}", "a".repeat(30), "b".repeat(30));
        let parts = split_long_message(&text, 40);
        assert_eq!(parts.len(), 2);
        assert!(parts[0].starts_with('a'));
        assert!(parts[1].starts_with('b'));
    }

    #[test]
    fn oversized_lines_are_hard_split() {
        let text = "x".repeat(95);
        let parts = split_long_message(&text, 40);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().count() <= 40));
        assert_eq!(parts.concat(), text);
    }
}
