//! Extraction of YouTube source video IDs from reupload descriptions.
//!
//! Channels that mirror YouTube content usually credit the original in the
//! title or description in one of a handful of loose conventions. The
//! patterns are tried in order and the first 11-character candidate wins.

use std::sync::OnceLock;

use regex::Regex;

/// A YouTube video ID: exactly 11 characters of `[A-Za-z0-9_-]`.
const ID_CHARS: &str = r"[A-Za-z0-9_-]{11}";

fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Ordered from most to least explicit. URL forms first so a full
        // link is never mistaken for a bare-bracket credit.
        [
            format!(r"(?:youtube\.com/watch\?(?:[^\s]*&)?v=)({ID_CHARS})"),
            format!(r"(?:youtu\.be/)({ID_CHARS})"),
            format!(r"(?i:yt)[:：]\s*({ID_CHARS})"),
            format!(r"(?i:youtube)[:：]\s*({ID_CHARS})"),
            format!(r"(?i:source)\s*[=：:]\s*({ID_CHARS})"),
            format!(r"(?i:original)[:：]\s*({ID_CHARS})"),
            format!(r"\[({ID_CHARS})\]"),
            format!(r"\((?i:source)[:：]?\s*({ID_CHARS})\)"),
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid credit regex"))
        .collect()
    })
}

/// Scans `text` (typically a title plus description) for a credited YouTube
/// video ID. Returns the first match, or `None` if nothing looks like a
/// credit.
#[must_use]
pub fn extract_youtube_source_id(text: &str) -> Option<String> {
    for pattern in patterns() {
        if let Some(caps) = pattern.captures(text) {
            if let Some(id) = caps.get(1) {
                return Some(id.as_str().to_owned());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_from_common_credit_styles() {
        let cases: &[(&str, Option<&str>)] = &[
            (
                "搬运 https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                Some("dQw4w9WgXcQ"),
            ),
            (
                "https://youtube.com/watch?list=PL123&v=dQw4w9WgXcQ",
                Some("dQw4w9WgXcQ"),
            ),
            ("原视频 https://youtu.be/dQw4w9WgXcQ", Some("dQw4w9WgXcQ")),
            ("yt: dQw4w9WgXcQ", Some("dQw4w9WgXcQ")),
            ("YT：dQw4w9WgXcQ", Some("dQw4w9WgXcQ")),
            ("YouTube: dQw4w9WgXcQ", Some("dQw4w9WgXcQ")),
            ("source=dQw4w9WgXcQ", Some("dQw4w9WgXcQ")),
            ("Source：dQw4w9WgXcQ", Some("dQw4w9WgXcQ")),
            ("Original: dQw4w9WgXcQ", Some("dQw4w9WgXcQ")),
            ("funny cats [dQw4w9WgXcQ]", Some("dQw4w9WgXcQ")),
            ("funny cats (source: dQw4w9WgXcQ)", Some("dQw4w9WgXcQ")),
            ("no credit here at all", None),
            // Ten characters, one too short.
            ("[dQw4w9WgXc]", None),
            ("", None),
        ];

        for (text, expected) in cases {
            assert_eq!(
                extract_youtube_source_id(text).as_deref(),
                *expected,
                "text: {text:?}"
            );
        }
    }

    #[test]
    fn url_form_wins_over_bracket_form() {
        let text = "[abcdefghijk] see https://youtu.be/dQw4w9WgXcQ";
        assert_eq!(
            extract_youtube_source_id(text).as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }
}
