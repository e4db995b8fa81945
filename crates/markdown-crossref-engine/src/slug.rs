use std::sync::OnceLock;

use regex::Regex;

static NON_WORD: OnceLock<Regex> = OnceLock::new();

/// Turn a caption into an anchor id.
///
/// Runs of characters outside `[A-Za-z0-9_]` become a single hyphen, hyphens
/// are trimmed from both ends and the result is lowercased.
pub fn slugify(text: &str) -> String {
    let re = NON_WORD.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("Invalid slug regex"));
    re.replace_all(text, "-").trim_matches('-').to_lowercase()
}

/// Turn a source key into an anchor id: `wiki:markdown` becomes
/// `wiki_markdown`.
pub fn key_id(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Split a title into `(id, caption)`.
///
/// `Caption#custom-id` (exactly one `#`, text on both sides) gives the
/// explicit id. Anything else is its own caption with a slugified id.
pub fn split_title(title: &str) -> (String, String) {
    let mut parts = title.split('#');
    if let (Some(caption), Some(id), None) = (parts.next(), parts.next(), parts.next()) {
        let (caption, id) = (caption.trim(), id.trim());
        if !caption.is_empty() && !id.is_empty() {
            return (id.to_string(), caption.to_string());
        }
    }
    (slugify(title), title.trim().to_string())
}
