//! User-text sanitization — strips HTML and script vectors, caps length.

use std::sync::OnceLock;

use regex::Regex;

fn html_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

fn js_scheme() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)javascript:").unwrap())
}

fn event_handlers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)on\w+=").unwrap())
}

/// Sanitize free-form user text before persisting: removes HTML tags,
/// `javascript:` URLs and inline event-handler attributes, trims
/// whitespace, and caps the result at `max_len` characters.
pub fn sanitize_text(input: &str, max_len: usize) -> String {
    let s = html_tags().replace_all(input, "");
    let s = js_scheme().replace_all(&s, "");
    let s = event_handlers().replace_all(&s, "");
    let s = s.trim();
    s.chars().take(max_len).collect()
}
