//! Plain-text helpers shared by the gallery guide loader and the blog.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static TAG_NON_GREEDY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<]+?>").expect("valid tag regex"));

static TAG_SIMPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid tag regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z][A-Za-z0-9]*);").expect("valid entity regex")
});

/// Remove markup using the non-greedy `<[^<]+?>` pattern.
pub fn strip_tags(html: &str) -> String {
    TAG_NON_GREEDY.replace_all(html, "").into_owned()
}

/// Remove markup using `<[^>]+>`, the pattern used for blog excerpts.
pub fn strip_simple_tags(html: &str) -> String {
    TAG_SIMPLE.replace_all(html, "").into_owned()
}

/// Decode numeric and named (HTML5) character references.
///
/// Unknown or invalid references are left untouched.
pub fn unescape_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let body = &caps[1];
            resolve_reference(body).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn resolve_reference(body: &str) -> Option<String> {
    if let Some(number) = body.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    quick_xml::escape::resolve_html5_entity(body).map(str::to_string)
}

/// Truncate to at most `max` characters, appending `...` when anything was cut.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let mut truncated: String = text.chars().take(max).collect();
        truncated.push_str("...");
        truncated
    } else {
        text.to_string()
    }
}

/// Longest accepted single form field.
pub const MAX_INPUT_CHARS: usize = 1000;

/// Trim and cap a user-supplied field. Markup is kept; templates escape it.
pub fn clamp_input(value: &str) -> String {
    value.trim().chars().take(MAX_INPUT_CHARS).collect()
}

/// Tag-stripped, entity-decoded, trimmed text cut to `max` characters.
pub fn plain_summary(html: &str, max: usize) -> String {
    let plain = unescape_entities(&strip_tags(html));
    truncate_with_ellipsis(plain.trim(), max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_non_greedily() {
        assert_eq!(strip_tags("<p>Hello <b>Roma</b></p>"), "Hello Roma");
        assert_eq!(strip_tags("a < b and c > d"), "a  d");
    }

    #[test]
    fn unescapes_named_and_numeric_entities() {
        assert_eq!(unescape_entities("caff&egrave; &amp; t&#233;"), "caffè & té");
        assert_eq!(unescape_entities("&#x41;&lt;"), "A<");
        assert_eq!(unescape_entities("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn truncation_counts_characters() {
        let text = "è".repeat(10);
        assert_eq!(truncate_with_ellipsis(&text, 10), text);
        assert_eq!(truncate_with_ellipsis(&text, 4), "èèèè...");
    }

    #[test]
    fn plain_summary_trims_after_stripping() {
        assert_eq!(plain_summary("  <h1>Lago</h1> di Como  ", 155), "Lago di Como");
    }

    #[test]
    fn clamp_input_trims_and_caps() {
        assert_eq!(clamp_input("  <b>hi</b> "), "<b>hi</b>");
        assert_eq!(clamp_input(&"é".repeat(1200)).chars().count(), MAX_INPUT_CHARS);
    }
}
