//! Plain-text previews of editor content.

use regex::{Captures, Regex};
use std::sync::OnceLock;

static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
static ENTITY_REGEX: OnceLock<Regex> = OnceLock::new();

fn tag_regex() -> &'static Regex {
    TAG_REGEX.get_or_init(|| {
        Regex::new(r"<[^>]*>").expect("Invalid regex pattern - this is a compile-time constant")
    })
}

fn entity_regex() -> &'static Regex {
    ENTITY_REGEX.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);")
            .expect("Invalid regex pattern - this is a compile-time constant")
    })
}

/// Build the preview stored with a version: markup stripped, then cut to
/// `max_chars` characters.
pub fn derive_preview(content: &str, max_chars: usize) -> String {
    truncate_chars(&strip_markup(content), max_chars).to_string()
}

/// Remove every tag and decode character references.
///
/// Whitespace is left exactly as it appears between tags.
pub fn strip_markup(html: &str) -> String {
    let text = tag_regex().replace_all(html, "");
    entity_regex()
        .replace_all(&text, |caps: &Captures| match decode_entity(&caps[1]) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(|c| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code);
    }

    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => None,
    }
}

/// First `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tags_keeps_text() {
        let preview = derive_preview("<p><strong>Texto</strong> com <em>formatação</em></p>", 100);
        assert_eq!(preview, "Texto com formatação");
    }

    #[test]
    fn test_long_text_is_cut_to_exact_length() {
        let content = format!("<p>{}</p>", "a".repeat(200));
        let preview = derive_preview(&content, 100);
        assert_eq!(preview.chars().count(), 100);
    }

    #[test]
    fn test_short_text_is_kept_whole() {
        assert_eq!(derive_preview("<p>Curto</p>", 100), "Curto");
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        let text = "ç".repeat(150);
        let preview = derive_preview(&text, 100);
        assert_eq!(preview.chars().count(), 100);
        assert_eq!(preview, "ç".repeat(100));
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(
            strip_markup("<p>A &amp; B &lt;art. 5&gt; &quot;x&quot; &#39;y&#39; &#xE7;</p>"),
            "A & B <art. 5> \"x\" 'y' ç"
        );
    }

    #[test]
    fn test_unknown_entity_is_left_alone() {
        assert_eq!(strip_markup("&bogus; &#xZZ;"), "&bogus; &#xZZ;");
    }

    #[test]
    fn test_whitespace_between_tags_is_preserved() {
        assert_eq!(strip_markup("<p>um</p>\n<p> dois</p>"), "um\n dois");
    }

    #[test]
    fn test_tags_with_attributes() {
        assert_eq!(
            strip_markup(r#"<span class="x" data-id="1">Art.</span><br/>1º"#),
            "Art.1º"
        );
    }

    #[test]
    fn test_markup_only_gives_empty_preview() {
        assert_eq!(derive_preview("<p><br></p>", 100), "");
    }
}
