//! Minimal JSONC support for config files.
//!
//! Only comments are handled; trailing commas are still a parse error.

/// Strip `//` line comments and `/* */` block comments outside of strings.
///
/// Newlines inside comments are preserved so serde_json error positions still
/// point at the right line.
pub fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }

        if in_string {
            match c {
                '\\' => escape_next = true,
                '"' => in_string = false,
                _ => {}
            }
            result.push(c);
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_line_and_block_comments() {
        let input = "{\n  // cap\n  \"a\": 1, /* inline */ \"b\": 2\n}";
        let value: serde_json::Value = serde_json::from_str(&strip_comments(input)).unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(value["b"], 2);
    }

    #[test]
    fn test_keeps_comment_markers_inside_strings() {
        let input = r#"{"url": "http://example.com/*x*/", "q": "a \"//\" b"}"#;
        let value: serde_json::Value = serde_json::from_str(&strip_comments(input)).unwrap();
        assert_eq!(value["url"], "http://example.com/*x*/");
        assert_eq!(value["q"], "a \"//\" b");
    }

    #[test]
    fn test_block_comment_keeps_line_count() {
        let input = "/* one\ntwo\nthree */{}";
        assert_eq!(strip_comments(input), "\n\n{}");
    }
}
