//! Unified diffs between a stored version and live content.

use sentencify_storage::VersionRecord;
use similar::{ChangeTag, TextDiff};

/// Generate a unified diff from `record` to `current`.
pub fn unified(record: &VersionRecord, current: &str) -> String {
    let diff = TextDiff::from_lines(record.content.as_str(), current);
    let mut output = String::new();

    output.push_str(&format!("--- a/{}@{}\n", record.topic_key, record.id));
    output.push_str(&format!("+++ b/{}\n", record.topic_key));

    for (idx, group) in diff.grouped_ops(3).iter().enumerate() {
        if idx > 0 {
            output.push_str("...\n");
        }

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };

                output.push_str(sign);
                output.push_str(change.value());
                if !change.value().ends_with('\n') {
                    output.push('\n');
                }
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentencify_storage::VersionId;

    fn record(content: &str) -> VersionRecord {
        VersionRecord {
            id: VersionId(7),
            topic_key: "DISPOSITIVO".to_string(),
            content: content.to_string(),
            preview: String::new(),
            timestamp: 0,
        }
    }

    #[test]
    fn test_diff_marks_changed_lines() {
        let diff = unified(
            &record("<p>Julgo procedente.</p>\n<p>Custas.</p>\n"),
            "<p>Julgo improcedente.</p>\n<p>Custas.</p>\n",
        );

        assert!(diff.starts_with("--- a/DISPOSITIVO@7\n+++ b/DISPOSITIVO\n"));
        assert!(diff.contains("-<p>Julgo procedente.</p>\n"));
        assert!(diff.contains("+<p>Julgo improcedente.</p>\n"));
        assert!(diff.contains(" <p>Custas.</p>\n"));
    }

    #[test]
    fn test_identical_content_has_no_changes() {
        let diff = unified(&record("same\n"), "same\n");
        assert!(diff.starts_with("--- a/DISPOSITIVO@7\n+++ b/DISPOSITIVO\n"));
        assert!(!diff
            .lines()
            .skip(2)
            .any(|line| line.starts_with('-') || line.starts_with('+')));
    }
}
