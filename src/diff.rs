use similar::{ChangeTag, TextDiff};

use crate::utils::{decode_best_effort, is_probably_binary, sha256_hex};

/// Renders the difference between the golden content and the actual value.
pub trait Diff: Send + Sync {
    fn diff(&self, expected: &[u8], actual: &[u8]) -> String;
}

impl<F> Diff for F
where
    F: Fn(&[u8], &[u8]) -> String + Send + Sync,
{
    fn diff(&self, expected: &[u8], actual: &[u8]) -> String {
        self(expected, actual)
    }
}

/// Line based diff; binary content gets a size and digest summary instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineDiff;

impl Diff for LineDiff {
    fn diff(&self, expected: &[u8], actual: &[u8]) -> String {
        if is_probably_binary(expected) || is_probably_binary(actual) {
            return binary_summary(expected, actual);
        }

        let expected = decode_best_effort(expected);
        let actual = decode_best_effort(actual);
        let diff = TextDiff::from_lines(expected.as_ref(), actual.as_ref());

        let mut output = String::from("--- golden\n+++ actual\n");
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Equal => ' ',
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
            };
            output.push(sign);
            output.push_str(change.value());
            if change.missing_newline() {
                output.push('\n');
            }
        }
        output
    }
}

fn binary_summary(expected: &[u8], actual: &[u8]) -> String {
    format!(
        "binary content differs\n\
- golden: {} bytes, sha256 {}\n\
+ actual: {} bytes, sha256 {}\n",
        expected.len(),
        sha256_hex(expected),
        actual.len(),
        sha256_hex(actual)
    )
}

/// Character level diff, coloured for terminals by default.
#[derive(Debug, Clone, Copy)]
pub struct PrettyDiff {
    color: bool,
}

impl Default for PrettyDiff {
    fn default() -> Self {
        Self { color: true }
    }
}

impl PrettyDiff {
    /// Marks changes with `[-deleted-]` and `{+inserted+}` instead of ANSI colours.
    pub fn plain() -> Self {
        Self { color: false }
    }

    fn wrap(&self, tag: ChangeTag, text: &str) -> String {
        match (tag, self.color) {
            (ChangeTag::Equal, _) => text.to_string(),
            (ChangeTag::Delete, true) => format!("\x1b[31m{text}\x1b[0m"),
            (ChangeTag::Insert, true) => format!("\x1b[32m{text}\x1b[0m"),
            (ChangeTag::Delete, false) => format!("[-{text}-]"),
            (ChangeTag::Insert, false) => format!("{{+{text}+}}"),
        }
    }
}

impl Diff for PrettyDiff {
    fn diff(&self, expected: &[u8], actual: &[u8]) -> String {
        let expected = decode_best_effort(expected);
        let actual = decode_best_effort(actual);
        let diff = TextDiff::from_chars(expected.as_ref(), actual.as_ref());

        let mut output = String::new();
        let mut run: Option<(ChangeTag, String)> = None;
        for change in diff.iter_all_changes() {
            if let Some((tag, text)) = run.as_mut() {
                if *tag == change.tag() {
                    text.push_str(change.value());
                    continue;
                }
            }
            if let Some((tag, text)) = run.take() {
                output.push_str(&self.wrap(tag, &text));
            }
            run = Some((change.tag(), change.value().to_string()));
        }
        if let Some((tag, text)) = run {
            output.push_str(&self.wrap(tag, &text));
        }
        output
    }
}

/// Prints both sides verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleDiff;

impl Diff for SimpleDiff {
    fn diff(&self, expected: &[u8], actual: &[u8]) -> String {
        format!(
            "expected:\n\t{}\nactual:\n\t{}",
            decode_best_effort(expected),
            decode_best_effort(actual)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_diff_marks_both_sides() {
        let out = LineDiff.diff(b"Hello, World!", b"Oh noes!");
        assert_eq!(out, "--- golden\n+++ actual\n-Hello, World!\n+Oh noes!\n");
    }

    #[test]
    fn line_diff_keeps_context_lines() {
        let out = LineDiff.diff(b"a\nb\nc\n", b"a\nB\nc\n");
        assert_eq!(out, "--- golden\n+++ actual\n a\n-b\n+B\n c\n");
    }

    #[test]
    fn line_diff_summarizes_binary_content() {
        let out = LineDiff.diff(&[0, 1, 2], b"text");
        assert!(out.starts_with("binary content differs\n"), "{out}");
        assert!(out.contains("- golden: 3 bytes, sha256 "), "{out}");
        assert!(out.contains("+ actual: 4 bytes, sha256 "), "{out}");
        assert!(out.contains(&sha256_hex(b"text")), "{out}");
    }

    fn side(out: &str, old: bool) -> String {
        let mut text = String::new();
        let mut rest = out;
        while !rest.is_empty() {
            if let Some(r) = rest.strip_prefix("[-") {
                let end = r.find("-]").unwrap();
                if old {
                    text.push_str(&r[..end]);
                }
                rest = &r[end + 2..];
            } else if let Some(r) = rest.strip_prefix("{+") {
                let end = r.find("+}").unwrap();
                if !old {
                    text.push_str(&r[..end]);
                }
                rest = &r[end + 2..];
            } else {
                let c = rest.chars().next().unwrap();
                text.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
        text
    }

    #[test]
    fn pretty_diff_marks_runs() {
        let out = PrettyDiff::plain().diff(b"kitten", b"sitting");
        assert!(out.contains("itt"), "{out}");
        assert_eq!(side(&out, true), "kitten");
        assert_eq!(side(&out, false), "sitting");
    }

    #[test]
    fn pretty_diff_colours_by_default() {
        let out = PrettyDiff::default().diff(b"a", b"b");
        assert!(out.contains("\x1b[31ma\x1b[0m"), "{out:?}");
        assert!(out.contains("\x1b[32mb\x1b[0m"), "{out:?}");
    }

    #[test]
    fn simple_diff_prints_both_values() {
        let out = SimpleDiff.diff(b"Hello, World!", b"Oh noes!");
        assert_eq!(out, "expected:\n\tHello, World!\nactual:\n\tOh noes!");
    }

    #[test]
    fn closures_are_differs() {
        let differ = |e: &[u8], a: &[u8]| format!("{}!={}", e.len(), a.len());
        assert_eq!(differ.diff(b"ab", b"c"), "2!=1");
    }
}
