//! Text normalization: comment stripping, whitespace cleanup and
//! blank-line removal. Runs before any parsing and keeps the original
//! line numbers so later stages can report accurate diagnostics.

use crate::trace::Trace;
use lazy_regex::regex_replace_all;
use serde_json::json;

/// A surviving source line and its 1-based position in the raw input.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub number: u32,
    pub text: String,
}

/// Normalize the raw source. Per line: discard everything from the
/// first `;`, trim outer whitespace, collapse internal whitespace runs
/// to single spaces, and drop lines that end up empty. Line order is
/// preserved.
pub fn normalize_lines(source: &str, trace: &mut Trace) -> Vec<Line> {
    let mut lines: Vec<Line> = source
        .lines()
        .enumerate()
        .map(|(index, raw)| {
            let code = match raw.find(';') {
                Some(at) => &raw[..at],
                None => raw,
            };
            Line {
                number: (index + 1) as u32,
                text: code.trim().to_owned(),
            }
        })
        .collect();
    trace.emit("remove_comments", || json!([join(&lines)]));

    lines.retain(|line| !line.text.is_empty());
    trace.emit("remove_empty_lines", || json!([join(&lines)]));

    for line in &mut lines {
        line.text = regex_replace_all!(r"\s+", &line.text, " ").into_owned();
    }
    trace.emit("remove_dup_wspace", || json!([join(&lines)]));

    lines
}

/// Normalized form of `source` as plain text.
pub fn normalize(source: &str) -> String {
    join(&normalize_lines(source, &mut Trace::disabled()))
}

fn join(lines: &[Line]) -> String {
    let texts: Vec<&str> = lines.iter().map(|line| line.text.as_str()).collect();
    texts.join("\n")
}
