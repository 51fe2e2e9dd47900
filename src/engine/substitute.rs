//! Run-level text substitution.
//!
//! A paragraph's text is split across runs whose boundaries rarely line up
//! with a selected span. Substitution rewrites only the runs the span
//! touches: the first keeps its pre-match text and receives the
//! replacement (so the replacement inherits its formatting), runs strictly
//! inside the span are emptied, and the last keeps its post-match text.

/// Text access to one run of a paragraph.
///
/// Implemented by model runs and by runs of the XML tree. Implementations
/// change text only; formatting is never touched.
pub trait RunText {
    /// Current text of the run.
    fn text(&self) -> String;

    /// Replace the text of the run.
    fn set_text(&mut self, text: &str);
}

/// Replace the first occurrence of `target` in the concatenated run text.
///
/// Matching is exact and case-sensitive. Returns `false` and leaves every
/// run untouched when `target` is empty or absent.
pub fn substitute<R: RunText>(runs: &mut [R], target: &str, replacement: &str) -> bool {
    if target.is_empty() {
        return false;
    }
    let texts: Vec<String> = runs.iter().map(RunText::text).collect();
    let full = texts.concat();
    match full.find(target) {
        Some(start) => splice(runs, &texts, start, start + target.len(), replacement),
        None => false,
    }
}

/// Replace the byte range `start..end` of the concatenated run text.
///
/// Offsets must fall on character boundaries of the concatenated text.
/// Returns `false` when the range is empty or lies outside the runs.
pub fn replace_range<R: RunText>(runs: &mut [R], start: usize, end: usize, replacement: &str) -> bool {
    let texts: Vec<String> = runs.iter().map(RunText::text).collect();
    let total: usize = texts.iter().map(String::len).sum();
    if start >= end || end > total {
        return false;
    }
    splice(runs, &texts, start, end, replacement)
}

fn splice<R: RunText>(
    runs: &mut [R],
    texts: &[String],
    start: usize,
    end: usize,
    replacement: &str,
) -> bool {
    // (run index, run start offset) of every run overlapping [start, end)
    let mut affected = Vec::new();
    let mut pos = 0;
    for (i, text) in texts.iter().enumerate() {
        let run_start = pos;
        let run_end = pos + text.len();
        if run_end > start && run_start < end {
            affected.push((i, run_start));
        }
        pos = run_end;
    }

    let (Some(&(first, first_start)), Some(&(last, last_start))) =
        (affected.first(), affected.last())
    else {
        return false;
    };

    let prefix = &texts[first][..start - first_start];
    let suffix = &texts[last][end - last_start..];

    if first == last {
        runs[first].set_text(&format!("{}{}{}", prefix, replacement, suffix));
    } else {
        runs[first].set_text(&format!("{}{}", prefix, replacement));
        for &(i, _) in &affected[1..affected.len() - 1] {
            runs[i].set_text("");
        }
        runs[last].set_text(suffix);
    }

    log::trace!(
        "Replaced bytes {}..{} across {} run(s)",
        start,
        end,
        affected.len()
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TextRun, TextStyle};

    fn texts(runs: &[TextRun]) -> Vec<&str> {
        runs.iter().map(|r| r.text.as_str()).collect()
    }

    fn concat(runs: &[TextRun]) -> String {
        runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_first_occurrence_only() {
        let mut runs = vec![TextRun::new("A-X-B-X")];
        assert!(substitute(&mut runs, "X", "R"));
        assert_eq!(concat(&runs), "A-R-B-X");
    }

    #[test]
    fn test_single_run_keeps_formatting() {
        let style = TextStyle {
            bold: true,
            italic: true,
            underline: false,
            font_name: Some("Times New Roman".into()),
            font_size: Some(12.0),
        };
        let mut runs = vec![TextRun::styled("Dear Mr. Smith,", style.clone())];
        assert!(substitute(&mut runs, "Mr. Smith", "{{name}}"));
        assert_eq!(runs[0].text, "Dear {{name}},");
        assert_eq!(runs[0].style, style);
    }

    #[test]
    fn test_span_across_two_runs() {
        let mut runs = vec![TextRun::new("Hello "), TextRun::bold("World")];
        assert!(substitute(&mut runs, "lo Wo", "R"));
        assert_eq!(texts(&runs), vec!["HelR", "rld"]);
        assert!(!runs[0].style.bold);
        assert!(runs[1].style.bold);
    }

    #[test]
    fn test_middle_runs_are_emptied() {
        let mut runs = vec![
            TextRun::new("ab"),
            TextRun::italic("cd"),
            TextRun::bold("ef"),
            TextRun::new("gh"),
        ];
        assert!(substitute(&mut runs, "bcdefg", "{{x}}"));
        assert_eq!(texts(&runs), vec!["a{{x}}", "", "", "h"]);
        assert!(runs[1].style.italic);
        assert!(runs[2].style.bold);
    }

    #[test]
    fn test_exact_run_boundaries() {
        let mut runs = vec![TextRun::new("one"), TextRun::new("two"), TextRun::new("three")];
        assert!(substitute(&mut runs, "two", "2"));
        assert_eq!(texts(&runs), vec!["one", "2", "three"]);
    }

    #[test]
    fn test_not_found_leaves_runs_untouched() {
        let mut runs = vec![TextRun::new("Hello "), TextRun::new("World")];
        let before = runs.clone();
        assert!(!substitute(&mut runs, "world", "R"));
        assert_eq!(runs, before);
    }

    #[test]
    fn test_empty_target_and_empty_runs() {
        let mut runs = vec![TextRun::new("abc")];
        assert!(!substitute(&mut runs, "", "R"));
        let mut none: Vec<TextRun> = Vec::new();
        assert!(!substitute(&mut none, "a", "R"));
    }

    #[test]
    fn test_empty_runs_inside_span() {
        let mut runs = vec![TextRun::new("a"), TextRun::new(""), TextRun::new("b")];
        assert!(substitute(&mut runs, "ab", "X"));
        assert_eq!(concat(&runs), "X");
    }

    #[test]
    fn test_multibyte_text() {
        let mut runs = vec![TextRun::new("Khách hàng: Nguyễn "), TextRun::bold("Văn A.")];
        assert!(substitute(&mut runs, "Nguyễn Văn A", "{{customer_name}}"));
        assert_eq!(texts(&runs), vec!["Khách hàng: {{customer_name}}", "."]);
    }

    #[test]
    fn test_length_invariant() {
        let mut runs = vec![TextRun::new("Invoice "), TextRun::new("#12"), TextRun::new("34 due")];
        let before = concat(&runs).len();
        let target = "#1234";
        let replacement = "{{invoice_no}}";
        assert!(substitute(&mut runs, target, replacement));
        assert_eq!(concat(&runs).len(), before - target.len() + replacement.len());
    }

    #[test]
    fn test_replace_range() {
        let mut runs = vec![TextRun::new("ab"), TextRun::new("cd")];
        assert!(replace_range(&mut runs, 1, 3, "-"));
        assert_eq!(texts(&runs), vec!["a-", "d"]);
        assert!(!replace_range(&mut runs, 2, 2, "x"));
        assert!(!replace_range(&mut runs, 0, 99, "x"));
    }
}
