//! Local cleanup of text pulled out of a PDF region.
//!
//! PDF extraction breaks sentences at every visual line, hyphenates words at
//! the margin and scatters page numbers into the stream. [`normalize`] undoes
//! that without any external help. Applying it twice gives the same result as
//! applying it once.

use std::sync::LazyLock;

use regex::Regex;

/// Lines shorter than this on average mean the region was over-segmented
const SHORT_LINE_AVERAGE: usize = 20;

static PAGE_NUMBER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-–—]?\s*\d{1,4}\s*[-–—]?\s*$").expect("page number regex")
});
static HORIZONTAL_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]{2,}").expect("whitespace regex"));
static BLANK_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline regex"));
static SPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").expect("space regex"));

pub fn normalize(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");

    let text = text
        .split('\n')
        .filter(|line| !PAGE_NUMBER_LINE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n");
    let text = HORIZONTAL_RUN.replace_all(&text, " ");
    let text = BLANK_RUN.replace_all(&text, "\n\n");

    let lines: Vec<String> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let lines: Vec<String> = join_broken_lines(lines)
        .into_iter()
        .map(|line| space_cjk_latin(&line))
        .map(|line| SPACE_RUN.replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect();

    let lines = if is_over_segmented(&lines) {
        join_unterminated(lines)
    } else {
        lines
    };

    lines.join("\n")
}

/// How a line continues into the next one
#[derive(Debug, PartialEq, Eq)]
enum Join {
    /// `exam-` + `ple` becomes `example`
    Hyphen,
    /// CJK text has no word separator
    Cjk,
    /// a sentence that wrapped before its terminal punctuation
    Sentence,
    Keep,
}

fn join_kind(current: &str, next: &str) -> Join {
    let mut tail = current.chars().rev();
    let last = tail.next();
    let before_last = tail.next();
    let first = next.chars().next();

    match (before_last, last, first) {
        (Some(b), Some('-'), Some(f)) if b.is_alphabetic() && f.is_lowercase() => Join::Hyphen,
        (_, Some(l), Some(f)) if is_cjk(l) && is_cjk(f) => Join::Cjk,
        (_, Some(l), Some(_)) if !is_terminal(l) && l != '-' => Join::Sentence,
        _ => Join::Keep,
    }
}

/// Sequential merge: each decision looks at the already merged line, so no
/// mergeable pair is left behind.
fn join_broken_lines(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        let Some(current) = out.last_mut() else {
            out.push(line);
            continue;
        };
        match join_kind(current, &line) {
            Join::Hyphen => {
                current.pop();
                current.push_str(&line);
            }
            Join::Cjk => current.push_str(&line),
            Join::Sentence => {
                current.push(' ');
                current.push_str(&line);
            }
            Join::Keep => out.push(line),
        }
    }
    out
}

fn is_over_segmented(lines: &[String]) -> bool {
    if lines.len() < 2 {
        return false;
    }
    let total: usize = lines.iter().map(|l| l.chars().count()).sum();
    total / lines.len() < SHORT_LINE_AVERAGE
}

/// Keep a line break only after sentence-ending punctuation
fn join_unterminated(lines: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        match out.last_mut() {
            Some(current) if !current.chars().last().is_some_and(is_terminal) => {
                current.push(' ');
                current.push_str(&line);
            }
            _ => out.push(line),
        }
    }
    out
}

fn space_cjk_latin(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut prev: Option<char> = None;
    for c in line.chars() {
        if let Some(p) = prev {
            let boundary = (is_cjk(p) && c.is_ascii_alphanumeric())
                || (p.is_ascii_alphanumeric() && is_cjk(c));
            if boundary {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out
}

pub(crate) fn is_cjk(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

fn is_terminal(c: char) -> bool {
    matches!(
        c,
        '.' | '!' | '?' | ';' | ':' | '…' | '。' | '！' | '？' | '；' | '：'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_item_survives() {
        assert_eq!(normalize("Total: 42"), "Total: 42");
        assert_eq!(normalize("  Total:   42 \n"), "Total: 42");
    }

    #[test]
    fn page_number_lines_are_dropped() {
        let raw = "The end of a long paragraph that goes on.\n  17  \nNext page starts here with more words.";
        assert_eq!(
            normalize(raw),
            "The end of a long paragraph that goes on.\nNext page starts here with more words."
        );
        assert_eq!(normalize("- 3 -\nSome heading text that is long enough."), "Some heading text that is long enough.");
    }

    #[test]
    fn wrapped_sentence_is_joined() {
        let raw = "This sentence was wrapped by the PDF\nlayout engine and should be one line.";
        assert_eq!(
            normalize(raw),
            "This sentence was wrapped by the PDF layout engine and should be one line."
        );
    }

    #[test]
    fn capitalized_continuation_is_joined() {
        let raw = "The results of the quarterly review\nShow that revenue grew by ten percent.";
        assert_eq!(
            normalize(raw),
            "The results of the quarterly review Show that revenue grew by ten percent."
        );
    }

    #[test]
    fn capitalized_line_after_terminal_stays_separate() {
        let raw = "The first sentence is finished here.\nAnother sentence begins on a new line.";
        assert_eq!(normalize(raw), raw);
    }

    #[test]
    fn hyphenated_words_are_merged() {
        let raw = "A quick exam-\nple of a hyphenated break in a longer line.";
        assert_eq!(
            normalize(raw),
            "A quick example of a hyphenated break in a longer line."
        );
    }

    #[test]
    fn cjk_lines_are_merged_without_separator() {
        assert_eq!(normalize("这是一个被换行\n打断的句子。"), "这是一个被换行打断的句子。");
    }

    #[test]
    fn cjk_latin_boundaries_get_a_space() {
        assert_eq!(normalize("使用Rust编写"), "使用 Rust 编写");
        assert_eq!(normalize("版本2发布"), "版本 2 发布");
    }

    #[test]
    fn short_lines_are_rejoined() {
        let raw = "Name\nAddress\nCity.\nPhone";
        assert_eq!(normalize(raw), "Name Address City.\nPhone");
    }

    #[test]
    fn blank_runs_are_dropped() {
        let raw = "A paragraph of reasonable length goes here.\n\n\n\nAnother paragraph follows it here.";
        assert_eq!(
            normalize(raw),
            "A paragraph of reasonable length goes here.\nAnother paragraph follows it here."
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "Total: 42",
            "The end of a long paragraph\nthat goes on.\n  17  \nNext page starts here.",
            "A quick exam-\nple of\nhyphen-\nation in short lines",
            "这是一个被换行\n打断的句子。使用Rust编写\nand more",
            "Name\nAddress\nCity.\nPhone\n\n\n\nfax",
            "a  b\t\tc\r\nd-\ne\n中\nA",
            "x\n1\ny",
            "",
            "   \n\n  ",
        ];
        for raw in samples {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "not idempotent for {raw:?}");
        }
    }
}
