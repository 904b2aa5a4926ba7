//! Plain-text rendering of lists and results for the command line

use chrono::{DateTime, Local, Utc};

use crate::extraction::{ExtractionOutcome, ExtractionRecord};
use crate::reader::{NavigationTarget, TranslationOutcome};
use crate::store::{Bookmark, HistoryEntry, Note};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";
const PREVIEW_CHARS: usize = 60;

pub fn format_time(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format(DATE_FORMAT).to_string()
}

/// First line of `text`, cut to `max` chars with an ellipsis
pub fn preview(text: &str, max: usize) -> String {
    let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    let mut out: String = line.chars().take(max).collect();
    if line.chars().count() > max || text.trim().lines().count() > 1 {
        out.push('…');
    }
    out
}

pub fn notes_list(notes: &[Note]) -> String {
    if notes.is_empty() {
        return "No notes for this document".to_string();
    }
    let mut out = String::new();
    for note in notes {
        out.push_str(&format!("[{}] {}\n", note.id, format_time(&note.timestamp)));
        if !note.text.is_empty() {
            out.push_str(&format!("  > {}\n", preview(&note.text, PREVIEW_CHARS)));
        }
        for line in note.content.lines() {
            out.push_str(&format!("  {line}\n"));
        }
    }
    out
}

pub fn bookmarks_list(bookmarks: &[Bookmark]) -> String {
    if bookmarks.is_empty() {
        return "No bookmarks for this document".to_string();
    }
    bookmarks
        .iter()
        .map(|b| {
            let place = match b.page {
                Some(page) => format!("page {page}"),
                None => format!("offset {}", b.scroll_position),
            };
            format!(
                "[{}] {} ({place}, {})",
                b.id,
                preview(&b.text, PREVIEW_CHARS),
                format_time(&b.timestamp)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn history_list(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "History is empty".to_string();
    }
    entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let position = match e.last_position {
                Some(p) => match p.page {
                    Some(page) => format!(", page {page}"),
                    None => format!(", offset {}", p.scroll_offset),
                },
                None => String::new(),
            };
            format!(
                "{:>2}. {} [{}] {}{position}\n    {}",
                i + 1,
                e.file_name,
                e.file_type,
                format_time(&e.opened_at),
                e.file_path
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn extractions_list(records: &[ExtractionRecord]) -> String {
    if records.is_empty() {
        return "No extractions yet".to_string();
    }
    records
        .iter()
        .map(|r| {
            format!(
                "#{} page {} at ({:.0}, {:.0}) {}x{}\n{}",
                r.id,
                r.page,
                r.rect.x,
                r.rect.y,
                r.rect.width.round(),
                r.rect.height.round(),
                r.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn extraction_outcome(outcome: &ExtractionOutcome) -> String {
    match outcome {
        ExtractionOutcome::TooSmall => "Selection too small, ignored".to_string(),
        other => other.message().unwrap_or_default().to_string(),
    }
}

/// A failed translation shows the reason and keeps the original text
pub fn translation(original: &str, outcome: &TranslationOutcome) -> String {
    match outcome {
        TranslationOutcome::Translated(t) => {
            format!("[{} → {}]\n{}", t.source_lang, t.target_lang, t.text)
        }
        TranslationOutcome::NotConfigured(message) => message.clone(),
        TranslationOutcome::Failed(reason) => format!("failed: {reason}\n{original}"),
    }
}

pub fn navigation(target: &NavigationTarget) -> String {
    match target {
        NavigationTarget::Page { page, .. } => format!("Jumped to page {page}"),
        NavigationTarget::Scroll {
            scroll_offset,
            search_text: Some(snippet),
        } => format!("Jumped to offset {scroll_offset} (\"{snippet}\")"),
        NavigationTarget::Scroll { scroll_offset, .. } => {
            format!("Jumped to offset {scroll_offset}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Translation;

    #[test]
    fn preview_cuts_long_and_multiline_text() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("abcdefghij", 4), "abcd…");
        assert_eq!(preview("\nfirst\nsecond", 20), "first…");
    }

    #[test]
    fn failed_translation_keeps_original() {
        let out = translation("Hello", &TranslationOutcome::Failed("timeout".into()));
        assert_eq!(out, "failed: timeout\nHello");

        let ok = TranslationOutcome::Translated(Translation {
            source_lang: "EN".into(),
            target_lang: "ZH-HANS".into(),
            text: "你好".into(),
        });
        assert_eq!(translation("Hello", &ok), "[EN → ZH-HANS]\n你好");
    }

    #[test]
    fn empty_lists_say_so() {
        assert_eq!(notes_list(&[]), "No notes for this document");
        assert_eq!(bookmarks_list(&[]), "No bookmarks for this document");
        assert_eq!(history_list(&[]), "History is empty");
        assert_eq!(extractions_list(&[]), "No extractions yet");
    }

    #[test]
    fn notes_show_excerpt_and_body() {
        let note = Note::new(7, "the excerpt", "line one\nline two");
        let out = notes_list(&[note]);
        assert!(out.starts_with("[7] "));
        assert!(out.contains("  > the excerpt\n"));
        assert!(out.contains("  line one\n  line two\n"));
    }
}
