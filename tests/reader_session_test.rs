mod common;

use std::fs;

use common::{fixture, offline_settings};
use readhelper::speech::PlaybackState;
use readhelper::store::Position;
use readhelper::{NavigationTarget, ReaderError, TranslationOutcome};

#[test]
fn notes_persist_and_highlight_their_excerpt() {
    let fx = fixture();
    let md = fx.file("guide.md", b"# Guide\n\nThe quick brown fox.\n");

    let mut reader = fx.reader(offline_settings());
    reader.open(&md).unwrap();
    let note = reader.add_note("quick brown", "remember this").unwrap();
    assert_eq!(reader.notes().len(), 1);

    let html = reader.rendered_html().unwrap();
    assert!(html.contains("<h1>Guide</h1>"));
    assert!(html.contains("<span class=\"highlight\" data-type=\"note\">quick brown</span>"));

    let mut again = fx.reader(offline_settings());
    again.open(&md).unwrap();
    assert_eq!(again.notes(), [note.clone()]);

    again.delete_note(note.id).unwrap();
    assert!(again.notes().is_empty());
    let raw = fs::read_to_string(fx.data_dir().join("notes.json")).unwrap();
    assert_eq!(raw.trim(), "{}");
}

#[test]
fn failed_note_save_is_rolled_back() {
    let fx = fixture();
    let txt = fx.file("plain.txt", b"hello world");
    let mut reader = fx.reader(offline_settings());
    reader.open(&txt).unwrap();

    // a directory where the notes file should be makes every read fail
    fs::create_dir_all(fx.data_dir().join("notes.json")).unwrap();
    let err = reader.add_note("hello", "a note").unwrap_err();
    assert!(matches!(err, ReaderError::Store(_)));
    assert!(reader.notes().is_empty());
}

#[test]
fn blank_note_and_missing_document_are_rejected() {
    let fx = fixture();
    let txt = fx.file("plain.txt", b"hello world");
    let mut reader = fx.reader(offline_settings());
    assert!(matches!(
        reader.add_note("x", "y"),
        Err(ReaderError::Invalid(_))
    ));
    reader.open(&txt).unwrap();
    assert!(matches!(
        reader.add_note("x", "   "),
        Err(ReaderError::Invalid(_))
    ));
}

#[test]
fn open_failure_keeps_current_document() {
    let fx = fixture();
    let txt = fx.file("plain.txt", b"hello world");
    let mut reader = fx.reader(offline_settings());
    reader.open(&txt).unwrap();
    reader.add_note("hello", "kept").unwrap();

    let missing = fx.dir.path().join("missing.md");
    assert!(matches!(reader.open(&missing), Err(ReaderError::Load(_))));
    assert_eq!(reader.current().unwrap().doc.name, "plain.txt");
    assert_eq!(reader.notes().len(), 1);
}

#[test]
fn switching_documents_resets_session_state() {
    let fx = fixture();
    let first = fx.file("first.txt", b"first document");
    let second = fx.file("second.txt", b"second document");
    let mut reader = fx.reader(offline_settings());

    reader.open(&first).unwrap();
    reader.add_note("first", "note on first").unwrap();
    reader.add_bookmark(Some("first")).unwrap();
    reader.speak(None).unwrap();
    assert_eq!(reader.speech_state(), PlaybackState::Speaking);

    reader.open(&second).unwrap();
    assert_eq!(reader.current().unwrap().doc.path, second);
    assert!(reader.notes().is_empty());
    assert!(reader.bookmarks().is_empty());
    assert_eq!(reader.speech_state(), PlaybackState::Idle);

    let history = reader.history().unwrap();
    let names: Vec<&str> = history.iter().map(|e| e.file_name.as_str()).collect();
    assert_eq!(names, ["second.txt", "first.txt"]);
}

#[test]
fn text_position_is_restored_on_reopen() {
    let fx = fixture();
    let txt = fx.file("long.txt", b"line\n".repeat(500).as_slice());
    let other = fx.file("other.txt", b"other");
    let mut reader = fx.reader(offline_settings());

    reader.open(&txt).unwrap();
    assert_eq!(reader.scroll(300).unwrap(), 300);
    assert_eq!(reader.scroll(-500).unwrap(), 0);
    assert_eq!(reader.scroll(5_000_000_000).unwrap(), u32::MAX);
    assert_eq!(reader.scroll(i64::MIN).unwrap(), 0);
    reader.scroll(420).unwrap();
    reader.open(&other).unwrap();

    reader.open_history(1).unwrap();
    assert_eq!(reader.current().unwrap().doc.name, "long.txt");
    assert_eq!(
        reader.position(),
        Some(Position {
            page: None,
            scroll_offset: 420
        })
    );
}

#[test]
fn pdf_page_is_restored_and_bookmarked() {
    let fx = fixture();
    let pdf = fx.file("report.pdf", b"%PDF-1.4 fake");
    let mut reader = fx.reader(offline_settings());

    reader.open(&pdf).unwrap();
    reader.go_to_page(4).unwrap();
    let bookmark = reader.add_bookmark(None).unwrap();
    assert_eq!(bookmark.text, "Bookmark 1");
    assert_eq!(bookmark.page, Some(4));
    assert!(bookmark.search_text.is_none());
    reader.close();

    let mut again = fx.reader(offline_settings());
    again.open(&pdf).unwrap();
    assert_eq!(again.position().unwrap().page, Some(4));

    again.go_to_page(1).unwrap();
    let target = again.goto_bookmark(bookmark.id).unwrap();
    assert!(matches!(target, NavigationTarget::Page { page: 4, .. }));
    assert_eq!(again.position().unwrap().page, Some(4));

    again.delete_bookmark(bookmark.id).unwrap();
    assert!(again.bookmarks().is_empty());
    assert!(matches!(
        again.goto_bookmark(bookmark.id),
        Err(ReaderError::Invalid(_))
    ));
}

#[test]
fn text_bookmark_keeps_search_snippet() {
    let fx = fixture();
    let txt = fx.file("plain.txt", b"alpha beta gamma");
    let mut reader = fx.reader(offline_settings());
    reader.open(&txt).unwrap();
    reader.scroll(80).unwrap();

    let bookmark = reader.add_bookmark(Some("  beta gamma ")).unwrap();
    assert_eq!(bookmark.text, "beta gamma");
    assert_eq!(bookmark.page, None);
    assert_eq!(bookmark.search_text.as_deref(), Some("beta gamma"));
    assert_eq!(bookmark.scroll_position, 80);

    reader.scroll(-80).unwrap();
    let target = reader.goto_bookmark(bookmark.id).unwrap();
    assert_eq!(
        target,
        NavigationTarget::Scroll {
            scroll_offset: 80,
            search_text: Some("beta gamma".to_string())
        }
    );
    assert_eq!(reader.position().unwrap().scroll_offset, 80);
}

#[test]
fn history_can_be_pruned_and_cleared() {
    let fx = fixture();
    let a = fx.file("a.txt", b"a");
    let b = fx.file("b.md", b"b");
    let mut reader = fx.reader(offline_settings());
    reader.open(&a).unwrap();
    reader.open(&b).unwrap();

    let entries = reader.history().unwrap();
    reader.remove_history(&entries[1].file_path).unwrap();
    assert_eq!(reader.history().unwrap().len(), 1);
    reader.clear_history().unwrap();
    assert!(reader.history().unwrap().is_empty());
    assert!(matches!(
        reader.open_history(0),
        Err(ReaderError::Invalid(_))
    ));
}

#[test]
fn translation_without_key_explains_setup() {
    let fx = fixture();
    let mut reader = fx.reader(offline_settings());
    let outcome = reader.translate("Hello world").unwrap();
    assert!(matches!(outcome, TranslationOutcome::NotConfigured(_)));
    assert!(matches!(
        reader.translate("   "),
        Err(ReaderError::Invalid(_))
    ));
}

#[test]
fn unreachable_translation_service_is_a_failed_outcome() {
    let fx = fixture();
    let mut settings = offline_settings();
    settings.translation.api_key = Some("test-key:fx".to_string());
    let mut reader = fx.reader(settings);
    let outcome = reader.translate("Hello world").unwrap();
    assert!(matches!(outcome, TranslationOutcome::Failed(_)));
}

#[test]
fn speech_follows_pause_and_resume() {
    let fx = fixture();
    let txt = fx.file("plain.txt", b"read me");
    let mut reader = fx.reader(offline_settings());
    assert!(reader.speak(None).is_err());

    reader.open(&txt).unwrap();
    reader.speak(Some("just this")).unwrap();
    assert!(reader.pause_speech().unwrap());
    assert_eq!(reader.speech_state(), PlaybackState::Paused);
    assert!(reader.resume_speech().unwrap());
    reader.stop_speech();
    assert_eq!(reader.speech_state(), PlaybackState::Idle);
    assert!(!reader.resume_speech().unwrap());
}

#[test]
fn zoom_is_only_for_pdfs() {
    let fx = fixture();
    let txt = fx.file("plain.txt", b"text");
    let pdf = fx.file("report.pdf", b"%PDF-1.4 fake");
    let mut reader = fx.reader(offline_settings());

    reader.open(&txt).unwrap();
    assert!(matches!(reader.zoom_in(), Err(ReaderError::Invalid(_))));

    reader.open(&pdf).unwrap();
    assert_eq!(reader.zoom_in().unwrap(), 1.75);
    assert_eq!(reader.zoom_out().unwrap(), 1.5);
}

#[test]
fn pages_can_be_exported() {
    let fx = fixture();
    let pdf = fx.file("report.pdf", b"%PDF-1.4 fake");
    let mut reader = fx.reader(offline_settings());
    reader.open(&pdf).unwrap();

    let out = fx.dir.path().join("pages");
    let written = reader.export_pages(&out).unwrap();
    assert_eq!(written.len(), 10);
    assert_eq!(fs::read(out.join("page-003.png")).unwrap(), b"page 3");
}
