mod common;

use std::io::Cursor;

use common::{fixture, offline_settings};
use readhelper::shell::{self, Step};

fn output(step: Step) -> String {
    match step {
        Step::Output(text) => text,
        Step::Quit => panic!("unexpected quit"),
    }
}

#[test]
fn script_drives_a_pdf_session() {
    let fx = fixture();
    let pdf = fx.file("report.pdf", b"%PDF-1.4 fake");
    let mut reader = fx.reader(offline_settings());

    let script = format!(
        "open \"{}\"\nextract-mode on\nregion 1 135 120 165 45\nextractions list\nzoom in\nstatus\nquit\nstatus\n",
        pdf.display()
    );
    let mut out = Vec::new();
    shell::run(&mut reader, Cursor::new(script), &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("report.pdf [pdf], 10 pages at 150%"));
    assert!(out.contains("Extraction mode on"));
    assert!(out.contains("Total: 42"));
    assert!(out.contains("#1 page 1 at (90, 80) 110x30"));
    assert!(out.contains("Zoom 175%"));
    assert!(out.contains("extractions: 1, extract mode: on"));
    // nothing after quit runs
    assert_eq!(out.matches("extract mode:").count(), 1);
}

#[test]
fn errors_do_not_end_the_shell() {
    let fx = fixture();
    let mut reader = fx.reader(offline_settings());

    let out = output(shell::execute(&mut reader, "notes add hello"));
    assert!(out.starts_with("error: "));
    let out = output(shell::execute(&mut reader, "frobnicate"));
    assert!(out.contains("frobnicate"));
    let out = output(shell::execute(&mut reader, "open \"unterminated"));
    assert_eq!(out, "error: unbalanced quotes");
    assert_eq!(output(shell::execute(&mut reader, "   ")), "");
    assert_eq!(shell::execute(&mut reader, "exit"), Step::Quit);
}

#[test]
fn notes_and_bookmarks_from_the_shell() {
    let fx = fixture();
    let txt = fx.file("plain.txt", b"some text to read");
    let mut reader = fx.reader(offline_settings());

    output(shell::execute(&mut reader, &format!("open '{}'", txt.display())));
    let added = output(shell::execute(
        &mut reader,
        "notes add --excerpt 'some text' a thought",
    ));
    assert!(added.starts_with("Added note "));
    let listed = output(shell::execute(&mut reader, "notes"));
    assert!(listed.contains("  > some text\n"));
    assert!(listed.contains("  a thought\n"));

    let added = output(shell::execute(&mut reader, "bookmarks add"));
    assert!(added.ends_with("\"Bookmark 1\""));
    let listed = output(shell::execute(&mut reader, "bookmarks list"));
    assert!(listed.contains("Bookmark 1 (offset 0,"));

    let history = output(shell::execute(&mut reader, "history"));
    assert!(history.starts_with(" 1. plain.txt [txt]"));
}
