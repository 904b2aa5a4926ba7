mod common;

use std::time::Duration;

use common::{fixture, offline_settings};
use readhelper::ReaderError;
use readhelper::extraction::{ExtractionOutcome, NO_TEXT_DETECTED};
use readhelper::pdf::{DisplayRect, SelectionPoint};

fn point(page: usize, x: f32, y: f32) -> SelectionPoint {
    SelectionPoint { page, x, y }
}

#[test]
fn region_falls_back_to_text_layer() {
    let fx = fixture();
    let pdf = fx.file("report.pdf", b"%PDF-1.4 fake");
    let mut reader = fx.reader(offline_settings());
    reader.open(&pdf).unwrap();
    reader.set_extract_mode(true).unwrap();

    // display pixels at zoom 1.5; document rect is x 90..200, y 80..110
    reader.begin_region(point(1, 135.0, 120.0)).unwrap();
    reader.drag_region(point(1, 300.0, 165.0));
    let outcome = reader.finish_region().unwrap();

    let ExtractionOutcome::Extracted(record) = outcome else {
        panic!("expected a record, got {outcome:?}");
    };
    assert_eq!(record.text, "Total: 42");
    assert_eq!(record.page, 1);
    assert_eq!(record.rect.x, 90.0);
    assert_eq!(record.rect.y, 80.0);

    let markers = reader.session().extractions().markers();
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].number, 1);
    assert_eq!((markers[0].x, markers[0].y), (135.0, 120.0));
    assert_eq!(reader.extraction_text(None).unwrap(), "Total: 42");
    reader.wait_for_pages(Duration::from_secs(10));
}

#[test]
fn empty_region_reports_no_text() {
    let fx = fixture();
    let pdf = fx.file("report.pdf", b"%PDF-1.4 fake");
    let mut reader = fx.reader(offline_settings());
    reader.open(&pdf).unwrap();
    reader.set_extract_mode(true).unwrap();

    let outcome = reader
        .extract_region(2, DisplayRect::new(0.0, 0.0, 400.0, 400.0))
        .unwrap();
    assert_eq!(outcome, ExtractionOutcome::NoText);
    assert_eq!(outcome.message(), Some(NO_TEXT_DETECTED));
    assert!(reader.extractions().is_empty());
}

#[test]
fn tiny_drag_is_discarded() {
    let fx = fixture();
    let pdf = fx.file("report.pdf", b"%PDF-1.4 fake");
    let mut reader = fx.reader(offline_settings());
    reader.open(&pdf).unwrap();
    reader.set_extract_mode(true).unwrap();

    reader.begin_region(point(1, 135.0, 120.0)).unwrap();
    reader.drag_region(point(1, 140.0, 300.0));
    assert_eq!(reader.finish_region().unwrap(), ExtractionOutcome::TooSmall);
    assert!(reader.extractions().is_empty());
}

#[test]
fn newest_extraction_comes_first_and_can_be_deleted() {
    let fx = fixture();
    let pdf = fx.file("report.pdf", b"%PDF-1.4 fake");
    let mut reader = fx.reader(offline_settings());
    reader.open(&pdf).unwrap();
    reader.set_extract_mode(true).unwrap();

    let rect = DisplayRect::new(135.0, 120.0, 165.0, 45.0);
    reader.extract_region(1, rect).unwrap();
    reader.extract_region(1, rect).unwrap();
    let ids: Vec<u64> = reader.extractions().iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids[0] > ids[1]);
    assert_eq!(reader.extraction_text(None).unwrap(), "Total: 42\n\nTotal: 42");

    reader.delete_extraction(ids[0]).unwrap();
    assert_eq!(reader.extractions().len(), 1);
    assert!(matches!(
        reader.delete_extraction(ids[0]),
        Err(ReaderError::Invalid(_))
    ));
}

#[test]
fn extraction_needs_mode_and_a_pdf() {
    let fx = fixture();
    let pdf = fx.file("report.pdf", b"%PDF-1.4 fake");
    let txt = fx.file("plain.txt", b"hello");
    let mut reader = fx.reader(offline_settings());

    reader.open(&pdf).unwrap();
    let rect = DisplayRect::new(135.0, 120.0, 165.0, 45.0);
    assert!(matches!(
        reader.extract_region(1, rect),
        Err(ReaderError::Invalid(_))
    ));
    reader.set_extract_mode(true).unwrap();
    assert!(matches!(
        reader.extract_region(11, rect),
        Err(ReaderError::Invalid(_))
    ));

    reader.open(&txt).unwrap();
    assert!(!reader.session().extract_mode());
    assert!(reader.set_extract_mode(true).is_err());
}

#[test]
fn switching_documents_drops_extractions() {
    let fx = fixture();
    let first = fx.file("first.pdf", b"%PDF-1.4 fake");
    let second = fx.file("second.pdf", b"%PDF-1.4 fake");
    let mut reader = fx.reader(offline_settings());

    reader.open(&first).unwrap();
    reader.set_extract_mode(true).unwrap();
    reader
        .extract_region(1, DisplayRect::new(135.0, 120.0, 165.0, 45.0))
        .unwrap();
    assert_eq!(reader.extractions().len(), 1);

    reader.open(&second).unwrap();
    assert!(reader.extractions().is_empty());
    assert!(reader.session().extractions().markers().is_empty());
}
