use chrono::{DateTime, Utc};

use crate::pdf::{DisplayRect, DocRect};

/// Text captured from one PDF region during the current session
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRecord {
    pub id: u64,
    pub page: usize,
    pub text: String,
    pub rect: DocRect,
    pub captured_at: DateTime<Utc>,
}

/// Numbered overlay drawn where a region was captured
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub record_id: u64,
    pub number: usize,
    pub page: usize,
    pub x: f32,
    pub y: f32,
}

/// Session list of extraction records, newest first, with their markers
#[derive(Debug, Default)]
pub struct ExtractionLog {
    records: Vec<ExtractionRecord>,
    markers: Vec<Marker>,
    next_id: u64,
}

impl ExtractionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a record and place its marker at the display position
    pub fn push(
        &mut self,
        page: usize,
        text: String,
        rect: DocRect,
        display: DisplayRect,
    ) -> &ExtractionRecord {
        self.next_id += 1;
        let id = self.next_id;
        self.markers.push(Marker {
            record_id: id,
            number: self.markers.len() + 1,
            page,
            x: display.x,
            y: display.y,
        });
        self.records.insert(
            0,
            ExtractionRecord {
                id,
                page,
                text,
                rect,
                captured_at: Utc::now(),
            },
        );
        &self.records[0]
    }

    pub fn records(&self) -> &[ExtractionRecord] {
        &self.records
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, id: u64) -> Option<&ExtractionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Remove a record and its marker; the remaining markers are renumbered
    pub fn remove(&mut self, id: u64) -> Option<ExtractionRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        let record = self.records.remove(idx);
        self.markers.retain(|m| m.record_id != id);
        for (i, marker) in self.markers.iter_mut().enumerate() {
            marker.number = i + 1;
        }
        Some(record)
    }

    /// All record texts, newest first, separated by blank lines
    pub fn joined_text(&self) -> String {
        self.records
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.markers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> (DocRect, DisplayRect) {
        let display = DisplayRect::new(15.0, 30.0, 150.0, 60.0);
        (display.to_document(1.5), display)
    }

    #[test]
    fn records_are_prepended_with_numbered_markers() {
        let mut log = ExtractionLog::new();
        let (doc, display) = rect();
        log.push(1, "first".into(), doc, display);
        log.push(2, "second".into(), doc, display);

        let texts: Vec<_> = log.records().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
        let numbers: Vec<_> = log.markers().iter().map(|m| m.number).collect();
        assert_eq!(numbers, [1, 2]);
        assert_eq!(log.markers()[1].page, 2);
        assert_eq!(log.joined_text(), "second\n\nfirst");
    }

    #[test]
    fn remove_renumbers_markers() {
        let mut log = ExtractionLog::new();
        let (doc, display) = rect();
        let first = log.push(1, "a".into(), doc, display).id;
        log.push(1, "b".into(), doc, display);

        assert!(log.remove(first).is_some());
        assert_eq!(log.len(), 1);
        assert_eq!(log.markers()[0].number, 1);
        assert!(log.remove(first).is_none());
    }

    #[test]
    fn clear_drops_everything() {
        let mut log = ExtractionLog::new();
        let (doc, display) = rect();
        log.push(1, "a".into(), doc, display);
        log.clear();
        assert!(log.is_empty());
        assert!(log.markers().is_empty());
    }
}
