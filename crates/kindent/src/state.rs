//
// state.rs
//

use std::collections::HashMap;

use ropey::Rope;
use tower_lsp::lsp_types::{TextDocumentContentChangeEvent, Url};

use crate::indentation::{IndentationConfig, SourceKind};
use crate::utf16::utf16_column_to_char_offset;

/// An open document, kept as a rope so incremental edits stay cheap.
#[derive(Debug, Clone)]
pub struct Document {
    pub contents: Rope,
    pub version: Option<i32>,
    pub source_kind: SourceKind,
}

impl Document {
    pub fn new(text: &str, version: Option<i32>, source_kind: SourceKind) -> Self {
        Self {
            contents: Rope::from_str(text),
            version,
            source_kind,
        }
    }

    pub fn apply_change(&mut self, change: TextDocumentContentChangeEvent) {
        let Some(range) = change.range else {
            // Full document sync
            self.contents = Rope::from_str(&change.text);
            return;
        };

        let start_idx = self.char_index(range.start.line, range.start.character);
        let end_idx = self.char_index(range.end.line, range.end.character);
        if start_idx > end_idx {
            log::warn!("Ignoring change with inverted range {:?}", range);
            return;
        }
        self.contents.remove(start_idx..end_idx);
        self.contents.insert(start_idx, &change.text);
    }

    /// Char index of an LSP position, clamped to the document.
    fn char_index(&self, line: u32, utf16_col: u32) -> usize {
        let line = line as usize;
        if line >= self.contents.len_lines() {
            return self.contents.len_chars();
        }
        let line_text = self.contents.line(line).to_string();
        let within = utf16_column_to_char_offset(&line_text, utf16_col);
        self.contents.line_to_char(line) + within
    }

    pub fn text(&self) -> String {
        self.contents.to_string()
    }
}

/// Whether a document URI names a Kotlin script.
pub fn source_kind_for(uri: &Url) -> SourceKind {
    if uri.path().ends_with(".kts") {
        SourceKind::Script
    } else {
        SourceKind::File
    }
}

/// Server-wide state shared by the LSP handlers.
#[derive(Debug, Default)]
pub struct WorldState {
    pub documents: HashMap<Url, Document>,
    pub config: IndentationConfig,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_document(&mut self, uri: Url, text: &str, version: Option<i32>) {
        let kind = source_kind_for(&uri);
        self.documents.insert(uri, Document::new(text, version, kind));
    }

    pub fn apply_change(&mut self, uri: &Url, change: TextDocumentContentChangeEvent) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.apply_change(change);
        }
    }

    pub fn set_version(&mut self, uri: &Url, version: i32) {
        if let Some(doc) = self.documents.get_mut(uri) {
            doc.version = Some(version);
        }
    }

    pub fn close_document(&mut self, uri: &Url) {
        self.documents.remove(uri);
    }

    pub fn get_document(&self, uri: &Url) -> Option<&Document> {
        self.documents.get(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::{Position, Range};

    fn change(start: (u32, u32), end: (u32, u32), text: &str) -> TextDocumentContentChangeEvent {
        TextDocumentContentChangeEvent {
            range: Some(Range {
                start: Position::new(start.0, start.1),
                end: Position::new(end.0, end.1),
            }),
            range_length: None,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_incremental_insert_newline() {
        let mut doc = Document::new("fun a() {}", Some(1), SourceKind::File);
        doc.apply_change(change((0, 9), (0, 9), "\n"));
        assert_eq!(doc.text(), "fun a() {\n}");
    }

    #[test]
    fn test_incremental_replace_across_lines() {
        let mut doc = Document::new("val a = 1\nval b = 2\n", None, SourceKind::File);
        doc.apply_change(change((0, 8), (1, 8), "3"));
        assert_eq!(doc.text(), "val a = 32\n");
    }

    #[test]
    fn test_utf16_positions_after_emoji() {
        let mut doc = Document::new("val s = \"\u{1F600}\"", None, SourceKind::File);
        doc.apply_change(change((0, 11), (0, 11), "!"));
        assert_eq!(doc.text(), "val s = \"\u{1F600}!\"");
    }

    #[test]
    fn test_full_sync_replaces_text() {
        let mut doc = Document::new("old", None, SourceKind::File);
        doc.apply_change(TextDocumentContentChangeEvent {
            range: None,
            range_length: None,
            text: "new".to_string(),
        });
        assert_eq!(doc.text(), "new");
    }

    #[test]
    fn test_change_past_end_appends() {
        let mut doc = Document::new("a", None, SourceKind::File);
        doc.apply_change(change((5, 0), (5, 0), "b"));
        assert_eq!(doc.text(), "ab");
    }

    #[test]
    fn test_script_uris() {
        let script = Url::parse("file:///build.gradle.kts").unwrap();
        let file = Url::parse("file:///src/Main.kt").unwrap();
        assert_eq!(source_kind_for(&script), SourceKind::Script);
        assert_eq!(source_kind_for(&file), SourceKind::File);

        let mut state = WorldState::new();
        state.open_document(script.clone(), "println(1)", Some(1));
        assert_eq!(
            state.get_document(&script).map(|d| d.source_kind),
            Some(SourceKind::Script)
        );
        state.close_document(&script);
        assert!(state.get_document(&script).is_none());
    }
}
