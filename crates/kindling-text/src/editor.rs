//! Text editor state machine: buffer, cursor, selection, edit operations.
//!
//! The buffer is a sequence of Unicode codepoints organized into lines by
//! `\n`. The cursor is a (row, column) pair in codepoint units, always
//! clamped to a valid position in the current text; clamping is silent and
//! never an error. The selection is an anchor plus the cursor; both
//! orderings are normalized at read time.
//!
//! Every mutating operation records an [`EditRecord`](crate::history) so the
//! widget layer gets uniform undo/redo behavior regardless of whether an
//! edit came from a key press, a paste, or a programmatic call.

use crate::history::{EditKind, EditRecord, History, end_of_span};

/// A position in the buffer: row index and column in codepoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

impl Cursor {
    pub fn new(row: usize, col: usize) -> Self {
        Cursor { row, col }
    }
}

pub struct TextEditor {
    /// Always at least one (possibly empty) line.
    lines: Vec<Vec<char>>,
    cursor: Cursor,
    /// Selection anchor. A selection exists while this is set and differs
    /// from the cursor.
    anchor: Option<Cursor>,
    history: History,
    /// Rows moved by one PageUp/PageDown. The owning widget sets this from
    /// its viewport; the default is larger than any document, which makes
    /// page movement land on the buffer start/end.
    page_rows: usize,
}

fn split_lines(text: &str) -> Vec<Vec<char>> {
    text.split('\n').map(|line| line.chars().collect()).collect()
}

impl TextEditor {
    pub fn new() -> Self {
        Self::with_text("")
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            lines: split_lines(text),
            cursor: Cursor::default(),
            anchor: None,
            history: History::new(),
            page_rows: usize::MAX,
        }
    }

    // ---- inspection ----

    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.extend(line.iter());
        }
        out
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, Vec::len)
    }

    pub fn line(&self, row: usize) -> String {
        self.lines.get(row).map_or_else(String::new, |l| l.iter().collect())
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn end_cursor(&self) -> Cursor {
        let row = self.lines.len() - 1;
        Cursor::new(row, self.lines[row].len())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn set_page_rows(&mut self, rows: usize) {
        self.page_rows = rows.max(1);
    }

    // ---- selection ----

    pub fn has_selection(&self) -> bool {
        self.anchor.is_some_and(|a| a != self.cursor)
    }

    /// The selected span normalized to start <= end, or None when empty.
    pub fn selection_range(&self) -> Option<(Cursor, Cursor)> {
        let anchor = self.anchor?;
        if anchor == self.cursor {
            return None;
        }
        if anchor < self.cursor {
            Some((anchor, self.cursor))
        } else {
            Some((self.cursor, anchor))
        }
    }

    pub fn selected_text(&self) -> String {
        match self.selection_range() {
            Some((start, end)) => self.text_in_range(start, end),
            None => String::new(),
        }
    }

    pub fn select(&mut self, from: Cursor, to: Cursor) {
        self.history.seal();
        self.anchor = Some(self.clamp(from));
        self.cursor = self.clamp(to);
    }

    pub fn select_all(&mut self) {
        let end = self.end_cursor();
        self.select(Cursor::default(), end);
    }

    pub fn clear_selection(&mut self) {
        self.anchor = None;
    }

    // ---- cursor ----

    pub fn set_cursor(&mut self, row: usize, col: usize) {
        self.history.seal();
        self.cursor = self.clamp(Cursor::new(row, col));
        self.anchor = None;
    }

    pub fn move_left(&mut self, select: bool) {
        self.history.seal();
        if !select {
            // Collapsing a selection snaps to its start without extra motion.
            if let Some((start, _)) = self.selection_range() {
                self.cursor = start;
                self.anchor = None;
                return;
            }
            self.anchor = None;
        } else {
            self.ensure_anchor();
        }
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
            self.cursor.col = self.line_len(self.cursor.row);
        }
    }

    pub fn move_right(&mut self, select: bool) {
        self.history.seal();
        if !select {
            if let Some((_, end)) = self.selection_range() {
                self.cursor = end;
                self.anchor = None;
                return;
            }
            self.anchor = None;
        } else {
            self.ensure_anchor();
        }
        if self.cursor.col < self.line_len(self.cursor.row) {
            self.cursor.col += 1;
        } else if self.cursor.row + 1 < self.lines.len() {
            self.cursor.row += 1;
            self.cursor.col = 0;
        }
    }

    pub fn move_up(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        if self.cursor.row == 0 {
            self.cursor.col = 0;
        } else {
            self.cursor.row -= 1;
            self.cursor.col = self.cursor.col.min(self.line_len(self.cursor.row));
        }
    }

    pub fn move_down(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        if self.cursor.row + 1 >= self.lines.len() {
            self.cursor.col = self.line_len(self.cursor.row);
        } else {
            self.cursor.row += 1;
            self.cursor.col = self.cursor.col.min(self.line_len(self.cursor.row));
        }
    }

    pub fn move_word_left(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        if self.cursor.col == 0 {
            if self.cursor.row > 0 {
                self.cursor.row -= 1;
                self.cursor.col = self.line_len(self.cursor.row);
            }
            return;
        }
        let line = &self.lines[self.cursor.row];
        self.cursor.col = word_boundary_left(line, self.cursor.col);
    }

    pub fn move_word_right(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        if self.cursor.col == self.line_len(self.cursor.row) {
            if self.cursor.row + 1 < self.lines.len() {
                self.cursor.row += 1;
                self.cursor.col = 0;
            }
            return;
        }
        let line = &self.lines[self.cursor.row];
        self.cursor.col = word_boundary_right(line, self.cursor.col);
    }

    pub fn line_start(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        self.cursor.col = 0;
    }

    pub fn line_end(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        self.cursor.col = self.line_len(self.cursor.row);
    }

    pub fn doc_start(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        self.cursor = Cursor::default();
    }

    pub fn doc_end(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        self.cursor = self.end_cursor();
    }

    pub fn page_up(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        if self.page_rows > self.cursor.row {
            self.cursor = Cursor::default();
        } else {
            self.cursor.row -= self.page_rows;
            self.cursor.col = self.cursor.col.min(self.line_len(self.cursor.row));
        }
    }

    pub fn page_down(&mut self, select: bool) {
        self.history.seal();
        self.prepare_vertical(select);
        let last = self.lines.len() - 1;
        if self.cursor.row.saturating_add(self.page_rows) > last {
            self.cursor = self.end_cursor();
        } else {
            self.cursor.row += self.page_rows;
            self.cursor.col = self.cursor.col.min(self.line_len(self.cursor.row));
        }
    }

    // ---- edits ----

    /// Replace the whole content. This is a reset point: the cursor is
    /// re-clamped (row preserved while still valid), the selection is
    /// dropped, and the undo/redo history is cleared. Returns whether the
    /// text actually changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        let new_lines = split_lines(text);
        let changed = new_lines != self.lines;
        self.lines = new_lines;
        self.cursor = self.clamp(self.cursor);
        self.anchor = None;
        self.history.clear();
        changed
    }

    /// Insert a single typed codepoint, replacing the selection if one is
    /// active. Plain insertions coalesce into the open typing record;
    /// replacing a selection is always its own undo step.
    pub fn insert_rune(&mut self, ch: char) -> bool {
        if ch == '\n' {
            return self.insert_newline();
        }
        let mut buf = [0u8; 4];
        let text: &str = ch.encode_utf8(&mut buf);
        if let Some((start, end)) = self.selection_range() {
            self.apply_edit(EditKind::Replace, start, end, text)
        } else {
            let at = self.cursor;
            self.apply_edit(EditKind::Typing, at, at, text)
        }
    }

    /// Insert a line break (its own undo record, never coalesced).
    pub fn insert_newline(&mut self) -> bool {
        let (start, end) = self
            .selection_range()
            .unwrap_or((self.cursor, self.cursor));
        self.apply_edit(EditKind::Newline, start, end, "\n")
    }

    /// Bulk insertion (paste or programmatic append): one undo record,
    /// replacing the selection if any.
    pub fn insert_text(&mut self, text: &str) -> bool {
        let (start, end) = self
            .selection_range()
            .unwrap_or((self.cursor, self.cursor));
        self.apply_edit(EditKind::Paste, start, end, text)
    }

    pub fn backspace(&mut self) -> bool {
        if let Some((start, end)) = self.selection_range() {
            return self.apply_edit(EditKind::Replace, start, end, "");
        }
        let c = self.cursor;
        if c.col == 0 {
            if c.row == 0 {
                self.anchor = None;
                return false;
            }
            let start = Cursor::new(c.row - 1, self.line_len(c.row - 1));
            self.apply_edit(EditKind::DeleteBackward, start, c, "")
        } else {
            self.apply_edit(EditKind::DeleteBackward, Cursor::new(c.row, c.col - 1), c, "")
        }
    }

    pub fn delete_forward(&mut self) -> bool {
        if let Some((start, end)) = self.selection_range() {
            return self.apply_edit(EditKind::Replace, start, end, "");
        }
        let c = self.cursor;
        if c.col == self.line_len(c.row) {
            if c.row + 1 >= self.lines.len() {
                self.anchor = None;
                return false;
            }
            self.apply_edit(EditKind::DeleteForward, c, Cursor::new(c.row + 1, 0), "")
        } else {
            self.apply_edit(EditKind::DeleteForward, c, Cursor::new(c.row, c.col + 1), "")
        }
    }

    /// Delete from the cursor back to the previous word boundary as a single
    /// record. At column zero this degrades to a line merge.
    pub fn delete_word_backward(&mut self) -> bool {
        if let Some((start, end)) = self.selection_range() {
            return self.apply_edit(EditKind::Replace, start, end, "");
        }
        let c = self.cursor;
        if c.col == 0 {
            if c.row == 0 {
                return false;
            }
            let start = Cursor::new(c.row - 1, self.line_len(c.row - 1));
            return self.apply_edit(EditKind::DeleteWord, start, c, "");
        }
        let boundary = word_boundary_left(&self.lines[c.row], c.col);
        self.apply_edit(EditKind::DeleteWord, Cursor::new(c.row, boundary), c, "")
    }

    /// Delete from the cursor forward to the next word boundary as a single
    /// record. At end of line this degrades to a line merge.
    pub fn delete_word_forward(&mut self) -> bool {
        if let Some((start, end)) = self.selection_range() {
            return self.apply_edit(EditKind::Replace, start, end, "");
        }
        let c = self.cursor;
        if c.col == self.line_len(c.row) {
            if c.row + 1 >= self.lines.len() {
                return false;
            }
            return self.apply_edit(EditKind::DeleteWord, c, Cursor::new(c.row + 1, 0), "");
        }
        let boundary = word_boundary_right(&self.lines[c.row], c.col);
        self.apply_edit(EditKind::DeleteWord, c, Cursor::new(c.row, boundary), "")
    }

    /// Delete the active selection as its own undo record (the Cut path).
    pub fn delete_selection(&mut self) -> bool {
        match self.selection_range() {
            Some((start, end)) => self.apply_edit(EditKind::Replace, start, end, ""),
            None => false,
        }
    }

    // ---- history ----

    pub fn undo(&mut self) -> bool {
        let Some(record) = self.history.pop_undo() else {
            return false;
        };
        let end = end_of_span(record.start, &record.inserted);
        self.splice_raw(record.start, end, &record.deleted);
        self.cursor = self.clamp(record.cursor_before);
        self.anchor = record.anchor_before.map(|a| self.clamp(a));
        tracing::trace!(kind = ?record.kind, "undo");
        self.history.push_redone(record);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.history.pop_redo() else {
            return false;
        };
        let end = end_of_span(record.start, &record.deleted);
        self.splice_raw(record.start, end, &record.inserted);
        self.cursor = self.clamp(record.cursor_after);
        self.anchor = None;
        tracing::trace!(kind = ?record.kind, "redo");
        self.history.push_reapplied(record);
        true
    }

    // ---- internals ----

    fn ensure_anchor(&mut self) {
        if self.anchor.is_none() {
            self.anchor = Some(self.cursor);
        }
    }

    fn prepare_vertical(&mut self, select: bool) {
        if select {
            self.ensure_anchor();
        } else {
            self.anchor = None;
        }
    }

    fn clamp(&self, c: Cursor) -> Cursor {
        let row = c.row.min(self.lines.len() - 1);
        Cursor::new(row, c.col.min(self.lines[row].len()))
    }

    fn text_in_range(&self, start: Cursor, end: Cursor) -> String {
        if start.row == end.row {
            return self.lines[start.row][start.col..end.col].iter().collect();
        }
        let mut out: String = self.lines[start.row][start.col..].iter().collect();
        for row in start.row + 1..end.row {
            out.push('\n');
            out.extend(self.lines[row].iter());
        }
        out.push('\n');
        out.extend(self.lines[end.row][..end.col].iter());
        out
    }

    /// Textual splice with no history bookkeeping. Removes `start..end`,
    /// inserts `replacement`, and leaves the cursor after the insertion.
    fn splice_raw(&mut self, start: Cursor, end: Cursor, replacement: &str) -> String {
        let start = self.clamp(start);
        let end = self.clamp(end).max(start);

        let deleted = self.text_in_range(start, end);
        if start.row == end.row {
            self.lines[start.row].drain(start.col..end.col);
        } else {
            let tail: Vec<char> = self.lines[end.row][end.col..].to_vec();
            self.lines[start.row].truncate(start.col);
            self.lines[start.row].extend(tail);
            self.lines.drain(start.row + 1..=end.row);
        }

        let mut row = start.row;
        let mut col = start.col;
        for ch in replacement.chars() {
            if ch == '\n' {
                let rest = self.lines[row].split_off(col);
                self.lines.insert(row + 1, rest);
                row += 1;
                col = 0;
            } else {
                self.lines[row].insert(col, ch);
                col += 1;
            }
        }
        self.cursor = Cursor::new(row, col);
        deleted
    }

    fn apply_edit(&mut self, kind: EditKind, start: Cursor, end: Cursor, replacement: &str) -> bool {
        let cursor_before = self.cursor;
        let anchor_before = self.anchor;
        let deleted = self.splice_raw(start, end, replacement);
        if deleted.is_empty() && replacement.is_empty() {
            self.cursor = cursor_before;
            return false;
        }
        let record = EditRecord {
            kind,
            start,
            deleted,
            inserted: replacement.to_string(),
            cursor_before,
            anchor_before,
            cursor_after: self.cursor,
        };
        self.anchor = None;
        self.history.push(record);
        true
    }
}

impl Default for TextEditor {
    fn default() -> Self {
        Self::new()
    }
}

/// Previous word boundary within a line: from `col`, skip the adjacent
/// whitespace run, then the adjacent non-whitespace run.
fn word_boundary_left(line: &[char], col: usize) -> usize {
    let mut pos = col.min(line.len());
    while pos > 0 && line[pos - 1].is_whitespace() {
        pos -= 1;
    }
    while pos > 0 && !line[pos - 1].is_whitespace() {
        pos -= 1;
    }
    pos
}

/// Next word boundary within a line, symmetric to [`word_boundary_left`].
fn word_boundary_right(line: &[char], col: usize) -> usize {
    let mut pos = col.min(line.len());
    while pos < line.len() && line[pos].is_whitespace() {
        pos += 1;
    }
    while pos < line.len() && !line[pos].is_whitespace() {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(editor: &mut TextEditor, text: &str) {
        for ch in text.chars() {
            editor.insert_rune(ch);
        }
    }

    #[test]
    fn test_empty_editor() {
        let editor = TextEditor::new();
        assert_eq!(editor.text(), "");
        assert_eq!(editor.line_count(), 1);
        assert_eq!(editor.cursor(), Cursor::new(0, 0));
    }

    #[test]
    fn test_cursor_column_clamps_at_edges() {
        let mut editor = TextEditor::new();
        editor.move_right(false);
        assert_eq!(editor.cursor().col, 0);

        editor.set_text("a");
        editor.move_right(false);
        assert_eq!(editor.cursor().col, 1);
        editor.move_left(false);
        assert_eq!(editor.cursor().col, 0);
        editor.move_left(false);
        assert_eq!(editor.cursor().col, 0);
    }

    #[test]
    fn test_vertical_moves_snap_at_document_edges() {
        let mut editor = TextEditor::with_text("Hello");
        editor.move_down(false);
        assert_eq!(editor.cursor(), Cursor::new(0, 5));
        editor.move_up(false);
        assert_eq!(editor.cursor(), Cursor::new(0, 0));
    }

    #[test]
    fn test_vertical_move_clamps_to_shorter_line() {
        let mut editor = TextEditor::with_text("a\nbc");
        for _ in 0..4 {
            editor.move_right(false);
        }
        assert_eq!(editor.cursor(), Cursor::new(1, 2));
        editor.move_up(false);
        assert_eq!(editor.cursor(), Cursor::new(0, 1));
    }

    #[test]
    fn test_horizontal_wrap_across_lines() {
        let mut editor = TextEditor::with_text("a\nb");
        editor.move_right(false);
        assert_eq!(editor.cursor(), Cursor::new(0, 1));
        editor.move_right(false);
        assert_eq!(editor.cursor(), Cursor::new(1, 0));
        editor.move_left(false);
        assert_eq!(editor.cursor(), Cursor::new(0, 1));
    }

    #[test]
    fn test_word_moves() {
        let mut editor = TextEditor::with_text("a\nbc");
        editor.move_word_right(false);
        assert_eq!(editor.cursor(), Cursor::new(0, 1));
        editor.move_word_right(false);
        assert_eq!(editor.cursor(), Cursor::new(1, 0));
        editor.move_word_right(false);
        assert_eq!(editor.cursor(), Cursor::new(1, 2));

        editor.move_word_left(false);
        assert_eq!(editor.cursor(), Cursor::new(1, 0));
        editor.move_word_left(false);
        assert_eq!(editor.cursor(), Cursor::new(0, 1));
    }

    #[test]
    fn test_word_select_extends() {
        let mut editor = TextEditor::with_text("word1 word2 word3");
        editor.set_cursor(0, 3);
        editor.move_word_right(true);
        assert_eq!(editor.selected_text(), "d1");
        editor.move_word_right(true);
        assert_eq!(editor.selected_text(), "d1 word2");
        editor.move_word_right(false);
        assert_eq!(editor.selected_text(), "");
    }

    #[test]
    fn test_insert_and_backspace_unicode() {
        let mut editor = TextEditor::new();
        type_str(&mut editor, "Hello 世界");
        editor.insert_rune('!');
        assert_eq!(editor.text(), "Hello 世界!");
        editor.backspace();
        editor.backspace();
        assert_eq!(editor.text(), "Hello 世");
    }

    #[test]
    fn test_backspace_merges_lines() {
        let mut editor = TextEditor::with_text("H\ni");
        editor.move_down(false);
        editor.line_start(false);
        editor.backspace();
        assert_eq!(editor.text(), "Hi");
        assert_eq!(editor.cursor(), Cursor::new(0, 1));
    }

    #[test]
    fn test_delete_forward_merges_lines() {
        let mut editor = TextEditor::with_text("H\ni");
        editor.set_cursor(0, 1);
        editor.delete_forward();
        assert_eq!(editor.text(), "Hi");
    }

    #[test]
    fn test_delete_at_buffer_edges_is_noop() {
        let mut editor = TextEditor::with_text("Hi");
        assert!(!editor.backspace());
        editor.doc_end(false);
        assert!(!editor.delete_forward());
        assert_eq!(editor.text(), "Hi");
    }

    #[test]
    fn test_selection_normalization() {
        let mut forward = TextEditor::with_text("Testing");
        forward.select(Cursor::new(0, 2), Cursor::new(0, 5));
        let mut backward = TextEditor::with_text("Testing");
        backward.select(Cursor::new(0, 5), Cursor::new(0, 2));
        assert_eq!(forward.selected_text(), "sti");
        assert_eq!(backward.selected_text(), forward.selected_text());
    }

    #[test]
    fn test_selection_snap_left_right() {
        let mut editor = TextEditor::with_text("Testing\nTesting\nTesting");
        editor.select(Cursor::new(1, 2), Cursor::new(1, 5));

        editor.move_left(false);
        assert_eq!(editor.cursor(), Cursor::new(1, 2));
        assert_eq!(editor.selected_text(), "");

        editor.select(Cursor::new(1, 2), Cursor::new(1, 5));
        editor.move_right(false);
        assert_eq!(editor.cursor(), Cursor::new(1, 5));
        assert_eq!(editor.selected_text(), "");
    }

    #[test]
    fn test_selection_snap_up_down_move() {
        let mut editor = TextEditor::with_text("Testing\nTesting\nTesting");
        editor.select(Cursor::new(1, 2), Cursor::new(1, 5));
        editor.move_down(false);
        assert_eq!(editor.cursor(), Cursor::new(2, 5));
        assert_eq!(editor.selected_text(), "");

        editor.select(Cursor::new(1, 2), Cursor::new(1, 5));
        editor.move_up(false);
        assert_eq!(editor.cursor(), Cursor::new(0, 5));
        assert_eq!(editor.selected_text(), "");
    }

    #[test]
    fn test_selection_collapse_at_anchor_keeps_anchor() {
        let mut editor = TextEditor::with_text("text");
        editor.set_cursor(0, 0);
        editor.move_right(true);
        editor.move_left(true);
        assert_eq!(editor.selected_text(), "");
        assert_eq!(editor.cursor().col, 0);
        editor.move_right(true);
        assert_eq!(editor.selected_text(), "t");
    }

    #[test]
    fn test_multiline_selection_grow_and_shrink() {
        let mut editor = TextEditor::with_text("Testing\nTesting\nTesting");
        editor.select(Cursor::new(1, 2), Cursor::new(1, 5));
        editor.move_down(true);
        assert_eq!(editor.selected_text(), "sting\nTesti");
        editor.move_up(true);
        assert_eq!(editor.selected_text(), "sti");
        editor.move_up(true);
        assert_eq!(editor.selected_text(), "ng\nTe");
    }

    #[test]
    fn test_home_end_selection() {
        let mut editor = TextEditor::with_text("Testing");
        editor.select(Cursor::new(0, 2), Cursor::new(0, 5));
        editor.line_end(true);
        assert_eq!(editor.selected_text(), "sting");
        editor.line_start(true);
        assert_eq!(editor.selected_text(), "Te");
    }

    #[test]
    fn test_page_moves_land_on_document_edges() {
        let mut editor = TextEditor::with_text("Testing\nTesting\nTesting");
        editor.set_cursor(0, 1);
        editor.page_down(false);
        assert_eq!(editor.cursor(), Cursor::new(2, 7));
        editor.page_up(false);
        assert_eq!(editor.cursor(), Cursor::new(0, 0));
    }

    #[test]
    fn test_page_moves_with_small_page() {
        let mut editor = TextEditor::with_text("a\nbb\nccc\ndddd\neeeee");
        editor.set_page_rows(2);
        editor.set_cursor(0, 1);
        editor.page_down(false);
        assert_eq!(editor.cursor(), Cursor::new(2, 1));
        editor.page_down(false);
        assert_eq!(editor.cursor(), Cursor::new(4, 1));
        editor.page_up(false);
        assert_eq!(editor.cursor(), Cursor::new(2, 1));
    }

    #[test]
    fn test_set_text_clamps_cursor() {
        let mut editor = TextEditor::new();
        type_str(&mut editor, "test");
        assert_eq!(editor.cursor().col, 4);
        editor.set_text("x");
        assert_eq!(editor.cursor().col, 1);

        let mut editor = TextEditor::with_text("ab\ncd\nef");
        editor.set_cursor(2, 1);
        editor.set_text("AB\nAAAA");
        assert_eq!(editor.cursor(), Cursor::new(1, 4));
    }

    #[test]
    fn test_set_text_resets_history() {
        let mut editor = TextEditor::new();
        type_str(&mut editor, "abc");
        editor.set_text("fresh");
        assert!(!editor.undo());
        assert_eq!(editor.text(), "fresh");
    }

    #[test]
    fn test_undo_redo_typing_groups_at_whitespace() {
        let mut editor = TextEditor::new();
        assert!(!editor.undo());
        type_str(&mut editor, "abc éàè 123");
        assert_eq!(editor.text(), "abc éàè 123");
        assert!(!editor.redo());

        editor.undo();
        assert_eq!(editor.text(), "abc éàè");
        editor.undo();
        assert_eq!(editor.text(), "abc");
        editor.undo();
        assert_eq!(editor.text(), "");
        assert!(!editor.undo());

        editor.redo();
        assert_eq!(editor.text(), "abc");
        editor.redo();
        assert_eq!(editor.text(), "abc éàè");
        editor.redo();
        assert_eq!(editor.text(), "abc éàè 123");
        assert!(!editor.redo());
    }

    #[test]
    fn test_undo_restores_cursor() {
        let mut editor = TextEditor::new();
        type_str(&mut editor, "abc");
        editor.undo();
        assert_eq!(editor.cursor(), Cursor::new(0, 0));
        editor.redo();
        assert_eq!(editor.cursor(), Cursor::new(0, 3));
    }

    #[test]
    fn test_undo_redo_deletes_group_by_direction() {
        let mut editor = TextEditor::new();
        type_str(&mut editor, "àbcdéf");
        editor.move_left(false);
        editor.move_left(false);
        editor.backspace();
        editor.backspace();
        editor.delete_forward();
        assert_eq!(editor.text(), "àbf");

        editor.undo();
        assert_eq!(editor.text(), "àbéf");
        editor.undo();
        assert_eq!(editor.text(), "àbcdéf");
        editor.redo();
        assert_eq!(editor.text(), "àbéf");
        editor.redo();
        assert_eq!(editor.text(), "àbf");
    }

    #[test]
    fn test_undo_redo_selection_replace_single_step() {
        let mut editor = TextEditor::with_text("Testing");
        editor.select(Cursor::new(0, 2), Cursor::new(0, 5));
        editor.insert_rune('X');
        assert_eq!(editor.text(), "TeXng");
        assert_eq!(editor.cursor(), Cursor::new(0, 3));

        editor.undo();
        assert_eq!(editor.text(), "Testing");
        assert_eq!(editor.selected_text(), "sti");

        editor.redo();
        assert_eq!(editor.text(), "TeXng");
        assert_eq!(editor.cursor(), Cursor::new(0, 3));
    }

    #[test]
    fn test_undo_word_delete() {
        let mut editor = TextEditor::new();
        type_str(&mut editor, "Hello world");
        editor.delete_word_backward();
        assert_eq!(editor.text(), "Hello ");
        editor.undo();
        assert_eq!(editor.text(), "Hello world");
    }

    #[test]
    fn test_word_delete_runs() {
        let mut editor = TextEditor::with_text("Hello world\nhere is a second line");
        editor.set_cursor(1, 10);
        editor.delete_word_forward();
        assert_eq!(editor.text(), "Hello world\nhere is a  line");
        assert_eq!(editor.cursor(), Cursor::new(1, 10));

        editor.set_cursor(1, 8);
        editor.delete_word_backward();
        assert_eq!(editor.text(), "Hello world\nhere a  line");
        assert_eq!(editor.cursor(), Cursor::new(1, 5));
    }

    #[test]
    fn test_word_delete_edge_cases() {
        let mut editor = TextEditor::new();
        assert!(!editor.delete_word_backward());
        assert_eq!(editor.text(), "");

        editor.set_text(" ");
        editor.set_cursor(0, 1);
        editor.delete_word_backward();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_redo_tail_cleared_by_new_edit() {
        let mut editor = TextEditor::new();
        type_str(&mut editor, "abc");
        editor.undo();
        assert_eq!(editor.text(), "");
        editor.insert_rune('z');
        assert!(!editor.redo());
        assert_eq!(editor.text(), "z");
    }

    #[test]
    fn test_cursor_move_splits_typing_record() {
        let mut editor = TextEditor::new();
        type_str(&mut editor, "abc");
        editor.move_left(false);
        editor.move_right(false);
        type_str(&mut editor, "def");
        assert_eq!(editor.text(), "abcdef");
        editor.undo();
        assert_eq!(editor.text(), "abc");
        editor.undo();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_newline_is_own_record() {
        let mut editor = TextEditor::new();
        type_str(&mut editor, "ab");
        editor.insert_newline();
        type_str(&mut editor, "cd");
        assert_eq!(editor.text(), "ab\ncd");
        editor.undo();
        assert_eq!(editor.text(), "ab\n");
        editor.undo();
        assert_eq!(editor.text(), "ab");
        editor.undo();
        assert_eq!(editor.text(), "");
    }

    #[test]
    fn test_newline_replaces_selection() {
        let mut editor = TextEditor::with_text("Testing\nTesting\nTesting");
        editor.select(Cursor::new(1, 2), Cursor::new(1, 5));
        editor.insert_newline();
        assert_eq!(editor.text(), "Testing\nTe\nng\nTesting");
        editor.undo();
        assert_eq!(editor.text(), "Testing\nTesting\nTesting");
    }

    #[test]
    fn test_paste_multiline_positions_cursor() {
        let mut editor = TextEditor::with_text("line");
        editor.set_cursor(0, 4);
        editor.insert_text("thing {\n\titem: 'val测试'\n}");
        assert_eq!(editor.text(), "linething {\n\titem: 'val测试'\n}");
        assert_eq!(editor.cursor(), Cursor::new(2, 1));
    }

    #[test]
    fn test_paste_over_selection_single_record() {
        let mut editor = TextEditor::with_text("Testing");
        editor.select(Cursor::new(0, 2), Cursor::new(0, 5));
        editor.insert_text("Insert");
        assert_eq!(editor.text(), "TeInsertng");
        editor.undo();
        assert_eq!(editor.text(), "Testing");
    }

    #[test]
    fn test_select_all_puts_cursor_at_end() {
        let mut editor = TextEditor::with_text("First Row\nSecond Row\nThird Row");
        editor.select_all();
        assert_eq!(editor.cursor(), Cursor::new(2, 9));
        assert_eq!(editor.selected_text(), "First Row\nSecond Row\nThird Row");
    }

    #[test]
    fn test_delete_selection_resets_anchor() {
        let mut editor = TextEditor::with_text("Testing\nTesting\nTesting");
        editor.select(Cursor::new(1, 2), Cursor::new(1, 5));
        editor.delete_forward();
        assert_eq!(editor.text(), "Testing\nTeng\nTesting");
        // A held selection modifier re-anchors at the collapsed cursor.
        editor.move_down(true);
        assert_eq!(editor.selected_text(), "ng\nTe");
    }

    #[test]
    fn test_cursor_always_valid_under_random_operations() {
        // Cheap deterministic sequence generator, xorshift-style.
        let mut state: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        let mut editor = TextEditor::with_text("one\ntwo three\n\nfour");
        for _ in 0..2000 {
            let select = next() % 3 == 0;
            match next() % 12 {
                0 => editor.move_left(select),
                1 => editor.move_right(select),
                2 => editor.move_up(select),
                3 => editor.move_down(select),
                4 => editor.line_end(select),
                5 => editor.line_start(select),
                6 => {
                    editor.insert_rune(char::from(b'a' + (next() % 26) as u8));
                }
                7 => {
                    editor.backspace();
                }
                8 => {
                    editor.delete_forward();
                }
                9 => {
                    editor.insert_newline();
                }
                10 => {
                    editor.undo();
                }
                _ => {
                    editor.redo();
                }
            }
            let c = editor.cursor();
            assert!(c.row < editor.line_count());
            assert!(c.col <= editor.line_len(c.row));
        }
    }
}
