//! Linear undo/redo history with explicit edit coalescing.
//!
//! Each [`EditRecord`] captures one coalesced edit as a span replacement:
//! at `start`, `deleted` was removed and `inserted` was added. That is enough
//! to invert the edit (undo) and to re-apply it (redo). Grouping of
//! consecutive same-kind edits is driven by an explicit open-record state
//! rather than inferred from call adjacency: any non-edit operation on the
//! editor calls [`History::seal`], which closes the current group.

use crate::editor::Cursor;

/// The kind of a coalesced edit. Only `Typing`, `DeleteBackward` and
/// `DeleteForward` groups grow; every other kind is sealed on push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Plain rune insertions at the cursor.
    Typing,
    /// Newline insertion (always its own record).
    Newline,
    /// Backspace deletions, growing leftwards.
    DeleteBackward,
    /// Delete-key deletions, growing rightwards.
    DeleteForward,
    /// Word deletion via the platform modifier.
    DeleteWord,
    /// Selection removed and (possibly empty) replacement inserted.
    Replace,
    /// Clipboard or programmatic bulk insertion.
    Paste,
}

impl EditKind {
    fn coalesces(self) -> bool {
        matches!(
            self,
            EditKind::Typing | EditKind::DeleteBackward | EditKind::DeleteForward
        )
    }
}

/// One undoable edit: the span replacement plus the cursor/selection state on
/// either side of it.
#[derive(Debug, Clone)]
pub struct EditRecord {
    pub kind: EditKind,
    /// Buffer position where the span begins.
    pub start: Cursor,
    /// Text that the edit removed at `start`.
    pub deleted: String,
    /// Text that the edit inserted at `start`.
    pub inserted: String,
    pub cursor_before: Cursor,
    /// Selection anchor at the time of the edit, for re-establishing the
    /// selection when the edit is undone.
    pub anchor_before: Option<Cursor>,
    pub cursor_after: Cursor,
}

/// Position one past the end of `text` when laid down starting at `start`.
pub fn end_of_span(start: Cursor, text: &str) -> Cursor {
    let mut row = start.row;
    let mut col = start.col;
    for ch in text.chars() {
        if ch == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    Cursor::new(row, col)
}

fn starts_new_whitespace_run(previous: &str, next: &str) -> bool {
    let prev_ws = previous.chars().next_back().is_some_and(char::is_whitespace);
    let next_ws = next.chars().next().is_some_and(char::is_whitespace);
    !prev_ws && next_ws
}

#[derive(Debug, Default)]
pub struct History {
    undo: Vec<EditRecord>,
    redo: Vec<EditRecord>,
    /// Kind of the currently open (still growing) record, if any.
    open: Option<EditKind>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the open record. Called for every operation that is not itself
    /// an edit: cursor movement, selection changes, focus changes.
    pub fn seal(&mut self) {
        self.open = None;
    }

    /// Drop all history, e.g. after a bulk text replacement.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.open = None;
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Record a new edit, coalescing it into the open record when the kinds
    /// match and the spans are adjacent. Any new edit invalidates the
    /// previously undone future.
    pub fn push(&mut self, record: EditRecord) {
        self.redo.clear();

        if self.open == Some(record.kind) && record.kind.coalesces() {
            if let Some(last) = self.undo.last_mut() {
                if Self::merge(last, &record) {
                    return;
                }
            }
        }

        self.open = record.kind.coalesces().then_some(record.kind);
        self.undo.push(record);
    }

    fn merge(last: &mut EditRecord, next: &EditRecord) -> bool {
        match next.kind {
            EditKind::Typing => {
                // A burst of typing breaks where a whitespace run begins, so
                // continuous input undoes in word-sized steps.
                if next.start != end_of_span(last.start, &last.inserted)
                    || starts_new_whitespace_run(&last.inserted, &next.inserted)
                {
                    return false;
                }
                last.inserted.push_str(&next.inserted);
                last.cursor_after = next.cursor_after;
                true
            }
            EditKind::DeleteBackward => {
                if end_of_span(next.start, &next.deleted) != last.start {
                    return false;
                }
                last.start = next.start;
                last.deleted = format!("{}{}", next.deleted, last.deleted);
                last.cursor_after = next.cursor_after;
                true
            }
            EditKind::DeleteForward => {
                if next.start != last.start {
                    return false;
                }
                last.deleted.push_str(&next.deleted);
                last.cursor_after = next.cursor_after;
                true
            }
            _ => false,
        }
    }

    /// Take the most recent record for undoing. The caller applies the
    /// inverse and hands the record back via [`History::push_redone`].
    pub fn pop_undo(&mut self) -> Option<EditRecord> {
        self.open = None;
        self.undo.pop()
    }

    pub fn push_redone(&mut self, record: EditRecord) {
        self.redo.push(record);
    }

    /// Take the most recent undone record for re-applying. The caller hands
    /// it back via [`History::push_reapplied`].
    pub fn pop_redo(&mut self) -> Option<EditRecord> {
        self.open = None;
        self.redo.pop()
    }

    pub fn push_reapplied(&mut self, record: EditRecord) {
        self.undo.push(record);
    }
}
