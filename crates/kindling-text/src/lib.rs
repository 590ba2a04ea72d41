//! Text editing engine: buffer, cursor, selection, and undo history.
//!
//! This crate is the model layer behind editable text widgets. It owns the
//! line/column text buffer, the cursor and selection state machine, and a
//! linear undo/redo history with explicit edit coalescing. It performs no
//! rendering and no I/O; widgets feed it decoded input and read back state.

pub mod editor;
pub mod history;

pub use editor::{Cursor, TextEditor};
pub use history::{EditKind, EditRecord, History};
