//! Kindling UI: the retained-mode widget core.
//!
//! This crate turns declarative widget state into a tree of positioned
//! drawable primitives and routes input events to the interactive widgets:
//! - Renderer contract: `layout` / `min_size` / `refresh` / `objects`
//! - Process-wide renderer cache with get-or-create and teardown sweeps
//! - Object pooling and viewport virtualization for large trees
//! - Text entry widget backed by the `kindling-text` editing engine
//!
//! Platform drivers sit outside: they deliver decoded input events through
//! the [`Focusable`] contract and consume [`CanvasObject`] lists read-only,
//! once per frame that needs repainting.

pub mod cache;
pub mod canvas;
pub mod entry;
pub mod event;
pub mod pool;
pub mod theme;
pub mod tree;
pub mod widget;

pub use cache::{RendererCache, SharedRenderer};
pub use canvas::{CanvasObject, Icon, IconKind, Rectangle, Text};
pub use entry::Entry;
pub use event::{Clipboard, Focusable, Key, KeyEvent, Modifiers, Shortcut, TestClipboard};
pub use pool::Pool;
pub use theme::Theme;
pub use tree::{StringTreeModel, Tree, TreeModel, TreeNodeId};
pub use widget::{Renderer, Widget, WidgetBase, WidgetId};

// Re-export common types from dependencies
pub use kindling_core::{Color, Pos, Rect, Size};
pub use kindling_text::{Cursor, TextEditor};
