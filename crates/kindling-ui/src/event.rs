//! Input events delivered by the platform driver, and the receiving-side
//! contract widgets implement.
//!
//! The router guarantees at most one focused widget at a time; only the
//! focused widget receives keyboard events. Rune input arrives post
//! key-mapping as Unicode codepoints.

use bitflags::bitflags;

bitflags! {
    /// Keyboard modifier bitset attached to key events and shortcuts.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CONTROL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Backspace,
    Delete,
    Return,
    Enter,
    Tab,
    Space,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn with(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }
}

/// Editing shortcuts dispatched separately from plain key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Copy,
    Cut,
    Paste,
    SelectAll,
    Undo,
    Redo,
    /// Platform-modified key, e.g. word movement or word deletion.
    Custom { key: Key, modifiers: Modifiers },
}

/// Clipboard collaborator owned by the driver.
pub trait Clipboard {
    fn content(&self) -> String;
    fn set_content(&mut self, content: String);
}

/// In-memory clipboard for tests and headless use.
#[derive(Debug, Default)]
pub struct TestClipboard {
    content: String,
}

impl TestClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for TestClipboard {
    fn content(&self) -> String {
        self.content.clone()
    }

    fn set_content(&mut self, content: String) {
        self.content = content;
    }
}

/// Receiving side of the focus/event router contract.
pub trait Focusable {
    fn focus_gained(&self);
    fn focus_lost(&self);
    fn typed_rune(&self, ch: char);
    fn typed_key(&self, event: KeyEvent);
    fn typed_shortcut(&self, shortcut: Shortcut, clipboard: &mut dyn Clipboard);
}
