//! Single- and multi-line text entry widget.
//!
//! All text mutation is delegated to [`kindling_text::TextEditor`], so key
//! presses, clipboard operations, and programmatic calls share one mutation
//! path with uniform undo and refresh semantics. The widget layer adds event
//! decoding, the password mode, callbacks, and the renderer.

use std::sync::{Arc, Mutex, Weak};

use kindling_core::{Pos, Size};
use kindling_text::{Cursor, TextEditor};

use crate::canvas::{CanvasObject, Rectangle, Text};
use crate::event::{Clipboard, Focusable, Key, KeyEvent, Modifiers, Shortcut};
use crate::theme::Theme;
use crate::widget::{Renderer, Widget, WidgetBase};

type TextCallback = Arc<dyn Fn(&str) + Send + Sync>;

struct EntryState {
    editor: TextEditor,
    multiline: bool,
    password: bool,
    disabled: bool,
    focused: bool,
    placeholder: String,
}

pub struct Entry {
    base: WidgetBase,
    weak: Weak<Entry>,
    state: Mutex<EntryState>,
    on_changed: Mutex<Option<TextCallback>>,
    on_submitted: Mutex<Option<TextCallback>>,
}

impl Entry {
    pub fn new() -> Arc<Self> {
        Self::build(false, false)
    }

    pub fn new_multiline() -> Arc<Self> {
        Self::build(true, false)
    }

    pub fn new_password() -> Arc<Self> {
        Self::build(false, true)
    }

    fn build(multiline: bool, password: bool) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            base: WidgetBase::new(),
            weak: weak.clone(),
            state: Mutex::new(EntryState {
                editor: TextEditor::new(),
                multiline,
                password,
                disabled: false,
                focused: false,
                placeholder: String::new(),
            }),
            on_changed: Mutex::new(None),
            on_submitted: Mutex::new(None),
        })
    }

    fn as_widget(&self) -> Option<Arc<dyn Widget>> {
        self.weak.upgrade().map(|entry| entry as Arc<dyn Widget>)
    }

    // ---- content ----

    pub fn text(&self) -> String {
        self.state.lock().unwrap().editor.text()
    }

    /// Replace the whole content. This is a reset point: cursor re-clamped,
    /// selection dropped, undo history cleared, changed callback fired only
    /// when the text differs.
    pub fn set_text(&self, text: &str) {
        let changed = self.state.lock().unwrap().editor.set_text(text);
        if changed {
            self.notify_changed();
        }
        self.base.request_refresh();
    }

    /// Append to the end of the content without moving the cursor.
    pub fn append(&self, text: &str) {
        let changed = {
            let mut st = self.state.lock().unwrap();
            let cursor = st.editor.cursor();
            let end = st.editor.end_cursor();
            st.editor.set_cursor(end.row, end.col);
            let changed = st.editor.insert_text(text);
            st.editor.set_cursor(cursor.row, cursor.col);
            changed
        };
        if changed {
            self.notify_changed();
        }
        self.base.request_refresh();
    }

    pub fn placeholder(&self) -> String {
        self.state.lock().unwrap().placeholder.clone()
    }

    pub fn set_placeholder(&self, text: &str) {
        self.state.lock().unwrap().placeholder = text.to_string();
        self.base.request_refresh();
    }

    // ---- cursor & selection ----

    pub fn cursor_row(&self) -> usize {
        self.state.lock().unwrap().editor.cursor().row
    }

    pub fn cursor_column(&self) -> usize {
        self.state.lock().unwrap().editor.cursor().col
    }

    pub fn set_cursor(&self, row: usize, col: usize) {
        self.state.lock().unwrap().editor.set_cursor(row, col);
        self.base.request_refresh();
    }

    pub fn selected_text(&self) -> String {
        self.state.lock().unwrap().editor.selected_text()
    }

    pub fn select_range(&self, from: (usize, usize), to: (usize, usize)) {
        self.state
            .lock()
            .unwrap()
            .editor
            .select(Cursor::new(from.0, from.1), Cursor::new(to.0, to.1));
        self.base.request_refresh();
    }

    // ---- modes ----

    pub fn multiline(&self) -> bool {
        self.state.lock().unwrap().multiline
    }

    pub fn password(&self) -> bool {
        self.state.lock().unwrap().password
    }

    /// Toggle password concealment (the reveal affordance).
    pub fn set_password(&self, password: bool) {
        self.state.lock().unwrap().password = password;
        self.base.request_refresh();
    }

    pub fn disabled(&self) -> bool {
        self.state.lock().unwrap().disabled
    }

    pub fn disable(&self) {
        self.state.lock().unwrap().disabled = true;
        self.base.request_refresh();
    }

    pub fn enable(&self) {
        self.state.lock().unwrap().disabled = false;
        self.base.request_refresh();
    }

    /// Whether Tab is consumed as input rather than focus traversal.
    pub fn accepts_tab(&self) -> bool {
        self.state.lock().unwrap().multiline
    }

    // ---- callbacks ----

    pub fn set_on_changed(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_changed.lock().unwrap() = Some(Arc::new(f));
    }

    pub fn set_on_submitted(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_submitted.lock().unwrap() = Some(Arc::new(f));
    }

    // ---- geometry ----

    pub fn resize(&self, size: Size<f32>) {
        if size == self.base.size() {
            return;
        }
        self.base.set_size(size);
        let theme = Theme::default();
        let rows = ((size.height - theme.inner_padding * 2.0)
            / theme.line_height(theme.text_size))
        .floor()
        .max(1.0) as usize;
        self.state.lock().unwrap().editor.set_page_rows(rows);
        if let (Some(cache), Some(widget)) = (self.base.cache(), self.as_widget()) {
            cache.layout_widget(&widget, size);
        }
    }

    pub fn min_size(&self) -> Size<f32> {
        match (self.base.cache(), self.as_widget()) {
            (Some(cache), Some(widget)) => cache.min_size(&widget),
            _ => Size::ZERO,
        }
    }

    // ---- internals ----

    fn notify_changed(&self) {
        let callback = self.on_changed.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(&self.text());
        }
    }

    fn after_edit(&self, changed: bool) {
        if changed {
            self.notify_changed();
        }
        self.base.request_refresh();
    }

    fn submit(&self) {
        let callback = self.on_submitted.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(&self.text());
        }
    }
}

impl Widget for Entry {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn create_renderer(self: Arc<Self>) -> Box<dyn Renderer> {
        Box::new(EntryRenderer::new(Arc::downgrade(&self)))
    }
}

impl Focusable for Entry {
    fn focus_gained(&self) {
        self.state.lock().unwrap().focused = true;
        self.base.request_refresh();
    }

    fn focus_lost(&self) {
        self.state.lock().unwrap().focused = false;
        self.base.request_refresh();
    }

    fn typed_rune(&self, ch: char) {
        let changed = {
            let mut st = self.state.lock().unwrap();
            if st.disabled || ch == '\r' {
                return;
            }
            if ch == '\n' && !st.multiline {
                return;
            }
            st.editor.insert_rune(ch)
        };
        self.after_edit(changed);
    }

    fn typed_key(&self, event: KeyEvent) {
        if self.disabled() {
            return;
        }
        let select = event.modifiers.contains(Modifiers::SHIFT);
        let mut changed = false;
        let mut submit = false;
        {
            let mut st = self.state.lock().unwrap();
            match event.key {
                Key::Left => st.editor.move_left(select),
                Key::Right => st.editor.move_right(select),
                Key::Up => st.editor.move_up(select),
                Key::Down => st.editor.move_down(select),
                Key::Home => st.editor.line_start(select),
                Key::End => st.editor.line_end(select),
                Key::PageUp => st.editor.page_up(select),
                Key::PageDown => st.editor.page_down(select),
                Key::Backspace => changed = st.editor.backspace(),
                Key::Delete => changed = st.editor.delete_forward(),
                Key::Return | Key::Enter => {
                    if select {
                        // The modifier forces a raw newline, even in
                        // single-line entries that otherwise block them.
                        changed = st.editor.insert_newline();
                    } else if st.multiline {
                        changed = st.editor.insert_newline();
                    } else {
                        submit = true;
                    }
                }
                Key::Tab => {
                    if st.multiline {
                        changed = st.editor.insert_rune('\t');
                    }
                }
                Key::Space | Key::Escape => {}
            }
        }
        if submit {
            self.submit();
            return;
        }
        self.after_edit(changed);
    }

    fn typed_shortcut(&self, shortcut: Shortcut, clipboard: &mut dyn Clipboard) {
        match shortcut {
            Shortcut::Copy => {
                let (password, selected) = {
                    let st = self.state.lock().unwrap();
                    (st.password, st.editor.selected_text())
                };
                // The concealed value must never reach the clipboard.
                if !password && !selected.is_empty() {
                    clipboard.set_content(selected);
                }
            }
            Shortcut::Cut => {
                if self.disabled() {
                    return;
                }
                let changed = {
                    let mut st = self.state.lock().unwrap();
                    if st.password {
                        return;
                    }
                    let selected = st.editor.selected_text();
                    if selected.is_empty() {
                        return;
                    }
                    clipboard.set_content(selected);
                    st.editor.delete_selection()
                };
                self.after_edit(changed);
            }
            Shortcut::Paste => {
                if self.disabled() {
                    return;
                }
                let content = clipboard.content();
                let changed = {
                    let mut st = self.state.lock().unwrap();
                    let content = if st.multiline {
                        content
                    } else {
                        // Embedded line breaks collapse to single spaces in
                        // single-line mode; tabs are preserved.
                        content.replace("\r\n", "\n").replace(['\n', '\r'], " ")
                    };
                    st.editor.insert_text(&content)
                };
                self.after_edit(changed);
            }
            Shortcut::SelectAll => {
                self.state.lock().unwrap().editor.select_all();
                self.base.request_refresh();
            }
            Shortcut::Undo => {
                if self.disabled() {
                    return;
                }
                let changed = self.state.lock().unwrap().editor.undo();
                self.after_edit(changed);
            }
            Shortcut::Redo => {
                if self.disabled() {
                    return;
                }
                let changed = self.state.lock().unwrap().editor.redo();
                self.after_edit(changed);
            }
            Shortcut::Custom { key, modifiers } => {
                if self.disabled() {
                    return;
                }
                let word = modifiers
                    .intersects(Modifiers::CONTROL | Modifiers::ALT | Modifiers::SUPER);
                if !word {
                    return;
                }
                let select = modifiers.contains(Modifiers::SHIFT);
                let mut changed = false;
                {
                    let mut st = self.state.lock().unwrap();
                    match key {
                        Key::Left => st.editor.move_word_left(select),
                        Key::Right => st.editor.move_word_right(select),
                        Key::Home => st.editor.doc_start(select),
                        Key::End => st.editor.doc_end(select),
                        Key::Backspace => changed = st.editor.delete_word_backward(),
                        Key::Delete => changed = st.editor.delete_word_forward(),
                        _ => return,
                    }
                }
                self.after_edit(changed);
            }
        }
    }
}

fn mask(text: &str) -> String {
    text.chars()
        .map(|ch| if ch == '\n' { '\n' } else { '•' })
        .collect()
}

struct EntryRenderer {
    entry: Weak<Entry>,
    theme: Theme,
    background: Rectangle,
    content: Text,
    placeholder: Text,
    cursor: Rectangle,
    selections: Vec<Rectangle>,
    /// (row, start col, end col) spans of the current selection.
    selection_spans: Vec<(usize, usize, usize)>,
    cursor_pos: Cursor,
    show_placeholder: bool,
    show_cursor: bool,
    multiline: bool,
}

impl EntryRenderer {
    fn new(entry: Weak<Entry>) -> Self {
        let theme = Theme::default();
        let mut background = Rectangle::new(theme.input_background);
        background.corner_radius = theme.corner_radius;
        let mut renderer = Self {
            entry,
            background,
            content: Text::new("", theme.foreground, theme.text_size),
            placeholder: Text::new("", theme.placeholder, theme.text_size),
            cursor: Rectangle::new(theme.cursor),
            selections: Vec::new(),
            selection_spans: Vec::new(),
            cursor_pos: Cursor::default(),
            show_placeholder: false,
            show_cursor: false,
            multiline: false,
            theme,
        };
        renderer.refresh();
        renderer
    }
}

impl Renderer for EntryRenderer {
    fn layout(&mut self, size: Size<f32>) {
        let inner = self.theme.inner_padding;
        let advance = self.theme.char_advance(self.theme.text_size);
        let line_height = self.theme.line_height(self.theme.text_size);

        self.background.position = Pos::ZERO;
        self.background.size = size;

        let content_size = Size::new(
            (size.width - inner * 2.0).max(0.0),
            (size.height - inner * 2.0).max(0.0),
        );
        self.content.position = Pos::new(inner, inner);
        self.content.size = content_size;
        self.placeholder.position = Pos::new(inner, inner);
        self.placeholder.size = content_size;

        self.selections.clear();
        for &(row, start, end) in &self.selection_spans {
            if start == end {
                continue;
            }
            let mut rect = Rectangle::new(self.theme.selection);
            rect.position = Pos::new(
                inner + start as f32 * advance,
                inner + row as f32 * line_height,
            );
            rect.size = Size::new((end - start) as f32 * advance, line_height);
            self.selections.push(rect);
        }

        self.cursor.position = Pos::new(
            inner + self.cursor_pos.col as f32 * advance,
            inner + self.cursor_pos.row as f32 * line_height,
        );
        self.cursor.size = Size::new(2.0, line_height);
    }

    fn min_size(&self) -> Size<f32> {
        let inner = self.theme.inner_padding;
        let line_height = self.theme.line_height(self.theme.text_size);
        let advance = self.theme.char_advance(self.theme.text_size);
        let rows = if self.multiline { 3.0 } else { 1.0 };
        Size::new(
            inner * 2.0 + advance * 10.0,
            inner * 2.0 + line_height * rows,
        )
    }

    fn refresh(&mut self) {
        let Some(entry) = self.entry.upgrade() else {
            return;
        };
        {
            let st = entry.state.lock().unwrap();
            let text = st.editor.text();
            self.multiline = st.multiline;
            self.content.content = if st.password { mask(&text) } else { text.clone() };
            self.placeholder.content = st.placeholder.clone();
            self.show_placeholder = text.is_empty() && !st.placeholder.is_empty();
            self.show_cursor = st.focused && !st.disabled;
            self.cursor_pos = st.editor.cursor();

            self.selection_spans.clear();
            if st.focused {
                if let Some((start, end)) = st.editor.selection_range() {
                    for row in start.row..=end.row {
                        let from = if row == start.row { start.col } else { 0 };
                        let to = if row == end.row {
                            end.col
                        } else {
                            st.editor.line_len(row)
                        };
                        self.selection_spans.push((row, from, to));
                    }
                }
            }
        }
        let size = entry.base().size();
        let size = if size.is_zero() { self.min_size() } else { size };
        self.layout(size);
    }

    fn objects(&self) -> Vec<CanvasObject> {
        let mut objects = vec![CanvasObject::Rectangle(self.background.clone())];
        for selection in &self.selections {
            objects.push(CanvasObject::Rectangle(selection.clone()));
        }
        if self.show_placeholder {
            objects.push(CanvasObject::Text(self.placeholder.clone()));
        } else {
            objects.push(CanvasObject::Text(self.content.clone()));
        }
        if self.show_cursor {
            objects.push(CanvasObject::Rectangle(self.cursor.clone()));
        }
        objects
    }
}
