//! Hierarchical tree widget with viewport virtualization.
//!
//! The tree retains no node objects: the forest is described entirely by a
//! caller-supplied [`TreeModel`], and the widget keeps only the open-state
//! map, selection, focus, and scroll position. Every layout pass walks the
//! open nodes in pre-order, creates or recycles a row renderer for each row
//! intersecting the viewport, and releases rows that scrolled out to a
//! per-kind pool. Rows are positioned in content coordinates; the painter
//! applies the scroll translation.

use std::sync::{Arc, Mutex, Weak};

use kindling_core::alloc::HashMap;
use kindling_core::{Pos, Size};

use crate::canvas::{CanvasObject, Icon, IconKind, Rectangle, Text};
use crate::event::{Clipboard, Focusable, Key, KeyEvent, Shortcut};
use crate::pool::Pool;
use crate::theme::Theme;
use crate::widget::{Renderer, Widget, WidgetBase};

/// Caller-defined unique identifier of a logical row.
pub type TreeNodeId = String;

/// Capability set describing the forest. The tree core never retains node
/// data; it asks the model on every walk.
pub trait TreeModel: Send + Sync {
    /// Children of the given node, in display order.
    fn children_of(&self, id: &str) -> Vec<TreeNodeId>;

    /// Whether the node may have children (and shows a branch chevron).
    fn is_branch(&self, id: &str) -> bool;

    /// Template content object for a branch or leaf row. Declining (the
    /// default) renders rows without content rather than failing.
    fn create_node(&self, branch: bool) -> Option<CanvasObject> {
        let _ = branch;
        None
    }

    /// Bind `content` to the data at `id`.
    fn update_node(&self, id: &str, branch: bool, content: &mut CanvasObject) {
        let _ = (id, branch, content);
    }
}

/// Tree model backed by a map from node id to child ids. The map must
/// contain an entry for the root (`""` by default).
pub struct StringTreeModel {
    data: HashMap<String, Vec<String>>,
}

impl StringTreeModel {
    pub fn new(data: HashMap<String, Vec<String>>) -> Self {
        Self { data }
    }

    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let mut data = HashMap::new();
        for (parent, children) in pairs {
            data.insert(
                parent.to_string(),
                children.iter().map(|c| c.to_string()).collect(),
            );
        }
        Self::new(data)
    }
}

impl TreeModel for StringTreeModel {
    fn children_of(&self, id: &str) -> Vec<TreeNodeId> {
        self.data.get(id).cloned().unwrap_or_default()
    }

    fn is_branch(&self, id: &str) -> bool {
        self.data.contains_key(id)
    }

    fn create_node(&self, _branch: bool) -> Option<CanvasObject> {
        let theme = Theme::default();
        Some(CanvasObject::Text(Text::new(
            "Template",
            theme.foreground,
            theme.text_size,
        )))
    }

    fn update_node(&self, id: &str, _branch: bool, content: &mut CanvasObject) {
        if let CanvasObject::Text(text) = content {
            text.content = id.to_string();
        }
    }
}

/// Which rows the next renderer refresh repaints.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum RefreshScope {
    /// Re-bind and repaint every visible row.
    #[default]
    All,
    /// Repaint only rows that became visible since the previous pass
    /// (scroll or resize without structural change).
    OnlyNew,
    /// Repaint one row.
    Node(TreeNodeId),
}

type NodeCallback = Arc<dyn Fn(&str) + Send + Sync>;

struct TreeState {
    root: TreeNodeId,
    open: HashMap<TreeNodeId, bool>,
    selected: Option<TreeNodeId>,
    current_focus: TreeNodeId,
    focused: bool,
    offset_y: f32,
    viewport: Size<f32>,
    hide_separators: bool,
    branch_min_size: Size<f32>,
    leaf_min_size: Size<f32>,
    next_refresh: RefreshScope,
}

/// Read-only copy of tree state taken before a walk, so model callbacks run
/// without the state lock held.
struct TreeSnapshot {
    root: TreeNodeId,
    open: HashMap<TreeNodeId, bool>,
    selected: Option<TreeNodeId>,
    current_focus: TreeNodeId,
    focused: bool,
    offset_y: f32,
    viewport: Size<f32>,
    hide_separators: bool,
    branch_min: Size<f32>,
    leaf_min: Size<f32>,
}

impl TreeSnapshot {
    fn is_open(&self, id: &str) -> bool {
        // Root is always considered open.
        id == self.root || self.open.get(id).copied().unwrap_or(false)
    }

    fn row_min(&self, branch: bool) -> Size<f32> {
        if branch { self.branch_min } else { self.leaf_min }
    }
}

fn walk_nodes(
    model: &dyn TreeModel,
    snapshot: &TreeSnapshot,
    f: &mut dyn FnMut(&str, &str, bool, usize),
) {
    fn visit(
        model: &dyn TreeModel,
        snapshot: &TreeSnapshot,
        id: &str,
        parent: &str,
        depth: usize,
        f: &mut dyn FnMut(&str, &str, bool, usize),
    ) {
        if model.is_branch(id) {
            f(id, parent, true, depth);
            if snapshot.is_open(id) {
                for child in model.children_of(id) {
                    visit(model, snapshot, &child, id, depth + 1, f);
                }
            }
        } else {
            f(id, parent, false, depth);
        }
    }
    let root = snapshot.root.clone();
    visit(model, snapshot, &root, "", 0, f);
}

pub struct Tree {
    base: WidgetBase,
    weak: Weak<Tree>,
    model: Arc<dyn TreeModel>,
    state: Mutex<TreeState>,
    on_selected: Mutex<Option<NodeCallback>>,
    on_unselected: Mutex<Option<NodeCallback>>,
    on_branch_opened: Mutex<Option<NodeCallback>>,
    on_branch_closed: Mutex<Option<NodeCallback>>,
}

impl Tree {
    pub fn new(model: Arc<dyn TreeModel>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            base: WidgetBase::new(),
            weak: weak.clone(),
            model,
            state: Mutex::new(TreeState {
                root: String::new(),
                open: HashMap::new(),
                selected: None,
                current_focus: String::new(),
                focused: false,
                offset_y: 0.0,
                viewport: Size::ZERO,
                hide_separators: false,
                branch_min_size: Size::ZERO,
                leaf_min_size: Size::ZERO,
                next_refresh: RefreshScope::All,
            }),
            on_selected: Mutex::new(None),
            on_unselected: Mutex::new(None),
            on_branch_opened: Mutex::new(None),
            on_branch_closed: Mutex::new(None),
        })
    }

    /// Tree displaying the contents of a string map, keyed by parent id.
    pub fn with_string_data(data: HashMap<String, Vec<String>>) -> Arc<Self> {
        Self::new(Arc::new(StringTreeModel::new(data)))
    }

    // ---- configuration ----

    pub fn root(&self) -> TreeNodeId {
        self.state.lock().unwrap().root.clone()
    }

    /// A non-empty root id is rendered as the top row; the default empty
    /// root is a sentinel that is suppressed from display.
    pub fn set_root(&self, root: &str) {
        self.state.lock().unwrap().root = root.to_string();
        self.refresh();
    }

    pub fn set_hide_separators(&self, hide: bool) {
        self.state.lock().unwrap().hide_separators = hide;
        self.refresh();
    }

    pub fn set_on_selected(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_selected.lock().unwrap() = Some(Arc::new(f));
    }

    pub fn set_on_unselected(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_unselected.lock().unwrap() = Some(Arc::new(f));
    }

    pub fn set_on_branch_opened(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_branch_opened.lock().unwrap() = Some(Arc::new(f));
    }

    pub fn set_on_branch_closed(&self, f: impl Fn(&str) + Send + Sync + 'static) {
        *self.on_branch_closed.lock().unwrap() = Some(Arc::new(f));
    }

    // ---- branches ----

    pub fn is_branch_open(&self, uid: &str) -> bool {
        let st = self.state.lock().unwrap();
        uid == st.root || st.open.get(uid).copied().unwrap_or(false)
    }

    pub fn open_branch(&self, uid: &str) {
        self.state.lock().unwrap().open.insert(uid.to_string(), true);
        self.fire(&self.on_branch_opened, uid);
        self.refresh();
    }

    pub fn close_branch(&self, uid: &str) {
        self.state.lock().unwrap().open.insert(uid.to_string(), false);
        self.fire(&self.on_branch_closed, uid);
        self.refresh();
    }

    pub fn toggle_branch(&self, uid: &str) {
        if self.is_branch_open(uid) {
            self.close_branch(uid);
        } else {
            self.open_branch(uid);
        }
    }

    pub fn open_all_branches(&self) {
        fn open_below(tree: &Tree, id: &str) {
            for child in tree.model.children_of(id) {
                if tree.model.is_branch(&child) {
                    tree.state
                        .lock()
                        .unwrap()
                        .open
                        .insert(child.clone(), true);
                }
                open_below(tree, &child);
            }
        }
        let root = self.root();
        open_below(self, &root);
        self.refresh();
    }

    pub fn close_all_branches(&self) {
        self.state.lock().unwrap().open.clear();
        self.refresh();
    }

    // ---- selection ----

    pub fn selected(&self) -> Option<TreeNodeId> {
        self.state.lock().unwrap().selected.clone()
    }

    /// Select a row, unselecting the previous one first. Re-selecting the
    /// already-selected row is a no-op. The selected row is scrolled into
    /// view.
    pub fn select(&self, uid: &str) {
        let previous = {
            let mut st = self.state.lock().unwrap();
            if st.selected.as_deref() == Some(uid) {
                return;
            }
            st.selected.replace(uid.to_string())
        };
        if let Some(previous) = previous {
            self.fire(&self.on_unselected, &previous);
        }
        tracing::debug!(id = uid, "tree row selected");
        self.refresh();
        self.scroll_to(uid);
        self.fire(&self.on_selected, uid);
    }

    pub fn unselect(&self, uid: &str) {
        {
            let mut st = self.state.lock().unwrap();
            if st.selected.as_deref() != Some(uid) {
                return;
            }
            st.selected = None;
        }
        self.refresh();
        self.fire(&self.on_unselected, uid);
    }

    pub fn unselect_all(&self) {
        let previous = { self.state.lock().unwrap().selected.take() };
        if let Some(previous) = previous {
            self.refresh();
            self.fire(&self.on_unselected, &previous);
        }
    }

    fn toggle_selection(&self, uid: &str) {
        if self.selected().as_deref() == Some(uid) {
            self.unselect(uid);
        } else {
            self.select(uid);
        }
    }

    // ---- focus ----

    pub fn current_focus(&self) -> TreeNodeId {
        self.state.lock().unwrap().current_focus.clone()
    }

    // ---- scrolling ----

    pub fn scroll_offset(&self) -> f32 {
        self.state.lock().unwrap().offset_y
    }

    /// Scroll so the row with the given id is fully visible.
    pub fn scroll_to(&self, uid: &str) {
        let Some((y, size)) = self.offset_and_size(uid) else {
            return;
        };
        let (offset, viewport) = {
            let st = self.state.lock().unwrap();
            (st.offset_y, st.viewport)
        };
        if viewport.height <= 0.0 {
            return;
        }
        let mut new_y = offset;
        if y < offset {
            new_y = y;
        } else if y + size.height > offset + viewport.height {
            new_y = y + size.height - viewport.height;
        }
        self.scroll_to_offset(new_y);
    }

    pub fn scroll_to_offset(&self, offset: f32) {
        let content_height = self.content_min_size().height;
        {
            let mut st = self.state.lock().unwrap();
            let max = (content_height - st.viewport.height).max(0.0);
            let clamped = offset.clamp(0.0, max);
            if clamped == st.offset_y {
                return;
            }
            st.offset_y = clamped;
            st.next_refresh = RefreshScope::OnlyNew;
        }
        self.base.request_refresh();
    }

    pub fn scroll_to_top(&self) {
        self.scroll_to_offset(0.0);
    }

    pub fn scroll_to_bottom(&self) {
        self.scroll_to_offset(f32::MAX);
    }

    // ---- refresh ----

    /// Repaint every visible row.
    pub fn refresh(&self) {
        self.state.lock().unwrap().next_refresh = RefreshScope::All;
        self.base.request_refresh();
    }

    /// Repaint a single row.
    pub fn refresh_item(&self, uid: &str) {
        self.state.lock().unwrap().next_refresh = RefreshScope::Node(uid.to_string());
        self.base.request_refresh();
    }

    pub fn resize(&self, size: Size<f32>) {
        if size == self.base.size() {
            return;
        }
        self.base.set_size(size);
        {
            self.state.lock().unwrap().next_refresh = RefreshScope::OnlyNew;
        }
        if let (Some(cache), Some(widget)) = (self.base.cache(), self.as_widget()) {
            cache.renderer_for(&widget).lock().unwrap().refresh();
        }
    }

    pub fn min_size(&self) -> Size<f32> {
        match (self.base.cache(), self.as_widget()) {
            (Some(cache), Some(widget)) => cache.min_size(&widget),
            _ => Size::ZERO,
        }
    }

    /// Size of the fully laid out content: accumulated row heights and
    /// separator gaps, widest row including its indent.
    pub fn content_min_size(&self) -> Size<f32> {
        let snapshot = self.snapshot();
        let theme = Theme::default();
        let pad = theme.padding;
        let icon = theme.icon_inline_size;
        let mut min = Size::ZERO;
        walk_nodes(self.model.as_ref(), &snapshot, &mut |uid, _, branch, depth| {
            let mut depth = depth;
            if snapshot.root.is_empty() {
                if uid.is_empty() {
                    return;
                }
                depth -= 1;
            }
            if min.height > 0.0 {
                min.height += pad;
            }
            let mut m = snapshot.row_min(branch);
            m.width += depth as f32 * (icon + pad);
            min.width = min.width.max(m.width);
            min.height += m.height;
        });
        min
    }

    // ---- internals ----

    fn as_widget(&self) -> Option<Arc<dyn Widget>> {
        self.weak.upgrade().map(|tree| tree as Arc<dyn Widget>)
    }

    fn snapshot(&self) -> TreeSnapshot {
        let st = self.state.lock().unwrap();
        TreeSnapshot {
            root: st.root.clone(),
            open: st.open.clone(),
            selected: st.selected.clone(),
            current_focus: st.current_focus.clone(),
            focused: st.focused,
            offset_y: st.offset_y,
            viewport: st.viewport,
            hide_separators: st.hide_separators,
            branch_min: st.branch_min_size,
            leaf_min: st.leaf_min_size,
        }
    }

    fn take_refresh_scope(&self) -> RefreshScope {
        std::mem::take(&mut self.state.lock().unwrap().next_refresh)
    }

    fn fire(&self, slot: &Mutex<Option<NodeCallback>>, uid: &str) {
        let callback = slot.lock().unwrap().clone();
        if let Some(callback) = callback {
            callback(uid);
        }
    }

    /// Content-space y offset and row size of the given node, walking the
    /// open forest the same way layout does.
    fn offset_and_size(&self, uid: &str) -> Option<(f32, Size<f32>)> {
        let snapshot = self.snapshot();
        let pad = Theme::default().padding;
        let mut y = 0.0;
        let mut found = None;
        walk_nodes(self.model.as_ref(), &snapshot, &mut |id, _, branch, _| {
            if found.is_some() {
                return;
            }
            if snapshot.root.is_empty() && id.is_empty() {
                return;
            }
            if y > 0.0 {
                y += pad;
            }
            let m = snapshot.row_min(branch);
            if id == uid {
                found = Some((y, m));
                return;
            }
            y += m.height;
        });
        found
    }

    /// Pre-order sequence of the open forest, excluding the suppressed root.
    fn open_sequence(&self) -> Vec<TreeNodeId> {
        let snapshot = self.snapshot();
        let mut sequence = Vec::new();
        walk_nodes(self.model.as_ref(), &snapshot, &mut |id, _, _, _| {
            if snapshot.root.is_empty() && id.is_empty() {
                return;
            }
            sequence.push(id.to_string());
        });
        sequence
    }

    fn set_focus_to(&self, uid: &str) {
        {
            self.state.lock().unwrap().current_focus = uid.to_string();
        }
        self.scroll_to(uid);
        self.refresh_item(uid);
    }
}

impl Widget for Tree {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn create_renderer(self: Arc<Self>) -> Box<dyn Renderer> {
        Box::new(TreeRenderer::new(Arc::downgrade(&self)))
    }
}

impl Focusable for Tree {
    fn focus_gained(&self) {
        let needs_default = {
            let st = self.state.lock().unwrap();
            st.current_focus.is_empty()
        };
        if needs_default {
            let root = self.root();
            if let Some(first) = self.model.children_of(&root).first() {
                self.state.lock().unwrap().current_focus = first.clone();
            }
        }
        let focus = {
            let mut st = self.state.lock().unwrap();
            st.focused = true;
            st.current_focus.clone()
        };
        self.refresh_item(&focus);
    }

    fn focus_lost(&self) {
        self.state.lock().unwrap().focused = false;
        self.refresh();
    }

    fn typed_rune(&self, _ch: char) {}

    fn typed_key(&self, event: KeyEvent) {
        let current = self.current_focus();
        match event.key {
            Key::Space => {
                if !current.is_empty() {
                    self.toggle_selection(&current);
                }
            }
            Key::Down => {
                self.refresh_item(&current);
                let sequence = self.open_sequence();
                let next = sequence
                    .iter()
                    .position(|id| *id == current)
                    .and_then(|i| sequence.get(i + 1));
                if let Some(next) = next {
                    self.set_focus_to(next);
                }
            }
            Key::Up => {
                self.refresh_item(&current);
                let sequence = self.open_sequence();
                let previous = sequence
                    .iter()
                    .position(|id| *id == current)
                    .filter(|i| *i > 0)
                    .map(|i| sequence[i - 1].clone());
                if let Some(previous) = previous {
                    self.set_focus_to(&previous);
                }
            }
            Key::Left => {
                if self.model.is_branch(&current) && self.is_branch_open(&current) {
                    self.close_branch(&current);
                } else {
                    let snapshot = self.snapshot();
                    let mut parent = None;
                    walk_nodes(self.model.as_ref(), &snapshot, &mut |id, p, _, _| {
                        if id == current && !p.is_empty() {
                            parent = Some(p.to_string());
                        }
                    });
                    if let Some(parent) = parent {
                        self.set_focus_to(&parent);
                        return;
                    }
                }
                self.refresh_item(&current);
                self.scroll_to(&current);
            }
            Key::Right => {
                if self.model.is_branch(&current) {
                    self.open_branch(&current);
                }
                let children = self.model.children_of(&current);
                if let Some(first) = children.first() {
                    self.set_focus_to(first);
                } else {
                    self.refresh_item(&current);
                    self.scroll_to(&current);
                }
            }
            _ => {}
        }
    }

    fn typed_shortcut(&self, _shortcut: Shortcut, _clipboard: &mut dyn Clipboard) {}
}

/// One pooled row: selection/hover background, branch chevron, bound
/// content. A single concrete type serves both kinds, tagged by `branch`.
struct RowNode {
    uid: TreeNodeId,
    depth: usize,
    branch: bool,
    background: Rectangle,
    icon: Option<Icon>,
    content: Option<CanvasObject>,
    position: Pos<f32>,
    size: Size<f32>,
}

impl RowNode {
    fn new(branch: bool, content: Option<CanvasObject>, theme: &Theme) -> Self {
        let mut background = Rectangle::new(theme.hover);
        background.corner_radius = theme.corner_radius;
        background.hidden = true;
        Self {
            uid: String::new(),
            depth: 0,
            branch,
            background,
            icon: branch.then(|| Icon::new(IconKind::ChevronRight)),
            content,
            position: Pos::ZERO,
            size: Size::ZERO,
        }
    }

    fn bind(&mut self, uid: &str, depth: usize) {
        self.uid = uid.to_string();
        self.depth = depth;
    }

    fn indent(&self, theme: &Theme) -> f32 {
        self.depth as f32 * (theme.icon_inline_size + theme.padding)
    }

    fn min_size(&self, theme: &Theme) -> Size<f32> {
        let mut min = self
            .content
            .as_ref()
            .map(|c| c.min_size(theme))
            .unwrap_or(Size::ZERO);
        min.width += theme.inner_padding + self.indent(theme) + theme.icon_inline_size;
        min.height = min.height.max(theme.icon_inline_size);
        min
    }

    fn layout(&mut self, theme: &Theme) {
        let mut x = theme.padding + self.indent(theme);
        self.background.position = self.position;
        self.background.size = self.size;
        if let Some(icon) = self.icon.as_mut() {
            icon.position = Pos::new(self.position.x + x, self.position.y);
            icon.size = Size::new(theme.icon_inline_size, self.size.height);
        }
        x += theme.icon_inline_size + theme.padding;
        if let Some(content) = self.content.as_mut() {
            content.set_position(Pos::new(self.position.x + x, self.position.y));
            content.resize(Size::new(
                (self.size.width - x).max(0.0),
                self.size.height,
            ));
        }
    }

    fn update_style(&mut self, selected: bool, focus_highlight: bool, open: bool, theme: &Theme) {
        if selected {
            self.background.fill = theme.selection;
            self.background.hidden = false;
        } else if focus_highlight {
            self.background.fill = theme.hover;
            self.background.hidden = false;
        } else {
            self.background.hidden = true;
        }
        if let Some(icon) = self.icon.as_mut() {
            icon.kind = if open {
                IconKind::ChevronDown
            } else {
                IconKind::ChevronRight
            };
        }
    }

    fn objects(&self) -> Vec<CanvasObject> {
        let mut objects = Vec::with_capacity(3);
        if !self.background.hidden {
            objects.push(CanvasObject::Rectangle(self.background.clone()));
        }
        if let Some(content) = &self.content {
            objects.push(content.clone());
        }
        if let Some(icon) = &self.icon {
            objects.push(CanvasObject::Icon(icon.clone()));
        }
        objects
    }
}

struct TreeRenderer {
    tree: Weak<Tree>,
    theme: Theme,
    branches: HashMap<TreeNodeId, RowNode>,
    leaves: HashMap<TreeNodeId, RowNode>,
    branch_pool: Pool<RowNode>,
    leaf_pool: Pool<RowNode>,
    separators: Vec<Rectangle>,
    visible_separators: usize,
    visible: Vec<TreeNodeId>,
    was_visible: Vec<TreeNodeId>,
}

impl TreeRenderer {
    fn new(tree: Weak<Tree>) -> Self {
        let mut renderer = Self {
            tree,
            theme: Theme::default(),
            branches: HashMap::new(),
            leaves: HashMap::new(),
            branch_pool: Pool::new(),
            leaf_pool: Pool::new(),
            separators: Vec::new(),
            visible_separators: 0,
            visible: Vec::new(),
            was_visible: Vec::new(),
        };
        renderer.update_min_sizes();
        renderer
    }

    /// Measure one throwaway template row per kind; cached on the widget
    /// until the next refresh re-measures (structure or theme changes).
    fn update_min_sizes(&mut self) {
        let Some(tree) = self.tree.upgrade() else {
            return;
        };
        let branch_min =
            RowNode::new(true, tree.model.create_node(true), &self.theme).min_size(&self.theme);
        let leaf_min =
            RowNode::new(false, tree.model.create_node(false), &self.theme).min_size(&self.theme);
        let mut st = tree.state.lock().unwrap();
        st.branch_min_size = branch_min;
        st.leaf_min_size = leaf_min;
    }

    fn row_mut(&mut self, uid: &str) -> Option<&mut RowNode> {
        if self.branches.contains_key(uid) {
            self.branches.get_mut(uid)
        } else {
            self.leaves.get_mut(uid)
        }
    }

    fn restyle_row(&mut self, uid: &str, snapshot: &TreeSnapshot, rebind: bool) {
        let selected = snapshot.selected.as_deref() == Some(uid);
        let highlight = snapshot.focused && snapshot.current_focus == uid;
        let open = snapshot.is_open(uid);
        let Some(tree) = self.tree.upgrade() else {
            return;
        };
        let model = Arc::clone(&tree.model);
        let theme = self.theme.clone();
        if let Some(row) = self.row_mut(uid) {
            if rebind {
                if let Some(content) = row.content.as_mut() {
                    model.update_node(uid, row.branch, content);
                }
            }
            row.update_style(selected, highlight, open, &theme);
            row.layout(&theme);
        }
    }
}

impl Renderer for TreeRenderer {
    fn layout(&mut self, size: Size<f32>) {
        let Some(tree) = self.tree.upgrade() else {
            return;
        };
        {
            tree.state.lock().unwrap().viewport = size;
        }
        let snapshot = tree.snapshot();
        let model = Arc::clone(&tree.model);
        let theme = self.theme.clone();

        let pad = theme.padding;
        let separator_thickness = theme.separator_thickness;
        let separator_off = (pad + separator_thickness) / 2.0;
        let width = size.width.max(snapshot.viewport.width);
        let offset = snapshot.offset_y;
        let viewport_height = snapshot.viewport.height;

        std::mem::swap(&mut self.visible, &mut self.was_visible);
        self.visible.clear();

        let mut new_branches: HashMap<TreeNodeId, RowNode> = HashMap::new();
        let mut new_leaves: HashMap<TreeNodeId, RowNode> = HashMap::new();
        let mut separator_index = 0usize;
        let mut y = 0.0f32;

        // Taking fields apart keeps the walk closure borrows disjoint.
        let branches = &mut self.branches;
        let leaves = &mut self.leaves;
        let branch_pool = &mut self.branch_pool;
        let leaf_pool = &mut self.leaf_pool;
        let separators = &mut self.separators;
        let visible = &mut self.visible;

        walk_nodes(model.as_ref(), &snapshot, &mut |uid, _, branch, depth| {
            let mut depth = depth;
            if snapshot.root.is_empty() {
                if uid.is_empty() {
                    return;
                }
                depth -= 1;
            }

            let add_separator = y > 0.0;
            if add_separator {
                y += pad;
            }
            let row_min = snapshot.row_min(branch);
            let row_height = row_min.height;

            if y + row_height < offset {
                // Above the viewport; position bookkeeping only.
            } else if y > offset + viewport_height {
                // Below the viewport.
            } else {
                visible.push(uid.to_string());

                if add_separator && !snapshot.hide_separators {
                    if separator_index >= separators.len() {
                        let mut separator = Rectangle::new(theme.separator);
                        separator.hidden = false;
                        separators.push(separator);
                    }
                    let separator = &mut separators[separator_index];
                    separator.hidden = false;
                    separator.position = Pos::new(0.0, y - separator_off);
                    separator.size = Size::new(width, separator_thickness);
                    separator_index += 1;
                }

                let existing = if branch {
                    branches.remove(uid)
                } else {
                    leaves.remove(uid)
                };
                let mut row = match existing {
                    Some(row) => {
                        debug_assert_eq!(row.uid, uid);
                        row
                    }
                    None => {
                        let pooled = if branch {
                            branch_pool.get()
                        } else {
                            leaf_pool.get()
                        };
                        let mut row = pooled.unwrap_or_else(|| {
                            RowNode::new(branch, model.create_node(branch), &theme)
                        });
                        row.bind(uid, depth);
                        if let Some(content) = row.content.as_mut() {
                            model.update_node(uid, branch, content);
                        }
                        let selected = snapshot.selected.as_deref() == Some(uid);
                        let highlight = snapshot.focused && snapshot.current_focus == uid;
                        row.update_style(selected, highlight, snapshot.is_open(uid), &theme);
                        row
                    }
                };
                row.depth = depth;
                row.position = Pos::new(0.0, y);
                row.size = Size::new(width, row_height);
                row.layout(&theme);
                if branch {
                    new_branches.insert(uid.to_string(), row);
                } else {
                    new_leaves.insert(uid.to_string(), row);
                }
            }
            y += row_height;
        });

        self.visible_separators = if snapshot.hide_separators {
            0
        } else {
            separator_index
        };
        // Surplus separators from a taller previous layout are hidden, not
        // destroyed.
        for separator in self.separators.iter_mut().skip(self.visible_separators) {
            separator.hidden = true;
        }

        // Rows that fell out of the viewport go back to their kind's pool.
        for (_, row) in self.branches.drain() {
            self.branch_pool.put(row);
        }
        for (_, row) in self.leaves.drain() {
            self.leaf_pool.put(row);
        }
        self.branches = new_branches;
        self.leaves = new_leaves;
    }

    fn min_size(&self) -> Size<f32> {
        match self.tree.upgrade() {
            Some(tree) => tree.content_min_size(),
            None => Size::ZERO,
        }
    }

    fn refresh(&mut self) {
        let Some(tree) = self.tree.upgrade() else {
            return;
        };
        self.update_min_sizes();
        let scope = tree.take_refresh_scope();
        let size = tree.base().size();
        let size = if size.is_zero() {
            self.min_size()
        } else {
            size
        };
        self.layout(size);

        let snapshot = tree.snapshot();
        match scope {
            RefreshScope::OnlyNew => {
                let newly_visible: Vec<TreeNodeId> = self
                    .visible
                    .iter()
                    .filter(|id| !self.was_visible.contains(id))
                    .cloned()
                    .collect();
                for uid in newly_visible {
                    self.restyle_row(&uid, &snapshot, false);
                }
            }
            RefreshScope::Node(uid) => {
                self.restyle_row(&uid, &snapshot, true);
            }
            RefreshScope::All => {
                let visible = self.visible.clone();
                for uid in visible {
                    self.restyle_row(&uid, &snapshot, true);
                }
            }
        }
    }

    fn objects(&self) -> Vec<CanvasObject> {
        let mut objects = Vec::new();
        for separator in self.separators.iter().take(self.visible_separators) {
            objects.push(CanvasObject::Rectangle(separator.clone()));
        }
        for uid in &self.visible {
            let row = if let Some(row) = self.branches.get(uid) {
                Some(row)
            } else {
                self.leaves.get(uid)
            };
            if let Some(row) = row {
                objects.extend(row.objects());
            }
        }
        objects
    }
}
