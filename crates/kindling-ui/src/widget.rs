//! Widget base state and the renderer contract.
//!
//! Widgets and renderers are a dual-object pair: the widget owns state and
//! behavior, the renderer turns that state into positioned canvas objects.
//! The widget owns its renderer's lifetime (through the
//! [`RendererCache`](crate::cache::RendererCache)); the renderer keeps only a
//! weak back-reference for reading widget state, never extending its
//! lifetime. Stale renderer access after teardown is therefore a no-op, not
//! a fault.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::RendererCache;
use crate::canvas::CanvasObject;
use kindling_core::{Pos, Size};

static NEXT_WIDGET_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique widget identity, the key of the renderer cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(u64);

impl WidgetId {
    pub fn next() -> Self {
        WidgetId(NEXT_WIDGET_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Turns a widget's current state into a flat, paint-ordered object list.
///
/// The rendering path is infallible by contract: none of these methods may
/// fail. Collaborator errors are absorbed and logged by implementations.
pub trait Renderer: Send {
    /// Position and size all currently-held child objects for `size`. Pure
    /// function of current widget state; must not fetch fresh content.
    fn layout(&mut self, size: Size<f32>);

    /// Smallest size presenting the content unclipped. Monotonic: adding
    /// content never decreases it.
    fn min_size(&self) -> Size<f32>;

    /// Re-derive the object list and styling from current widget state, then
    /// re-run layout at the widget's current size (or the minimum size when
    /// the widget has not been laid out yet).
    fn refresh(&mut self);

    /// Current paint-order children. Only objects in this list are drawn or
    /// hit-tested; children not currently needed are omitted, not returned
    /// hidden.
    fn objects(&self) -> Vec<CanvasObject>;

    /// Release non-shared resources. Called once by the cache on
    /// invalidation or a full teardown sweep.
    fn teardown(&mut self) {}
}

pub trait Widget: Send + Sync {
    fn base(&self) -> &WidgetBase;

    /// Renderer factory, invoked at most once per live widget by the cache.
    fn create_renderer(self: Arc<Self>) -> Box<dyn Renderer>;

    fn id(&self) -> WidgetId {
        self.base().id()
    }

    fn visible(&self) -> bool {
        self.base().visible()
    }

    fn size(&self) -> Size<f32> {
        self.base().size()
    }

    fn position(&self) -> Pos<f32> {
        self.base().position()
    }
}

#[derive(Debug)]
struct BaseState {
    visible: bool,
    size: Size<f32>,
    position: Pos<f32>,
}

/// Shared widget state embedded (by composition) in every widget.
pub struct WidgetBase {
    id: WidgetId,
    state: Mutex<BaseState>,
    cache: Mutex<Option<Arc<RendererCache>>>,
}

impl WidgetBase {
    pub fn new() -> Self {
        Self {
            id: WidgetId::next(),
            state: Mutex::new(BaseState {
                visible: true,
                size: Size::ZERO,
                position: Pos::ZERO,
            }),
            cache: Mutex::new(None),
        }
    }

    pub fn id(&self) -> WidgetId {
        self.id
    }

    pub fn visible(&self) -> bool {
        self.state.lock().unwrap().visible
    }

    /// Hide the widget. A hidden widget produces no visible child objects
    /// and is skipped by layout-time traversal of parents, though its
    /// renderer may still exist.
    pub fn hide(&self) {
        self.state.lock().unwrap().visible = false;
        self.request_refresh();
    }

    pub fn show(&self) {
        self.state.lock().unwrap().visible = true;
        self.request_refresh();
    }

    pub fn size(&self) -> Size<f32> {
        self.state.lock().unwrap().size
    }

    pub fn position(&self) -> Pos<f32> {
        self.state.lock().unwrap().position
    }

    pub fn set_position(&self, position: Pos<f32>) {
        self.state.lock().unwrap().position = position;
    }

    pub(crate) fn set_size(&self, size: Size<f32>) {
        self.state.lock().unwrap().size = size;
    }

    /// Install the renderer cache this widget resolves its renderer from.
    /// Widgets that were never attached simply skip refresh requests.
    pub fn set_cache(&self, cache: Arc<RendererCache>) {
        *self.cache.lock().unwrap() = Some(cache);
    }

    pub fn cache(&self) -> Option<Arc<RendererCache>> {
        self.cache.lock().unwrap().clone()
    }

    /// Ask the cache to refresh this widget's renderer, if both exist.
    pub fn request_refresh(&self) {
        if let Some(cache) = self.cache() {
            cache.refresh(self.id);
        }
    }

    /// Ask the cache to re-run layout at `size`, if a renderer exists.
    pub fn request_layout(&self, size: Size<f32>) {
        if let Some(cache) = self.cache() {
            cache.layout(self.id, size);
        }
    }
}

impl Default for WidgetBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_ids_are_unique() {
        let a = WidgetId::next();
        let b = WidgetId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_base_defaults() {
        let base = WidgetBase::new();
        assert!(base.visible());
        assert!(base.size().is_zero());
        assert!(base.cache().is_none());
    }

    #[test]
    fn test_hide_show() {
        let base = WidgetBase::new();
        base.hide();
        assert!(!base.visible());
        base.show();
        assert!(base.visible());
    }

    #[test]
    fn test_refresh_without_cache_is_noop() {
        let base = WidgetBase::new();
        base.request_refresh();
        base.request_layout(Size::new(10.0, 10.0));
    }
}
