//! Process-wide render-object cache.
//!
//! Maps widget identity to its live renderer so renderer lookup is
//! idempotent and teardown can be deferred to an explicit sweep. This is the
//! only structure shared across threads: background work may race the UI
//! thread into [`RendererCache::renderer_for`], so the read-modify-write is
//! guarded by a single lock and at most one renderer is ever constructed per
//! live widget.
//!
//! The registry is passed explicitly to the widgets that need it (see
//! [`RendererCache::attach`]) rather than reached through an ambient
//! singleton.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use crate::canvas::CanvasObject;
use crate::widget::{Renderer, Widget, WidgetId};
use kindling_core::Size;

pub type SharedRenderer = Arc<Mutex<Box<dyn Renderer>>>;

pub struct RendererCache {
    entries: Mutex<IndexMap<WidgetId, SharedRenderer>>,
}

impl RendererCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// Hand this cache to a widget so its refresh requests resolve here.
    pub fn attach(self: &Arc<Self>, widget: &dyn Widget) {
        widget.base().set_cache(Arc::clone(self));
    }

    /// Get the widget's renderer, invoking its factory on first request.
    /// Concurrent first requests are serialized by the registry lock, so
    /// callers always observe the same instance.
    pub fn renderer_for(&self, widget: &Arc<dyn Widget>) -> SharedRenderer {
        let id = widget.base().id();
        let mut entries = self.entries.lock().unwrap();
        if let Some(existing) = entries.get(&id) {
            return Arc::clone(existing);
        }
        let renderer = Arc::new(Mutex::new(Arc::clone(widget).create_renderer()));
        entries.insert(id, Arc::clone(&renderer));
        renderer
    }

    /// Existing renderer, without creating one.
    pub fn renderer(&self, id: WidgetId) -> Option<SharedRenderer> {
        self.entries.lock().unwrap().get(&id).map(Arc::clone)
    }

    /// Drop the cached renderer for `id`, tearing it down. A subsequent
    /// `renderer_for` recreates it.
    pub fn invalidate(&self, id: WidgetId) {
        let removed = self.entries.lock().unwrap().shift_remove(&id);
        if let Some(renderer) = removed {
            renderer.lock().unwrap().teardown();
        }
    }

    /// Teardown sweep over every entry, in insertion order. Used on full
    /// application or theme reset.
    pub fn destroy_all(&self) {
        let drained: Vec<SharedRenderer> = {
            let mut entries = self.entries.lock().unwrap();
            entries.drain(..).map(|(_, renderer)| renderer).collect()
        };
        for renderer in drained {
            renderer.lock().unwrap().teardown();
        }
    }

    /// Refresh the renderer for `id`. Refresh requests can race teardown
    /// (e.g. a background listener firing after the widget was destroyed);
    /// an absent entry means there is nothing to do.
    pub fn refresh(&self, id: WidgetId) {
        match self.renderer(id) {
            Some(renderer) => renderer.lock().unwrap().refresh(),
            None => tracing::debug!(?id, "refresh requested for widget without a live renderer"),
        }
    }

    pub fn layout(&self, id: WidgetId, size: Size<f32>) {
        if let Some(renderer) = self.renderer(id) {
            renderer.lock().unwrap().layout(size);
        }
    }

    /// Resolve (creating if needed) the widget's renderer and lay it out.
    pub fn layout_widget(&self, widget: &Arc<dyn Widget>, size: Size<f32>) {
        self.renderer_for(widget).lock().unwrap().layout(size);
    }

    pub fn min_size(&self, widget: &Arc<dyn Widget>) -> Size<f32> {
        self.renderer_for(widget).lock().unwrap().min_size()
    }

    /// Paint-order objects for a widget; a hidden widget contributes none.
    pub fn objects(&self, widget: &Arc<dyn Widget>) -> Vec<CanvasObject> {
        if !widget.visible() {
            return Vec::new();
        }
        self.renderer_for(widget).lock().unwrap().objects()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

impl Default for RendererCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetBase;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ProbeWidget {
        base: WidgetBase,
        created: Arc<AtomicUsize>,
        torn_down: Arc<AtomicUsize>,
    }

    impl ProbeWidget {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                base: WidgetBase::new(),
                created: Arc::new(AtomicUsize::new(0)),
                torn_down: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    struct ProbeRenderer {
        torn_down: Arc<AtomicUsize>,
        refreshed: usize,
    }

    impl Renderer for ProbeRenderer {
        fn layout(&mut self, _size: Size<f32>) {}

        fn min_size(&self) -> Size<f32> {
            Size::new(1.0, 1.0)
        }

        fn refresh(&mut self) {
            self.refreshed += 1;
        }

        fn objects(&self) -> Vec<CanvasObject> {
            Vec::new()
        }

        fn teardown(&mut self) {
            self.torn_down.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Widget for ProbeWidget {
        fn base(&self) -> &WidgetBase {
            &self.base
        }

        fn create_renderer(self: Arc<Self>) -> Box<dyn Renderer> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(ProbeRenderer {
                torn_down: Arc::clone(&self.torn_down),
                refreshed: 0,
            })
        }
    }

    #[test]
    fn test_renderer_created_once() {
        let cache = RendererCache::new();
        let widget = ProbeWidget::new();
        let as_widget: Arc<dyn Widget> = widget.clone();

        let first = cache.renderer_for(&as_widget);
        let second = cache.renderer_for(&as_widget);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(widget.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_requests_yield_identical_renderer() {
        let cache = Arc::new(RendererCache::new());
        let widget = ProbeWidget::new();
        let as_widget: Arc<dyn Widget> = widget.clone();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let target = Arc::clone(&as_widget);
            handles.push(std::thread::spawn(move || cache.renderer_for(&target)));
        }
        let renderers: Vec<SharedRenderer> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        for renderer in &renderers[1..] {
            assert!(Arc::ptr_eq(&renderers[0], renderer));
        }
        assert_eq!(widget.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalidate_recreates() {
        let cache = RendererCache::new();
        let widget = ProbeWidget::new();
        let as_widget: Arc<dyn Widget> = widget.clone();

        let first = cache.renderer_for(&as_widget);
        cache.invalidate(widget.id());
        assert_eq!(widget.torn_down.load(Ordering::SeqCst), 1);

        let second = cache.renderer_for(&as_widget);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(widget.created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_destroy_all_tears_every_entry_down() {
        let cache = RendererCache::new();
        let widgets: Vec<_> = (0..3).map(|_| ProbeWidget::new()).collect();
        for widget in &widgets {
            let as_widget: Arc<dyn Widget> = widget.clone();
            cache.renderer_for(&as_widget);
        }
        assert_eq!(cache.len(), 3);

        cache.destroy_all();
        assert!(cache.is_empty());
        for widget in &widgets {
            assert_eq!(widget.torn_down.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_refresh_after_teardown_is_noop() {
        let cache = RendererCache::new();
        let widget = ProbeWidget::new();
        let as_widget: Arc<dyn Widget> = widget.clone();

        cache.renderer_for(&as_widget);
        cache.invalidate(widget.id());
        // Simulates a background refresh racing teardown.
        cache.refresh(widget.id());
        cache.layout(widget.id(), Size::new(10.0, 10.0));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hidden_widget_contributes_no_objects() {
        let cache = RendererCache::new();
        let widget = ProbeWidget::new();
        let as_widget: Arc<dyn Widget> = widget.clone();
        widget.base().hide();
        assert!(cache.objects(&as_widget).is_empty());
    }
}
