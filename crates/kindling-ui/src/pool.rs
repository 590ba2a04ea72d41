//! Reusable-instance pool for virtualized widgets.
//!
//! Rows scrolled out of view are released here instead of being dropped, so
//! scrolling does not reallocate renderers. An instance is either bound
//! (tracked by the renderer under its row id) or idle in the pool, never
//! both. The pool is owned by a single layout pass and is deliberately not
//! synchronized.

#[derive(Debug)]
pub struct Pool<T> {
    idle: Vec<T>,
}

impl<T> Pool<T> {
    pub fn new() -> Self {
        Self { idle: Vec::new() }
    }

    /// Take a previously released instance, if any. The caller constructs a
    /// fresh one on `None`. Returned instances carry stale content and must
    /// be re-bound before use.
    pub fn get(&mut self) -> Option<T> {
        self.idle.pop()
    }

    /// Release an instance for future reuse. The caller must already have
    /// removed it from its "in use" bookkeeping.
    pub fn put(&mut self, item: T) {
        self.idle.push(item);
    }

    pub fn len(&self) -> usize {
        self.idle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idle.is_empty()
    }
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
