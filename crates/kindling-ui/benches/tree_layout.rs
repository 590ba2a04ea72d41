use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use kindling_core::Size;
use kindling_core::alloc::HashMap;
use kindling_ui::{RendererCache, Tree, Widget};

fn deep_data(branches: usize, leaves: usize) -> HashMap<String, Vec<String>> {
    let mut data = HashMap::new();
    let mut roots = Vec::new();
    for b in 0..branches {
        let id = format!("branch {b}");
        data.insert(
            id.clone(),
            (0..leaves).map(|l| format!("{id}/leaf {l}")).collect(),
        );
        roots.push(id);
    }
    data.insert(String::new(), roots);
    data
}

fn bench_tree_layout(c: &mut Criterion) {
    let tree = Tree::with_string_data(deep_data(100, 100));
    tree.open_all_branches();
    let cache = Arc::new(RendererCache::new());
    cache.attach(tree.as_ref());
    tree.resize(Size::new(400.0, 600.0));
    let as_widget: Arc<dyn Widget> = tree.clone();
    let renderer = cache.renderer_for(&as_widget);

    c.bench_function("tree_layout_10k_rows", |b| {
        b.iter(|| renderer.lock().unwrap().layout(Size::new(400.0, 600.0)));
    });

    c.bench_function("tree_scroll_tick", |b| {
        let mut offset = 0.0f32;
        b.iter(|| {
            offset = (offset + 24.0) % 1000.0;
            tree.scroll_to_offset(offset);
        });
    });
}

criterion_group!(benches, bench_tree_layout);
criterion_main!(benches);
