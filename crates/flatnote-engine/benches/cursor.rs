use criterion::{Criterion, criterion_group, criterion_main};
use flatnote_engine::cursor::{
    Caret, InlineSnapshot, MonospaceMeasure, NavigationSettings, VerticalDirection, arrow_vertical,
};
use flatnote_engine::models::{Block, BlockType};
mod common;

fn bench_caret_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("cursor");
    group.sample_size(10);

    let long = common::generate_long_block(2000);
    let snapshot = InlineSnapshot::from_block(&long);

    group.bench_function("caret_stops", |b| {
        b.iter(|| std::hint::black_box(snapshot.caret_stops()));
    });

    group.bench_function("resolve_middle", |b| {
        let middle = long.len() / 2;
        b.iter(|| std::hint::black_box(snapshot.resolve(std::hint::black_box(middle))));
    });

    let blocks = vec![Block::with_id("above", BlockType::Text, "short"), long.clone()];
    let layout = MonospaceMeasure::layout(&blocks, 80, 8.0, 16.0);
    let settings = NavigationSettings::default();

    group.bench_function("arrow_down_into_long_block", |b| {
        let caret = Caret::new("above", 3);
        b.iter(|| {
            let nav = arrow_vertical(&blocks, &caret, VerticalDirection::Down, &layout, &settings);
            std::hint::black_box(nav);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_caret_resolution);
criterion_main!(benches);
