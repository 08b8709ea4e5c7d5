use criterion::{Criterion, criterion_group, criterion_main};
use flatnote_engine::{ConvertOptions, blocks_to_tree, tree_to_blocks};
mod common;

fn bench_conversion(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert");
    group.sample_size(10);

    let options = ConvertOptions::default();
    let blocks = common::generate_blocks(200);
    let tree = blocks_to_tree(&blocks, &options);

    group.bench_function("blocks_to_tree", |b| {
        b.iter(|| {
            let tree = blocks_to_tree(std::hint::black_box(&blocks), &options);
            std::hint::black_box(tree);
        });
    });

    group.bench_function("tree_to_blocks", |b| {
        b.iter(|| {
            let blocks = tree_to_blocks(Some(std::hint::black_box(&tree)), &options);
            std::hint::black_box(blocks);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_conversion);
criterion_main!(benches);
