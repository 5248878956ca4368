use criterion::{criterion_group, criterion_main, Criterion, black_box};

use cloudtile::math::{calc_depth, calc_level_index};
use cloudtile::streaming::par_for_each_chunk;
use cloudtile::{Id, Structure, StructureConfig};

fn dynamic_octree() -> Structure {
    let config = StructureConfig::octree(6, 64, 262144)
        .with_num_points_hint(5_000_000_000)
        .with_dynamic_chunks(true);
    Structure::new(&config).unwrap()
}

fn bench_calc_depth_shallow(c: &mut Criterion) {
    let index = calc_level_index(3, 10) + 12345u32;

    c.bench_function("calc_depth_shallow", |b| {
        b.iter(|| calc_depth(8, black_box(&index)));
    });
}

fn bench_calc_depth_deep(c: &mut Criterion) {
    let index = calc_level_index(3, 60) + 12345u32;

    c.bench_function("calc_depth_deep", |b| {
        b.iter(|| calc_depth(8, black_box(&index)));
    });
}

fn bench_chunk_info_cold(c: &mut Criterion) {
    let structure = dynamic_octree();
    let index = calc_level_index(3, 9) + 999u32;

    c.bench_function("chunk_info_cold", |b| {
        b.iter(|| structure.chunk_info(black_box(&index)));
    });
}

fn bench_chunk_info_sparse(c: &mut Criterion) {
    let structure = dynamic_octree();
    let index = calc_level_index(3, 40) + Id::from(u64::MAX);

    c.bench_function("chunk_info_sparse", |b| {
        b.iter(|| structure.chunk_info(black_box(&index)));
    });
}

fn bench_info_from_num(c: &mut Criterion) {
    let structure = dynamic_octree();
    let num = structure.chunk_info(&(calc_level_index(3, 40) + 77u32)).chunk_num().clone();

    c.bench_function("get_info_from_num_sparse", |b| {
        b.iter(|| structure.get_info_from_num(black_box(&num)));
    });
}

fn bench_par_for_each_depth(c: &mut Criterion) {
    let structure = dynamic_octree();

    c.bench_function("par_for_each_chunk_depth_9", |b| {
        b.iter(|| {
            par_for_each_chunk(&structure, black_box(9), |info| {
                black_box(info);
            })
            .unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_calc_depth_shallow,
    bench_calc_depth_deep,
    bench_chunk_info_cold,
    bench_chunk_info_sparse,
    bench_info_from_num,
    bench_par_for_each_depth,
);
criterion_main!(benches);
