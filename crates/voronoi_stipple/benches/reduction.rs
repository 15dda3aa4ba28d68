mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use voronoi_stipple::field::{WeightMapping, WeightRaster};
use voronoi_stipple::ownership::{OwnershipGrid, OwnershipRasterizer, RasterBackend};
use voronoi_stipple::reduce::{
    extract_centroids, reduce_columns, reduce_rows, CentroidTransport, IntermediateGrid,
    ReductionStrategy,
};

fn reduction_strategy_benches(c: &mut Criterion) {
    let size = 256;
    let field = common::radial_field(size);
    let weights = WeightRaster::build(&field, 1, WeightMapping::default());

    for strategy in [ReductionStrategy::Scatter, ReductionStrategy::RedundantScan] {
        let mut group = c.benchmark_group(format!("reduce/rows/{strategy:?}"));
        group.throughput(common::elements_throughput((size * size) as usize));

        for &n in &common::SITE_COUNTS[..2] {
            let sites = common::random_sites(n, size, 0xFACE ^ n as u64);
            let mut grid = OwnershipGrid::new(size, size, 1);
            RasterBackend::BucketGrid
                .build()
                .rasterize(&sites, &mut grid)
                .unwrap();
            let mut intermediate = IntermediateGrid::default();

            group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
                b.iter(|| {
                    reduce_rows(&grid, &weights, n, strategy, &mut intermediate).unwrap();
                    black_box(intermediate.size());
                });
            });
        }

        group.finish();
    }
}

fn reduction_columns_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce/columns_and_transport");

    for &size in &common::FIELD_SIZES {
        let n = 1024;
        let field = common::radial_field(size);
        let weights = WeightRaster::build(&field, 1, WeightMapping::default());
        let sites = common::random_sites(n, size, 0xC01 ^ size as u64);
        let mut grid = OwnershipGrid::new(size, size, 1);
        RasterBackend::BucketGrid
            .build()
            .rasterize(&sites, &mut grid)
            .unwrap();
        let mut intermediate = IntermediateGrid::default();
        reduce_rows(&grid, &weights, n, ReductionStrategy::Scatter, &mut intermediate).unwrap();
        let mut finals = Vec::new();
        group.throughput(common::elements_throughput(n * size as usize));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                reduce_columns(&intermediate, &mut finals);
                let centroids = extract_centroids(&finals, CentroidTransport::Packed).unwrap();
                black_box(centroids.len());
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = reduction_strategy_benches, reduction_columns_benches
}
criterion_main!(benches);
