//! Benchmarks for transect axes and cross-section extraction.
//!
//! Run with: cargo bench --package grid-slicer --bench slicer_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geo_common::{EarthLocation, LinearAxis, Unit};
use grid_slicer::{
    apply_smoothing, GriddedField, Level, SamplingMode, SliceExtractor, SmoothingKind, SpatialDomain,
    TransectAxisBuilder, VerticalAxis,
};
use projection::great_circle_path;
use test_utils::{create_temperature_volume, fixtures::levels};

fn volume(width: usize, height: usize) -> GriddedField {
    let domain = SpatialDomain::lat_lon(
        LinearAxis::new(230.0, 0.25, width),
        LinearAxis::new(20.0, 0.25, height),
    )
    .unwrap()
    .with_vertical(VerticalAxis::new(levels::PRESSURE_SURFACE_FIRST_HPA.to_vec(), Unit::Hectopascal))
    .unwrap();
    let values = create_temperature_volume(width, height, levels::PRESSURE_SURFACE_FIRST_HPA.len());
    GriddedField::new("bench", "TMP", "K", domain, vec![], values).unwrap()
}

// =============================================================================
// TRANSECT AXIS BENCHMARKS
// =============================================================================

fn bench_transect_axis(c: &mut Criterion) {
    let mut group = c.benchmark_group("transect_axis");
    let builder = TransectAxisBuilder::kilometers();

    for n in [100usize, 1000, 10_000] {
        let path = great_circle_path((39.0, -105.0), (41.9, -87.6), n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &path, |b, path| {
            b.iter(|| builder.build(black_box(path)))
        });
    }

    group.finish();
}

// =============================================================================
// CROSS-SECTION BENCHMARKS
// =============================================================================

fn bench_line_slice(c: &mut Criterion) {
    let mut group = c.benchmark_group("slice_along_line");
    let field = volume(280, 160);
    let extractor = SliceExtractor::default();
    let start = EarthLocation::surface(25.0, -125.0);
    let end = EarthLocation::surface(55.0, -66.0);

    for mode in [SamplingMode::NearestNeighbor, SamplingMode::WeightedAverage] {
        group.bench_function(mode.as_str(), |b| {
            b.iter(|| {
                extractor
                    .slice_along_line(black_box(&field), &start, &end, mode, None)
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_plan_view_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("smoothing");
    let field = volume(280, 160);
    let slice = SliceExtractor::default()
        .slice_at_level(&field, &Level::hpa(500.0), SamplingMode::WeightedAverage)
        .unwrap()
        .into_inner()
        .into_slice()
        .unwrap();

    for kind in [SmoothingKind::FivePoint, SmoothingKind::Gaussian, SmoothingKind::CircularAperture] {
        group.bench_function(kind.as_str(), |b| b.iter(|| apply_smoothing(black_box(&slice), kind, 2)));
    }

    group.finish();
}

criterion_group!(benches, bench_transect_axis, bench_line_slice, bench_plan_view_smoothing);
criterion_main!(benches);
