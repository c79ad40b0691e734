//! Performance benchmarks for within-polygon-lib
//!
//! Run with: cargo bench --package within-polygon-lib

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Point;
use gpx::{Gpx, Track, TrackSegment, Waypoint};
use within_polygon_lib::{
    Binding, Config, ExecutionContext, GeoStore, Node, ParseOptions, PropFuncArg, PropertyFunction,
    WithinPolygon, parse_polygon, vocab,
};

/// Generate a GPX track wandering around a base point
fn generate_gpx_track(num_points: usize, base_lat: f64, base_lon: f64) -> Gpx {
    let mut gpx = Gpx::default();
    let mut track = Track::default();
    let mut segment = TrackSegment::default();

    for i in 0..num_points {
        let t = i as f64 / num_points as f64;
        let lat = base_lat + t * 0.1 + (t * 50.0).sin() * 0.001;
        let lon = base_lon + t * 0.1 + (t * 30.0).cos() * 0.001;
        segment.points.push(Waypoint::new(Point::new(lon, lat)));
    }

    track.segments.push(segment);
    gpx.tracks.push(track);
    gpx
}

/// Generate multiple GPX tracks spread across an area
fn generate_multiple_tracks(num_tracks: usize, points_per_track: usize) -> Vec<Gpx> {
    (0..num_tracks)
        .map(|i| {
            let lat_offset = (i % 10) as f64 * 0.1;
            let lon_offset = (i / 10) as f64 * 0.1;
            generate_gpx_track(points_per_track, 51.5 + lat_offset, -0.1 + lon_offset)
        })
        .collect()
}

/// Regular polygon with `vertices` corners as a delimited "lat lon" string
fn circle_polygon(vertices: usize, center_lat: f64, center_lon: f64, radius: f64) -> String {
    (0..vertices)
        .map(|i| {
            let angle = i as f64 / vertices as f64 * std::f64::consts::TAU;
            format!(
                "{} {}",
                center_lat + radius * angle.sin(),
                center_lon + radius * angle.cos()
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn count_matches(function: &WithinPolygon, polygon: &str, store: &GeoStore) -> usize {
    let compiled = function
        .build(
            &PropFuncArg::Node(Node::variable("s")),
            &Node::iri(vocab::WITHIN_POLYGON),
            &PropFuncArg::Node(Node::literal(polygon)),
        )
        .unwrap();
    compiled
        .execute(Binding::new(), ExecutionContext::new(store, store))
        .count()
}

// ============================================================================
// Core Benchmarks
// ============================================================================

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let options = ParseOptions::default();

    for vertices in [4, 64, 1_024] {
        let polygon = circle_polygon(vertices, 51.5, -0.1, 0.05);
        group.throughput(Throughput::Elements(vertices as u64));
        group.bench_with_input(BenchmarkId::new("delimited", vertices), &polygon, |b, p| {
            b.iter(|| parse_polygon(p, &options).unwrap());
        });

        let wkt = format!("POLYGON (({polygon}))");
        group.bench_with_input(BenchmarkId::new("wkt", vertices), &wkt, |b, p| {
            b.iter(|| parse_polygon(p, &options).unwrap());
        });
    }

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");
    group.sample_size(20);

    // 100 tracks with 1000 points each
    let mut store = GeoStore::new(Config::default());
    store
        .add_gpx_parallel(generate_multiple_tracks(100, 1_000))
        .unwrap();
    let function = WithinPolygon::new();

    let small = circle_polygon(16, 51.55, -0.05, 0.01);
    group.bench_function("small_polygon_100k", |b| {
        b.iter(|| count_matches(&function, &small, &store));
    });

    let large = circle_polygon(16, 52.0, 0.4, 0.6);
    group.bench_function("large_polygon_100k", |b| {
        b.iter(|| count_matches(&function, &large, &store));
    });

    // Many vertices make the exact phase dominate
    let detailed = circle_polygon(1_024, 52.0, 0.4, 0.6);
    group.bench_function("detailed_polygon_100k", |b| {
        b.iter(|| count_matches(&function, &detailed, &store));
    });

    group.finish();
}

fn bench_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    group.sample_size(20);

    let tracks = generate_multiple_tracks(50, 1_000);
    let total_points = 50 * 1_000;

    group.throughput(Throughput::Elements(total_points as u64));
    group.bench_function("parallel_50x1k", |b| {
        let config = Config::default();
        b.iter(|| {
            let mut store = GeoStore::new(config.clone());
            store.add_gpx_parallel(tracks.clone()).unwrap();
        });
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(benches, bench_parse, bench_query, bench_construction);

criterion_main!(benches);
