//! Image Comparison Benchmarks
//!
//! Benchmarks for fuzzy comparison, PNG encoding and identifier sanitizing.
//!
//! Run with: `cargo bench --bench compare_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, Rgba, RgbaImage};
use mirada::{encode_png, sanitize_identifier, ImageComparator};

fn gradient(width: u32, height: u32, shift: u8) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x % 256) as u8,
            (y % 256) as u8,
            ((x + y) % 256) as u8 ^ shift,
            255,
        ])
    });
    DynamicImage::ImageRgba8(img)
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");
    let comparator = ImageComparator::default();

    let sizes = vec![(64, 64, "64x64"), (320, 240, "320x240"), (1280, 800, "1280x800")];

    for (width, height, name) in sizes {
        let reference = gradient(width, height, 0);
        let candidate = gradient(width, height, 3);
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(reference, candidate),
            |bench, (r, a)| {
                bench.iter(|| {
                    let result = comparator.compare(black_box(a), black_box(r));
                    black_box(result);
                });
            },
        );
    }

    group.finish();
}

fn bench_compare_identical(c: &mut Criterion) {
    let img = gradient(1280, 800, 0);
    let comparator = ImageComparator::default();
    c.bench_function("compare_identical_1280x800", |bench| {
        bench.iter(|| black_box(comparator.compare(black_box(&img), black_box(&img))));
    });
}

fn bench_encode_png(c: &mut Criterion) {
    let img = gradient(320, 240, 0).to_rgba8();
    c.bench_function("encode_png_320x240", |bench| {
        bench.iter(|| black_box(encode_png(black_box(&img)).unwrap()));
    });
}

fn bench_sanitize(c: &mut Criterion) {
    c.bench_function("sanitize_identifier", |bench| {
        bench.iter(|| black_box(sanitize_identifier(black_box("main navigation / hero-banner v2"))));
    });
}

criterion_group!(
    benches,
    bench_compare,
    bench_compare_identical,
    bench_encode_png,
    bench_sanitize
);
criterion_main!(benches);
