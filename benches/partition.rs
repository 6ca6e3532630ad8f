use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, RgbaImage};
use slicer::{
    build_archive, ArchiveEntry, ExportConfig, Exporter, ImageFrame, Layout, Orientation,
    PngRegionEncoder, SliceStore,
};
use std::hint::black_box;

const SIZE: u32 = 1000;

// Full-width grid of `count` lines per orientation
fn grid_layout(count: u32) -> Layout {
    let mut store = SliceStore::new();
    store.load_frame(ImageFrame::new(SIZE, SIZE).unwrap());
    let step = SIZE / (count + 1);
    for i in 1..=count {
        store.add_line(Orientation::Horizontal, i * step, 0);
    }
    for i in 1..=count {
        store.add_line(Orientation::Vertical, i * step, 0);
    }
    store.snapshot().unwrap()
}

// Lines placed at random, so most of them end up bounded by earlier ones
fn random_layout(count: usize) -> Layout {
    let mut store = SliceStore::new();
    store.load_frame(ImageFrame::new(SIZE, SIZE).unwrap());
    for i in 0..count {
        let orientation = if i % 2 == 0 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        store.add_line(
            orientation,
            rand::random::<u32>() % SIZE,
            rand::random::<u32>() % SIZE,
        );
    }
    store.snapshot().unwrap()
}

fn bench_partition(c: &mut Criterion) {
    let mut group = c.benchmark_group("partition");
    for count in [2u32, 8, 32, 64] {
        let layout = grid_layout(count);
        group.bench_with_input(BenchmarkId::new("grid", count), &layout, |b, layout| {
            b.iter(|| black_box(layout.partition()))
        });

        let layout = random_layout(count as usize * 2);
        group.bench_with_input(BenchmarkId::new("random", count), &layout, |b, layout| {
            b.iter(|| black_box(layout.partition()))
        });
    }
    group.finish();
}

fn bench_archive(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_archive");
    for entries in [1usize, 16, 128] {
        let payload: Vec<ArchiveEntry> = (0..entries)
            .map(|i| ArchiveEntry::new(format!("image-{}.png", i + 1), vec![i as u8; 64 * 1024]))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(entries), &payload, |b, payload| {
            b.iter(|| black_box(build_archive(payload).unwrap()))
        });
    }
    group.finish();
}

// Compare sequential vs parallel encoding
fn bench_export_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("export_parallel");
    let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    }));
    let layout = grid_layout(4);
    let encoder = PngRegionEncoder::new(&img);

    for parallel in [false, true] {
        let exporter = Exporter::new(ExportConfig::new(parallel, "bench"));
        group.bench_with_input(
            BenchmarkId::new("collect_entries", if parallel { "parallel" } else { "sequential" }),
            &layout,
            |b, layout| b.iter(|| black_box(exporter.collect_entries(layout, "bench", &encoder))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_partition, bench_archive, bench_export_parallel);
criterion_main!(benches);
