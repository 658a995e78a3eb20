use std::io::Cursor;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use drf_decoder::{DecoderConfig, DocumentReader, LazyPolicy};
use drf_encoder::DocumentEncoder;
use drf_tests::{gradient, lazy_config, sample_document};
use drf_types::PixelFormat;

fn many_images(count: usize, side: u32) -> Vec<u8> {
    let pixels = gradient((side * side) as usize);
    let mut encoder = DocumentEncoder::new();
    for i in 0..count {
        encoder.add_image(PixelFormat::Gray8, side, side, &format!("img{i}"), &pixels);
    }
    encoder.encode().unwrap()
}

fn bench_read_lazy_vs_eager(c: &mut Criterion) {
    let payload = many_images(16, 256);
    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("lazy", |b| {
        b.iter(|| {
            DocumentReader::new(Cursor::new(payload.as_slice()), lazy_config())
                .read()
                .unwrap()
        });
    });
    group.bench_function("eager", |b| {
        b.iter(|| {
            DocumentReader::new(Cursor::new(payload.as_slice()), DecoderConfig::eager())
                .read()
                .unwrap()
        });
    });

    group.finish();
}

fn bench_first_vs_steady_access(c: &mut Criterion) {
    let payload = sample_document();
    let mut group = c.benchmark_group("access");

    group.bench_function("first", |b| {
        b.iter(|| {
            let doc = DocumentReader::new(Cursor::new(payload.as_slice()), lazy_config())
                .read()
                .unwrap();
            doc.regions[2].as_image().unwrap().pixels().unwrap().len()
        });
    });

    let doc = DocumentReader::new(Cursor::new(payload.as_slice()), lazy_config())
        .read()
        .unwrap();
    let photo = doc.regions[2].as_image().unwrap();
    photo.force().unwrap();
    group.bench_function("steady", |b| {
        b.iter(|| photo.pixels().unwrap().len());
    });

    group.finish();
}

fn bench_metadata_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("metadata_scan");

    for count in [4, 32, 128] {
        let payload = many_images(count, 128);
        group.bench_with_input(BenchmarkId::from_parameter(count), &payload, |b, payload| {
            b.iter(|| {
                let doc = DocumentReader::new(
                    Cursor::new(payload.as_slice()),
                    DecoderConfig {
                        lazy_policy: LazyPolicy::Always,
                        ..DecoderConfig::default()
                    },
                )
                .read()
                .unwrap();
                doc.images().map(|image| image.width().unwrap()).sum::<u32>()
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_read_lazy_vs_eager,
    bench_first_vs_steady_access,
    bench_metadata_scan
);
criterion_main!(benches);
