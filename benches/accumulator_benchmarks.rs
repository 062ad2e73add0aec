//! Benchmarks for accumulation and end-to-end averaging.
//!
//! Run with: cargo bench
//!
//! The decoding benchmarks require fixture files from
//! `tests/fixtures/generate_fixtures.sh` and are skipped without them.

use std::{hint::black_box, path::Path};

use criterion::{BenchmarkId, Criterion, Throughput};
use meanframe::{
    FfmpegLogLevel, Frame, FrameShape, MeanImageAccumulator, PixelFormat, VideoFile,
    compute_mean_image,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn synthetic_frames(count: usize, shape: FrameShape) -> Vec<Frame> {
    (0..count)
        .map(|index| Frame::filled(shape, (index % 256) as u8).unwrap())
        .collect()
}

fn benchmark_accumulate(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("accumulate 1080p RGB");
    let shape = FrameShape::new(1080, 1920, 3);
    let frames = synthetic_frames(8, shape);
    group.throughput(Throughput::Bytes((shape.sample_len() * frames.len()) as u64));

    for stride in [0_u64, 1, 7] {
        group.bench_with_input(BenchmarkId::from_parameter(stride), &stride, |bencher, &stride| {
            bencher.iter(|| {
                let mut accumulator = MeanImageAccumulator::with_shape(stride, shape);
                for frame in &frames {
                    accumulator.push(black_box(frame)).unwrap();
                }
                black_box(accumulator.finish().unwrap())
            });
        });
    }

    group.finish();
}

fn benchmark_finish(criterion: &mut Criterion) {
    let shape = FrameShape::new(720, 1280, 3);
    let frames = synthetic_frames(3, shape);

    criterion.bench_function("finish 720p mean (3 samples)", |bencher| {
        bencher.iter_batched(
            || {
                let mut accumulator = MeanImageAccumulator::new(0);
                for frame in &frames {
                    accumulator.push(frame).unwrap();
                }
                accumulator
            },
            |accumulator| black_box(accumulator.finish().unwrap()),
            criterion::BatchSize::LargeInput,
        );
    });
}

fn benchmark_video_mean(criterion: &mut Criterion) {
    meanframe::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let mut group = criterion.benchmark_group("video mean");
    group.sample_size(10);

    for (name, format) in [("RGB8", PixelFormat::Rgb8), ("Gray8", PixelFormat::Gray8)] {
        group.bench_function(name, |bencher| {
            bencher.iter(|| {
                let mut video = VideoFile::open(SAMPLE_VIDEO).unwrap();
                let _mean = compute_mean_image(video.frames(format).unwrap(), 9).unwrap();
            });
        });
    }

    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_accumulate,
    benchmark_finish,
    benchmark_video_mean,
);
criterion::criterion_main!(benches);
