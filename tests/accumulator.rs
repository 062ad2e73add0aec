//! Mean accumulation tests.
//!
//! These run on synthetic frames and need no fixture files.

use meanframe::{
    Frame, FrameShape, MeanFrameError, MeanImageAccumulator, compute_mean_image,
    compute_mean_image_with, expected_sample_count, is_sampled,
};

fn single_pixel_frames(values: &[u8]) -> Vec<Result<Frame, MeanFrameError>> {
    let shape = FrameShape::new(1, 1, 1);
    values
        .iter()
        .map(|&value| Frame::filled(shape, value))
        .collect()
}

fn constant_frames(count: usize, shape: FrameShape, value: u8) -> Vec<Result<Frame, MeanFrameError>> {
    (0..count).map(|_| Frame::filled(shape, value)).collect()
}

// ── sampling ───────────────────────────────────────────────────────

#[test]
fn stride_zero_samples_every_frame() {
    assert!((0..10).all(|index| is_sampled(index, 0)));
}

#[test]
fn stride_samples_every_nth_frame_from_zero() {
    let sampled: Vec<u64> = (0..10).filter(|&index| is_sampled(index, 2)).collect();
    assert_eq!(sampled, vec![0, 3, 6, 9]);
}

#[test]
fn huge_stride_only_samples_first_frame() {
    assert!(is_sampled(0, u64::MAX));
    assert!(!is_sampled(1, u64::MAX));
    assert!(!is_sampled(u64::MAX, u64::MAX));
    assert_eq!(expected_sample_count(1_000, u64::MAX), 1);
    assert_eq!(expected_sample_count(0, u64::MAX), 0);
}

#[test]
fn sample_count_is_ceiling_of_frames_over_period() {
    let shape = FrameShape::new(2, 2, 3);
    for total in 0..12_usize {
        for stride in 0..6_u64 {
            let expected = (total as u64).div_ceil(stride + 1);
            assert_eq!(expected_sample_count(total as u64, stride), expected);

            let result = compute_mean_image(constant_frames(total, shape, 7), stride);
            if total == 0 {
                assert!(matches!(result, Err(MeanFrameError::EmptySample { .. })));
            } else {
                let mean = result.expect("non-empty stream should average");
                assert_eq!(mean.sample_count, expected, "N={total} S={stride}");
                assert_eq!(mean.total_frames, total as u64);
            }
        }
    }
}

// ── mean values ────────────────────────────────────────────────────

#[test]
fn five_frame_mean_with_stride_zero() {
    let mean = compute_mean_image(single_pixel_frames(&[10, 20, 30, 40, 50]), 0).unwrap();
    assert_eq!(mean.sample_count, 5);
    assert_eq!(mean.total_frames, 5);
    assert_eq!(mean.image.as_raw(), &[30]);
}

#[test]
fn five_frame_mean_with_stride_one() {
    let mean = compute_mean_image(single_pixel_frames(&[10, 20, 30, 40, 50]), 1).unwrap();
    assert_eq!(mean.sample_count, 3);
    assert_eq!(mean.total_frames, 5);
    assert_eq!(mean.image.as_raw(), &[30]);
}

#[test]
fn stride_picks_the_right_frames() {
    // Indices 0 and 3 are sampled: (0 + 90) / 2 = 45.
    let mean = compute_mean_image(single_pixel_frames(&[0, 200, 200, 90, 200]), 2).unwrap();
    assert_eq!(mean.sample_count, 2);
    assert_eq!(mean.image.as_raw(), &[45]);
}

#[test]
fn single_frame_video_returns_the_frame_for_any_stride() {
    let shape = FrameShape::new(2, 3, 3);
    let data: Vec<u8> = (0..shape.sample_len() as u8).map(|v| v * 13).collect();
    let frame = Frame::from_raw(shape, data).unwrap();

    for stride in [0, 1, 5, 999, u64::MAX] {
        let mean = compute_mean_image([Ok(frame.clone())], stride).unwrap();
        assert_eq!(mean.sample_count, 1);
        assert_eq!(mean.total_frames, 1);
        assert_eq!(mean.image, frame);
    }
}

#[test]
fn constant_video_averages_to_the_constant() {
    let shape = FrameShape::new(4, 5, 3);
    for value in [0, 1, 128, 255] {
        for stride in [0, 1, 3, 10] {
            let mean = compute_mean_image(constant_frames(9, shape, value), stride).unwrap();
            assert!(mean.image.as_raw().iter().all(|&sample| sample == value));
            assert_eq!(mean.image.shape(), shape);
        }
    }
}

#[test]
fn mean_is_computed_per_sample() {
    let shape = FrameShape::new(1, 2, 3);
    let first = Frame::from_raw(shape, vec![0, 10, 20, 30, 40, 50]).unwrap();
    let second = Frame::from_raw(shape, vec![100, 110, 120, 130, 140, 150]).unwrap();

    let mean = compute_mean_image([Ok(first), Ok(second)], 0).unwrap();
    assert_eq!(mean.image.as_raw(), &[50, 60, 70, 80, 90, 100]);
    assert_eq!(mean.image.sample(0, 1, 2), Some(100));
}

#[test]
fn ties_round_to_even() {
    // 1.5 -> 2, 2.5 -> 2, 0.5 -> 0
    assert_eq!(compute_mean_image(single_pixel_frames(&[1, 2]), 0).unwrap().image.as_raw(), &[2]);
    assert_eq!(compute_mean_image(single_pixel_frames(&[2, 3]), 0).unwrap().image.as_raw(), &[2]);
    assert_eq!(compute_mean_image(single_pixel_frames(&[0, 1]), 0).unwrap().image.as_raw(), &[0]);
}

#[test]
fn non_ties_round_to_nearest() {
    // 31 / 3 = 10.33 -> 10, 32 / 3 = 10.67 -> 11
    assert_eq!(compute_mean_image(single_pixel_frames(&[10, 10, 11]), 0).unwrap().image.as_raw(), &[10]);
    assert_eq!(compute_mean_image(single_pixel_frames(&[10, 11, 11]), 0).unwrap().image.as_raw(), &[11]);
}

#[test]
fn ten_thousand_white_frames_do_not_overflow() {
    let shape = FrameShape::new(2, 2, 3);
    let white = Frame::filled(shape, 255).unwrap();
    let mut accumulator = MeanImageAccumulator::new(0);
    for _ in 0..20_000 {
        accumulator.push(&white).unwrap();
    }
    let mean = accumulator.finish().unwrap();
    assert_eq!(mean.sample_count, 20_000);
    assert!(mean.image.as_raw().iter().all(|&sample| sample == 255));
}

// ── degenerate streams ─────────────────────────────────────────────

#[test]
fn empty_stream_is_an_empty_sample_error() {
    let result = compute_mean_image(Vec::new(), 0);
    match result {
        Err(MeanFrameError::EmptySample {
            total_frames,
            stride,
        }) => {
            assert_eq!(total_frames, 0);
            assert_eq!(stride, 0);
        }
        other => panic!("Expected EmptySample, got: {other:?}"),
    }
}

#[test]
fn empty_accumulator_with_known_shape_still_fails() {
    let accumulator = MeanImageAccumulator::with_shape(3, FrameShape::new(8, 8, 3));
    assert!(matches!(
        accumulator.finish(),
        Err(MeanFrameError::EmptySample { total_frames: 0, stride: 3 })
    ));
}

#[test]
fn error_before_first_frame_is_an_empty_sample() {
    let frames = vec![Err(MeanFrameError::VideoDecodeError("corrupt header".into()))];
    let result = compute_mean_image(frames, 0);
    assert!(matches!(
        result,
        Err(MeanFrameError::EmptySample { total_frames: 0, .. })
    ));
}

#[test]
fn error_after_first_frame_is_propagated() {
    let shape = FrameShape::new(1, 1, 1);
    let frames = vec![
        Frame::filled(shape, 1),
        Err(MeanFrameError::VideoDecodeError("truncated packet".into())),
        Frame::filled(shape, 1),
    ];
    let result = compute_mean_image(frames, 0);
    match result {
        Err(MeanFrameError::VideoDecodeError(message)) => assert!(message.contains("truncated")),
        other => panic!("Expected VideoDecodeError, got: {other:?}"),
    }
}

// ── shape validation ───────────────────────────────────────────────

#[test]
fn changing_geometry_is_rejected() {
    let frames = vec![
        Frame::filled(FrameShape::new(2, 2, 3), 10),
        Frame::filled(FrameShape::new(2, 2, 3), 10),
        Frame::filled(FrameShape::new(3, 2, 3), 10),
    ];
    match compute_mean_image(frames, 5) {
        Err(MeanFrameError::FrameShapeMismatch {
            expected,
            found,
            frame_index,
        }) => {
            assert_eq!(expected, FrameShape::new(2, 2, 3));
            assert_eq!(found, FrameShape::new(3, 2, 3));
            assert_eq!(frame_index, 2);
        }
        other => panic!("Expected FrameShapeMismatch, got: {other:?}"),
    }
}

#[test]
fn declared_shape_is_enforced_on_first_frame() {
    let mut accumulator = MeanImageAccumulator::with_shape(0, FrameShape::new(4, 4, 3));
    let frame = Frame::filled(FrameShape::new(4, 4, 1), 0).unwrap();
    assert!(accumulator.push(&frame).is_err());
    assert_eq!(accumulator.frames_seen(), 0);
    assert_eq!(accumulator.samples_taken(), 0);
}

#[test]
fn empty_geometry_never_produces_a_mean() {
    let frames = vec![Frame::filled(FrameShape::new(0, 0, 3), 0)];
    assert!(matches!(
        compute_mean_image(frames, 0),
        Err(MeanFrameError::EmptySample { total_frames: 0, .. })
    ));

    let accumulator = MeanImageAccumulator::with_shape(0, FrameShape::new(0, 8, 1));
    assert!(accumulator.finish().is_err());
}

// ── observer ───────────────────────────────────────────────────────

#[test]
fn observer_sees_every_frame_with_its_sampling_decision() {
    let mut seen = Vec::new();
    let mean = compute_mean_image_with(
        MeanImageAccumulator::new(1),
        single_pixel_frames(&[10, 20, 30, 40, 50]),
        |index, frame, sampled| {
            seen.push((index, frame.as_raw()[0], sampled));
            Ok(())
        },
    )
    .unwrap();

    assert_eq!(
        seen,
        vec![
            (0, 10, true),
            (1, 20, false),
            (2, 30, true),
            (3, 40, false),
            (4, 50, true),
        ]
    );
    assert_eq!(mean.image.as_raw(), &[30]);
}

#[test]
fn observer_error_stops_the_fold() {
    let mut calls = 0;
    let result = compute_mean_image_with(
        MeanImageAccumulator::new(0),
        single_pixel_frames(&[1, 2, 3]),
        |index, _, _| {
            calls += 1;
            if index == 1 {
                Err(MeanFrameError::InvalidFrame("stop".into()))
            } else {
                Ok(())
            }
        },
    );
    assert!(matches!(result, Err(MeanFrameError::InvalidFrame(_))));
    assert_eq!(calls, 2);
}
