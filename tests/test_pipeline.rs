//! End-to-end tests for single frames.
//!
//! Tests cover:
//! - Detecting exactly one pair from two synthetic eyes
//! - Compositing only inside the warped sprite
//! - Empty detection sets leaving the frame untouched
//! - Early-exit debug stages

mod common;

use common::*;
use eyesprite::models::Point2;

fn near(p: Point2, center: (i32, i32), tolerance: f64) -> bool {
    (p.x - center.0 as f64).abs() <= tolerance && (p.y - center.1 as f64).abs() <= tolerance
}

#[test]
fn test_two_eyes_make_one_pair() -> anyhow::Result<()> {
    let pipeline = default_pipeline();
    let frame = eye_pair_frame();

    let output = pipeline.process(&frame, Stage::AllPairs)?;

    assert_eq!(output.candidates.len(), 2, "candidates: {:?}", output.candidates);
    assert_eq!(output.pairs.len(), 1);

    let pair = &output.pairs[0];
    for bbox in pair.boxes() {
        assert!(bbox.width > 0.0 && bbox.height > 0.0);
    }
    let centers = [pair.first.bbox().center, pair.second.bbox().center];
    assert!(centers.iter().any(|c| near(*c, LEFT_EYE, 2.0)));
    assert!(centers.iter().any(|c| near(*c, RIGHT_EYE, 2.0)));

    Ok(())
}

#[test]
fn test_output_differs_only_under_sprite() -> anyhow::Result<()> {
    let pipeline = default_pipeline();
    let frame = eye_pair_frame();

    let output = pipeline.process(&frame, Stage::AllPairs)?;
    assert_eq!(output.image.dimensions(), frame.dimensions());
    assert_eq!(output.pairs.len(), 1);

    let layer = pipeline
        .compositor()
        .layer_for(&output.pairs[0], frame.dimensions())
        .expect("pair should have an affine placement");

    let mut changed = 0;
    let mut untouched = 0;
    for (x, y, px) in output.image.enumerate_pixels() {
        let input = frame.rgba().get_pixel(x, y);
        if layer.get_pixel(x, y)[3] == 0 {
            assert_eq!(px, input, "pixel ({}, {}) outside the sprite changed", x, y);
            untouched += 1;
        } else if px != input {
            changed += 1;
        }
    }
    assert!(changed > 0, "sprite was not composited");
    assert!(untouched > 0, "sprite covered the whole frame");

    Ok(())
}

#[test]
fn test_both_orderings_without_dedup() -> anyhow::Result<()> {
    let mut config = PipelineConfig::default();
    config.pairing.dedup = false;
    let pipeline = make_pipeline(config);

    let output = pipeline.process(&eye_pair_frame(), Stage::AllPairs)?;
    assert_eq!(output.pairs.len(), 2);
    assert_eq!(output.pairs[0].unordered_key(), output.pairs[1].unordered_key());
    assert_ne!(output.pairs[0].first_index, output.pairs[1].first_index);

    Ok(())
}

#[test]
fn test_blank_frame_is_returned_unchanged() -> anyhow::Result<()> {
    let pipeline = default_pipeline();
    let frame = blank_frame();

    let output = pipeline.process(&frame, Stage::AllPairs)?;
    assert!(output.candidates.is_empty());
    assert!(output.pairs.is_empty());
    assert_eq!(&output.image, frame.rgba());

    Ok(())
}

#[test]
fn test_single_eye_has_no_pair() -> anyhow::Result<()> {
    let pipeline = default_pipeline();
    let frame = frame_with_eyes(&[LEFT_EYE]);

    let output = pipeline.process(&frame, Stage::AllPairs)?;
    assert_eq!(output.candidates.len(), 1);
    assert!(output.pairs.is_empty());
    assert_eq!(&output.image, frame.rgba());

    Ok(())
}

#[test]
fn test_eyes_too_far_apart_are_not_paired() -> anyhow::Result<()> {
    let pipeline = default_pipeline();
    let frame = frame_with_eyes(&[(60, 120), (260, 120)]);

    let output = pipeline.process(&frame, Stage::AllPairs)?;
    assert_eq!(output.candidates.len(), 2);
    assert!(output.pairs.is_empty());

    // the debug pairing stage shows them anyway
    let debug = pipeline.process(&frame, Stage::SinglePair)?;
    assert_eq!(debug.pairs.len(), 1);
    assert_eq!(&debug.image, frame.rgba());

    Ok(())
}

#[test]
fn test_early_stages_return_intermediate_buffers() -> anyhow::Result<()> {
    let pipeline = default_pipeline();
    let frame = eye_pair_frame();
    let (cx, cy) = (LEFT_EYE.0 as u32, LEFT_EYE.1 as u32);

    let original = pipeline.process(&frame, Stage::Original)?;
    assert_eq!(&original.image, frame.rgba());
    assert!(original.candidates.is_empty());

    let blur = pipeline.process(&frame, Stage::Blur)?;
    let p = blur.image.get_pixel(cx, cy);
    assert!(p[0] == p[1] && p[1] == p[2] && p[0] < 100);

    let filter = pipeline.process(&frame, Stage::Filter)?;
    assert_eq!(filter.image.get_pixel(cx, cy).0, [255, 255, 255, 255]);
    assert_eq!(filter.image.get_pixel(5, 5).0, [0, 0, 0, 255]);

    let edges = pipeline.process(&frame, Stage::Edges)?;
    assert_eq!(edges.image.get_pixel(cx, cy).0, [0, 0, 0, 255]);
    assert!(edges.image.pixels().any(|p| p[0] == 255));
    assert!(edges.pairs.is_empty());

    Ok(())
}

#[test]
fn test_annotation_outlines_pairs() -> anyhow::Result<()> {
    let mut config = PipelineConfig::default();
    config.annotation.enabled = true;
    let pipeline = make_pipeline(config);
    let frame = eye_pair_frame();

    let output = pipeline.process(&frame, Stage::SinglePair)?;
    assert_eq!(output.pairs.len(), 1);
    assert!(output.image.pixels().any(|p| p.0 == [255, 0, 0, 255]));

    Ok(())
}

#[test]
fn test_frames_are_independent() -> anyhow::Result<()> {
    let pipeline = default_pipeline();
    let eyes = eye_pair_frame();

    let first = pipeline.process(&eyes, Stage::AllPairs)?;
    let blank = pipeline.process(&blank_frame(), Stage::AllPairs)?;
    let again = pipeline.process(&eyes, Stage::AllPairs)?;

    assert!(blank.pairs.is_empty());
    assert_eq!(first.pairs, again.pairs);
    assert_eq!(first.image, again.image);

    Ok(())
}
