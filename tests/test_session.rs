//! Integration tests for the live session, debug dumps and configuration files.

mod common;

use common::*;
use eyesprite::{Error, LiveSession, ManualClock};
use std::time::Duration;

#[test]
fn test_session_follows_the_clock() -> anyhow::Result<()> {
    let mut session = LiveSession::new(default_pipeline(), ManualClock::new(), true);
    let frame = eye_pair_frame();

    let out = session.next_frame(&frame)?;
    assert_eq!(out.stage, Stage::Original);
    assert_eq!(&out.image, frame.rgba());

    session.clock().set_elapsed(Duration::from_millis(1500));
    assert_eq!(session.next_frame(&frame)?.stage, Stage::Blur);

    session.clock().set_elapsed(Duration::from_secs(10));
    let candidate = session.next_frame(&frame)?;
    assert_eq!(candidate.stage, Stage::Candidate);
    assert_eq!(candidate.candidates.len(), 2);

    session.clock().set_elapsed(Duration::from_secs(20));
    let composited = session.next_frame(&frame)?;
    assert_eq!(composited.stage, Stage::AllPairs);
    assert_eq!(composited.pairs.len(), 1);
    assert_ne!(&composited.image, frame.rgba());

    session.clock().set_elapsed(Duration::from_secs(240));
    assert_eq!(session.next_frame(&frame)?.stage, Stage::Original);

    Ok(())
}

#[test]
fn test_session_without_visualization_always_composites() -> anyhow::Result<()> {
    let mut session = LiveSession::new(default_pipeline(), ManualClock::new(), false);
    let frame = eye_pair_frame();

    for _ in 0..3 {
        let out = session.next_frame(&frame)?;
        assert_eq!(out.stage, Stage::AllPairs);
        assert_eq!(out.pairs.len(), 1);
        session.clock().advance(Duration::from_secs(1));
    }

    Ok(())
}

#[test]
fn test_debug_dump_writes_every_buffer() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug_dir = dir.path().join("debug");
    let pipeline = default_pipeline().with_debug(debug_dir.clone())?;

    pipeline.process(&eye_pair_frame(), Stage::AllPairs)?;
    pipeline.process(&eye_pair_frame(), Stage::Blur)?;

    for step in ["00_input", "01_blur", "02_filter", "03_edges", "04_candidates", "05_output"] {
        assert!(debug_dir.join(step).join("0001.png").exists(), "missing {}", step);
    }
    // the blur-stage frame stops after its blurred buffer
    assert!(debug_dir.join("01_blur").join("0002.png").exists());
    assert!(!debug_dir.join("02_filter").join("0002.png").exists());
    assert!(debug_dir.join("05_output").join("0002.png").exists());

    Ok(())
}

#[test]
fn test_debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("stale.png"), b"x")?;

    let result = default_pipeline().with_debug(dir.path().to_path_buf());
    assert!(matches!(result, Err(Error::DebugOutput(_))));

    Ok(())
}

#[test]
fn test_config_file_overrides_defaults() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "pairing": { "dedup": false }, "schedule": { "step_ms": 1000 } }"#,
    )?;

    let config = PipelineConfig::from_json_file(&path)?;
    assert!(!config.pairing.dedup);
    assert_eq!(config.schedule.step_ms, 1000);
    assert_eq!(config.shape.long_aspect, 3.0);

    let mut session = LiveSession::new(make_pipeline(config), ManualClock::new(), true);
    session.clock().set_elapsed(Duration::from_millis(500));
    assert_eq!(session.next_frame(&blank_frame())?.stage, Stage::Blur);

    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "blur_kernel": 4 }"#)?;
    assert!(matches!(
        PipelineConfig::from_json_file(&path),
        Err(Error::Config(_))
    ));

    std::fs::write(&path, "not json")?;
    assert!(matches!(
        PipelineConfig::from_json_file(&path),
        Err(Error::ConfigParse(_))
    ));

    Ok(())
}

#[test]
fn test_mismatched_frame_planes_are_rejected() {
    let rgba = image::RgbaImage::new(16, 16);
    let gray = image::GrayImage::new(8, 16);
    assert!(matches!(
        Frame::new(rgba, gray),
        Err(Error::FrameSizeMismatch { .. })
    ));
}
