mod fixtures;
pub use fixtures::*;

// Re-export commonly used types for tests
pub use eyesprite::{Frame, FrameOutput, FramePipeline, OverlayAsset, PipelineConfig, Stage};
