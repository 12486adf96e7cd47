pub mod annotate;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod overlay;
pub mod pipeline;
pub mod schedule;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use models::{Contour, EyeCandidate, EyePair, Frame, OrientedBox, OverlayAsset, Point2};
pub use overlay::OverlayCompositor;
pub use pipeline::{DebugConfig, FrameOutput, FramePipeline, LiveSession, PipelineContext};
pub use schedule::{Clock, ManualClock, Stage, StageScheduler, SystemClock};
