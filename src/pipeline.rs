use crate::annotate::{self, LabelFont};
use crate::config::PipelineConfig;
use crate::detection::pairing::PairingMode;
use crate::detection::{candidates, contours, pairing, preprocessing};
use crate::models::{EyeCandidate, EyePair, Frame, OverlayAsset};
use crate::overlay::{remove_alpha, OverlayCompositor};
use crate::schedule::{Clock, Stage, StageScheduler};
use crate::{Error, Result};
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

/// Context available to every frame
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
    pub label_font: Option<LabelFont>,
}

/// Result of one frame
#[derive(Debug, Clone)]
pub struct FrameOutput {
    /// Composited frame, or the stage's intermediate buffer
    pub image: RgbaImage,
    pub stage: Stage,
    /// Empty for stages before candidate classification
    pub candidates: Vec<EyeCandidate>,
    pub pairs: Vec<EyePair>,
}

/// Intermediate buffers of one frame, keyed by their debug directory
#[derive(Default)]
struct FrameTrace {
    buffers: Vec<(&'static str, DynamicImage)>,
}

impl FrameTrace {
    fn record(&mut self, enabled: bool, name: &'static str, image: impl FnOnce() -> DynamicImage) {
        if enabled {
            self.buffers.push((name, image()));
        }
    }
}

/// Per-frame eye detection and overlay pipeline.
///
/// Holds only load-once state (configuration, sprite, font). Every
/// intermediate result is owned by the call that produced it.
pub struct FramePipeline {
    config: PipelineConfig,
    compositor: OverlayCompositor,
    context: PipelineContext,
    frames_seen: AtomicUsize,
}

impl FramePipeline {
    pub fn new(config: PipelineConfig, asset: OverlayAsset) -> Result<Self> {
        config.validate()?;
        let compositor = OverlayCompositor::new(asset, config.overlay.clone());
        Ok(Self {
            config,
            compositor,
            context: PipelineContext::default(),
            frames_seen: AtomicUsize::new(0),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn compositor(&self) -> &OverlayCompositor {
        &self.compositor
    }

    pub fn with_label_font(mut self, font: LabelFont) -> Self {
        self.context.label_font = Some(font);
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(Error::DebugOutput(format!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        self.context.debug = Some(DebugConfig {
            output_dir,
            enabled: true,
        });

        Ok(self)
    }

    fn debug_enabled(&self) -> bool {
        self.context.debug.as_ref().is_some_and(|d| d.enabled)
    }

    /// Run one frame through the pipeline, stopping at `stage`
    pub fn process(&self, frame: &Frame, stage: Stage) -> Result<FrameOutput> {
        let frame_index = self.frames_seen.fetch_add(1, Ordering::Relaxed);
        let dump = self.debug_enabled();
        let mut trace = FrameTrace::default();
        trace.record(dump, "00_input", || DynamicImage::ImageRgba8(frame.rgba().clone()));

        let output = self.run_stages(frame, stage, dump, &mut trace);
        trace.record(dump, "05_output", || DynamicImage::ImageRgba8(output.image.clone()));

        tracing::debug!(
            "frame {}: stage {}, {} candidates, {} pairs",
            frame_index,
            stage,
            output.candidates.len(),
            output.pairs.len()
        );

        self.save_debug_output(frame_index, &trace)?;
        Ok(output)
    }

    fn run_stages(&self, frame: &Frame, stage: Stage, dump: bool, trace: &mut FrameTrace) -> FrameOutput {
        if stage == Stage::Original {
            return self.intermediate(remove_alpha(frame.rgba()), stage);
        }

        let blurred = preprocessing::blur(frame.gray(), self.config.blur_kernel);
        trace.record(dump, "01_blur", || DynamicImage::ImageLuma8(blurred.clone()));
        if stage == Stage::Blur {
            return self.intermediate(promote(&blurred), stage);
        }

        let (binary, high_threshold) = preprocessing::binarize(&blurred);
        trace.record(dump, "02_filter", || DynamicImage::ImageLuma8(binary.clone()));
        if stage == Stage::Filter {
            return self.intermediate(promote(&binary), stage);
        }

        let edges = preprocessing::detect_edges(&binary, high_threshold);
        trace.record(dump, "03_edges", || DynamicImage::ImageLuma8(edges.clone()));
        if stage == Stage::Edges {
            return self.intermediate(promote(&edges), stage);
        }

        let forest = contours::extract(&edges);
        let candidates = candidates::classify(&forest, &self.config.shape, stage.relaxes_shape());

        let mode = if stage.bypasses_pairing() {
            PairingMode::Bypass
        } else {
            PairingMode::Strict
        };
        let pairs = pairing::find_pairs(&candidates, &self.config.pairing, mode);

        let mut canvas = remove_alpha(frame.rgba());
        if self.config.annotation.enabled {
            annotate::draw_pairs(&mut canvas, &pairs, &self.config.annotation);
        }
        trace.record(dump, "04_candidates", || DynamicImage::ImageRgb8(canvas.clone()));

        if stage.composites() {
            canvas = self.compositor.render(canvas, &pairs);
        }

        FrameOutput {
            image: self.finish(canvas, stage),
            stage,
            candidates,
            pairs,
        }
    }

    fn intermediate(&self, canvas: RgbImage, stage: Stage) -> FrameOutput {
        FrameOutput {
            image: self.finish(canvas, stage),
            stage,
            candidates: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// Apply label and size guides, then restore an opaque alpha plane
    fn finish(&self, mut canvas: RgbImage, stage: Stage) -> RgbaImage {
        let annotation = &self.config.annotation;
        if annotation.enabled {
            if let Some(font) = &self.context.label_font {
                annotate::draw_label(&mut canvas, stage, font, annotation);
            }
            if annotation.draw_size_guides {
                annotate::draw_size_guides(&mut canvas, &self.config.shape, annotation);
            }
        }
        DynamicImage::ImageRgb8(canvas).to_rgba8()
    }

    /// Save debug output if debug mode is enabled
    fn save_debug_output(&self, frame_index: usize, trace: &FrameTrace) -> Result<()> {
        let Some(debug_config) = &self.context.debug else {
            return Ok(());
        };
        if !debug_config.enabled {
            return Ok(());
        }

        for (step_dir_name, image) in &trace.buffers {
            let step_dir = debug_config.output_dir.join(step_dir_name);
            std::fs::create_dir_all(&step_dir)?;

            let filename = format!("{:04}.png", frame_index + 1);
            image
                .save(step_dir.join(&filename))
                .map_err(|e| Error::DebugOutput(format!("Failed to save debug image: {}", e)))?;
            tracing::debug!("saved {}/{}", step_dir_name, filename);
        }
        Ok(())
    }
}

fn promote(gray: &GrayImage) -> RgbImage {
    DynamicImage::ImageLuma8(gray.clone()).to_rgb8()
}

/// Live camera loop: the scheduler picks the stage for every frame
pub struct LiveSession<C: Clock> {
    pipeline: FramePipeline,
    scheduler: StageScheduler,
    clock: C,
    /// Cycle through the debug stages instead of always compositing
    visualize: bool,
}

impl<C: Clock> LiveSession<C> {
    pub fn new(pipeline: FramePipeline, clock: C, visualize: bool) -> Self {
        let scheduler = StageScheduler::new(&pipeline.config().schedule, clock.now());
        Self {
            pipeline,
            scheduler,
            clock,
            visualize,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn pipeline(&self) -> &FramePipeline {
        &self.pipeline
    }

    pub fn next_frame(&mut self, frame: &Frame) -> Result<FrameOutput> {
        let stage = if self.visualize {
            self.scheduler.advance(self.clock.now())
        } else {
            Stage::AllPairs
        };
        self.pipeline.process(frame, stage)
    }
}
