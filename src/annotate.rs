//! Debug drawing: pair outlines, stage label and size guides.

use crate::config::{AnnotationConfig, EyeShapeConfig};
use crate::models::{EyePair, OrientedBox};
use crate::schedule::Stage;
use crate::{Error, Result};
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use std::sync::Arc;

/// Font used for the stage label, shared across frames
#[derive(Clone)]
pub struct LabelFont(Arc<FontVec>);

impl LabelFont {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(bytes).map_err(|e| Error::Font(e.to_string()))?;
        Ok(Self(Arc::new(font)))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_bytes(std::fs::read(path.as_ref())?)
    }
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LabelFont")
    }
}

pub fn draw_box(canvas: &mut RgbImage, bbox: &OrientedBox, color: Rgb<u8>) {
    let corners = bbox.corners();
    for k in 0..4 {
        let a = corners[k];
        let b = corners[(k + 1) % 4];
        draw_line_segment_mut(
            canvas,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            color,
        );
    }
}

/// Outline both boxes of every pair
pub fn draw_pairs(canvas: &mut RgbImage, pairs: &[EyePair], config: &AnnotationConfig) {
    let color = Rgb(config.eye_color);
    for pair in pairs {
        for bbox in pair.boxes() {
            draw_box(canvas, bbox, color);
        }
    }
}

/// Stage name at the configured anchor
pub fn draw_label(canvas: &mut RgbImage, stage: Stage, font: &LabelFont, config: &AnnotationConfig) {
    let (x, y) = config.label_anchor;
    draw_text_mut(
        canvas,
        Rgb(config.eye_color),
        x,
        y,
        PxScale::from(config.label_scale),
        font.0.as_ref(),
        stage.label(),
    );
}

/// Reference rectangles for the smallest and largest accepted eye
pub fn draw_size_guides(canvas: &mut RgbImage, shape: &EyeShapeConfig, config: &AnnotationConfig) {
    let (x, y) = config.guide_anchor;
    let color = Rgb(config.guide_color);
    for (long, short) in [
        (shape.min_height(), shape.min_width),
        (shape.max_height(), shape.max_width),
    ] {
        let (w, h) = (long.round() as u32, short.round() as u32);
        if w > 0 && h > 0 {
            draw_hollow_rect_mut(canvas, Rect::at(x, y).of_size(w, h), color);
        }
    }
}
