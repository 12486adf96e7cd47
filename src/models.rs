use crate::{Error, Result};
use image::{DynamicImage, GrayImage, RgbaImage};
use nalgebra::Vector2;
use std::path::Path;
use std::sync::Arc;

pub type Point2 = nalgebra::Point2<f64>;

/// One camera frame: color buffer plus its grayscale companion
#[derive(Debug, Clone)]
pub struct Frame {
    rgba: RgbaImage,
    gray: GrayImage,
}

impl Frame {
    pub fn new(rgba: RgbaImage, gray: GrayImage) -> Result<Self> {
        if rgba.dimensions() != gray.dimensions() {
            return Err(Error::FrameSizeMismatch {
                color: rgba.dimensions(),
                gray: gray.dimensions(),
            });
        }
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyFrame(width, height));
        }
        Ok(Self { rgba, gray })
    }

    /// Build a frame from a color image, deriving the grayscale plane
    pub fn from_rgba(rgba: RgbaImage) -> Result<Self> {
        let gray = DynamicImage::ImageRgba8(rgba.clone()).to_luma8();
        Self::new(rgba, gray)
    }

    pub fn from_image(img: &DynamicImage) -> Result<Self> {
        Self::new(img.to_rgba8(), img.to_luma8())
    }

    pub fn rgba(&self) -> &RgbaImage {
        &self.rgba
    }

    pub fn gray(&self) -> &GrayImage {
        &self.gray
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.rgba.dimensions()
    }
}

/// Closed outline found in an edge map
#[derive(Debug, Clone)]
pub struct Contour {
    /// Outline vertices after straight-run compression
    pub points: Vec<imageproc::point::Point<i32>>,
    /// Hole borders sit one level below the outer border enclosing them
    pub is_hole: bool,
    pub parent: Option<usize>,
    /// Next contour at the same hierarchy level
    pub next_sibling: Option<usize>,
}

/// Rotated rectangle. `angle` is in degrees within `(-90, 0]`, `width` runs
/// along the angle's direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Point2,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
}

impl OrientedBox {
    pub fn new(center: Point2, width: f64, height: f64, angle: f64) -> Self {
        Self {
            center,
            width,
            height,
            angle,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn short_side(&self) -> f64 {
        self.width.min(self.height)
    }

    /// Corner points, starting at the one opposite to both positive axes of
    /// the box frame and going around the rectangle
    pub fn corners(&self) -> [Point2; 4] {
        let theta = self.angle.to_radians();
        let u = Vector2::new(theta.cos(), theta.sin());
        let v = Vector2::new(-theta.sin(), theta.cos());
        let half_w = u * (self.width * 0.5);
        let half_h = v * (self.height * 0.5);

        let p0 = self.center - half_w + half_h;
        let p1 = self.center - half_w - half_h;
        let p2 = self.center + half_w - half_h;
        let p3 = self.center + half_w + half_h;
        [p0, p1, p2, p3]
    }

    /// Mean of the four corners
    pub fn corner_centroid(&self) -> Point2 {
        let corners = self.corners();
        let sum = corners
            .iter()
            .fold(Vector2::zeros(), |acc, p| acc + p.coords);
        Point2::from(sum / 4.0)
    }
}

/// Box that passed single-shape acceptance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeCandidate {
    bbox: OrientedBox,
}

impl EyeCandidate {
    /// Returns `None` unless both sides are strictly positive and finite
    pub fn new(bbox: OrientedBox) -> Option<Self> {
        let valid = bbox.width.is_finite()
            && bbox.height.is_finite()
            && bbox.width > 0.0
            && bbox.height > 0.0;
        valid.then_some(Self { bbox })
    }

    pub fn bbox(&self) -> &OrientedBox {
        &self.bbox
    }
}

/// Two candidates accepted as a pair, in discovery order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyePair {
    pub first_index: usize,
    pub second_index: usize,
    pub first: EyeCandidate,
    pub second: EyeCandidate,
}

impl EyePair {
    /// Index pair with the smaller index first
    pub fn unordered_key(&self) -> (usize, usize) {
        (
            self.first_index.min(self.second_index),
            self.first_index.max(self.second_index),
        )
    }

    pub fn boxes(&self) -> [&OrientedBox; 2] {
        [self.first.bbox(), self.second.bbox()]
    }
}

/// Sprite composited over each pair, loaded once and shared read-only
#[derive(Debug, Clone)]
pub struct OverlayAsset {
    image: Arc<RgbaImage>,
}

impl OverlayAsset {
    pub fn new(image: RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::InvalidAsset(format!(
                "sprite has no pixels ({}x{})",
                width, height
            )));
        }
        Ok(Self {
            image: Arc::new(image),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let img = image::open(path.as_ref())?;
        Self::new(img.to_rgba8())
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rejects_mismatched_planes() {
        let rgba = RgbaImage::new(10, 10);
        let gray = GrayImage::new(10, 9);
        assert!(matches!(
            Frame::new(rgba, gray),
            Err(Error::FrameSizeMismatch { .. })
        ));
    }

    #[test]
    fn test_axis_aligned_corners() {
        let b = OrientedBox::new(Point2::new(10.0, 20.0), 4.0, 2.0, 0.0);
        let corners = b.corners();
        assert_eq!(corners[0], Point2::new(8.0, 21.0));
        assert_eq!(corners[2], Point2::new(12.0, 19.0));

        let c = b.corner_centroid();
        assert!((c.x - 10.0).abs() < 1e-9 && (c.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_sized_box_is_not_a_candidate() {
        let b = OrientedBox::new(Point2::new(0.0, 0.0), 0.0, 0.0, 0.0);
        assert!(EyeCandidate::new(b).is_none());
    }

    #[test]
    fn test_empty_asset_is_rejected() {
        assert!(matches!(
            OverlayAsset::new(RgbaImage::new(0, 5)),
            Err(Error::InvalidAsset(_))
        ));
    }
}
