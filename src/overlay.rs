//! Warping the sprite onto an eye pair and blending it over the frame.

use crate::config::OverlayConfig;
use crate::models::{EyePair, OrientedBox, OverlayAsset, Point2};
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use nalgebra::Matrix3;

/// 2x3 affine map `[a b c; d e f]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub m: [[f64; 3]; 2],
}

impl AffineTransform {
    /// Unique affine map taking each `src[k]` to `dst[k]`. `None` when the
    /// source points are collinear.
    pub fn from_triangles(src: [Point2; 3], dst: [Point2; 3]) -> Option<Self> {
        let s = Matrix3::new(
            src[0].x, src[1].x, src[2].x,
            src[0].y, src[1].y, src[2].y,
            1.0, 1.0, 1.0,
        );
        let d = Matrix3::new(
            dst[0].x, dst[1].x, dst[2].x,
            dst[0].y, dst[1].y, dst[2].y,
            1.0, 1.0, 1.0,
        );
        let m = d * s.try_inverse()?;
        Some(Self {
            m: [
                [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
                [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            ],
        })
    }

    pub fn apply(&self, p: Point2) -> Point2 {
        let [r0, r1] = self.m;
        Point2::new(
            r0[0] * p.x + r0[1] * p.y + r0[2],
            r1[0] * p.x + r1[1] * p.y + r1[2],
        )
    }

    fn to_projection(self) -> Option<Projection> {
        let [r0, r1] = self.m;
        Projection::from_matrix([
            r0[0] as f32, r0[1] as f32, r0[2] as f32,
            r1[0] as f32, r1[1] as f32, r1[2] as f32,
            0.0, 0.0, 1.0,
        ])
    }
}

/// Corners of both boxes nearest to and farthest from the image origin.
/// Ties go to the later corner.
pub fn pair_extremes(first: &OrientedBox, second: &OrientedBox) -> (Point2, Point2) {
    let corners = first.corners();
    let mut tl = corners[0];
    let mut br = corners[0];
    let (mut tl_dist, mut br_dist) = (tl.coords.norm(), br.coords.norm());

    for p in first.corners().into_iter().chain(second.corners()) {
        let d = p.coords.norm();
        if d <= tl_dist {
            tl = p;
            tl_dist = d;
        }
        if d >= br_dist {
            br = p;
            br_dist = d;
        }
    }
    (tl, br)
}

/// Affine map placing the sprite's top-left, top-right and bottom-right
/// corners around the pair
pub fn compute_affine(
    asset: &OverlayAsset,
    first: &OrientedBox,
    second: &OrientedBox,
    config: &OverlayConfig,
) -> Option<AffineTransform> {
    let (w, h) = (asset.width() as f64, asset.height() as f64);
    let src = [Point2::new(0.0, 0.0), Point2::new(w, 0.0), Point2::new(w, h)];

    let (tl, br) = pair_extremes(first, second);
    let delta = br - tl;
    let left = tl.x - config.left * delta.x;
    let top = tl.y - config.top * delta.y;
    let right = br.x + config.right * delta.x;
    let bottom = br.y + config.bottom * delta.y;
    let dst = [
        Point2::new(left, top),
        Point2::new(right, top),
        Point2::new(right, bottom),
    ];

    AffineTransform::from_triangles(src, dst)
}

/// Render the sprite through `transform` into a transparent layer of the
/// given size
pub fn warp(asset: &OverlayAsset, transform: &AffineTransform, size: (u32, u32)) -> RgbaImage {
    let mut layer = RgbaImage::from_pixel(size.0, size.1, Rgba([0, 0, 0, 0]));
    if let Some(projection) = transform.to_projection() {
        warp_into(
            asset.image(),
            &projection,
            Interpolation::Bilinear,
            Rgba([0, 0, 0, 0]),
            &mut layer,
        );
    }
    layer
}

/// "Over" blend of a straight-alpha layer onto an opaque background of the
/// same size
pub fn composite(background: &RgbImage, layer: &RgbaImage) -> RgbImage {
    debug_assert_eq!(background.dimensions(), layer.dimensions());
    let mut out = background.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let fg = layer.get_pixel(x, y);
        let alpha = fg[3] as f32 / 255.0;
        if alpha == 0.0 {
            continue;
        }
        let blend = |f: u8, b: u8| (f as f32 * alpha + b as f32 * (1.0 - alpha)).round() as u8;
        *px = Rgb([
            blend(fg[0], px[0]),
            blend(fg[1], px[1]),
            blend(fg[2], px[2]),
        ]);
    }
    out
}

/// Drop the alpha plane of a color frame
pub fn remove_alpha(rgba: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        Rgb([p[0], p[1], p[2]])
    })
}

/// Composites the shared sprite over every pair of a frame
#[derive(Debug, Clone)]
pub struct OverlayCompositor {
    asset: OverlayAsset,
    config: OverlayConfig,
}

impl OverlayCompositor {
    pub fn new(asset: OverlayAsset, config: OverlayConfig) -> Self {
        Self { asset, config }
    }

    pub fn asset(&self) -> &OverlayAsset {
        &self.asset
    }

    /// Warped sprite layer for one pair, or `None` if the pair's geometry
    /// admits no affine placement
    pub fn layer_for(&self, pair: &EyePair, size: (u32, u32)) -> Option<RgbaImage> {
        let transform =
            compute_affine(&self.asset, pair.first.bbox(), pair.second.bbox(), &self.config)?;
        Some(warp(&self.asset, &transform, size))
    }

    /// Blend the sprite for each pair in order, each result becoming the
    /// next pair's background
    pub fn render(&self, background: RgbImage, pairs: &[EyePair]) -> RgbImage {
        let size = background.dimensions();
        pairs.iter().fold(background, |canvas, pair| match self.layer_for(pair, size) {
            Some(layer) => composite(&canvas, &layer),
            None => {
                tracing::debug!(
                    "skipping pair ({}, {}): degenerate placement",
                    pair.first_index,
                    pair.second_index
                );
                canvas
            }
        })
    }
}
