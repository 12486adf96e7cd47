use eyesprite::{Frame, FramePipeline, OverlayAsset, PipelineConfig};
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_ellipse_mut;

pub const FRAME_WIDTH: u32 = 320;
pub const FRAME_HEIGHT: u32 = 240;

/// Centers of the two synthetic eyes
pub const LEFT_EYE: (i32, i32) = (120, 120);
pub const RIGHT_EYE: (i32, i32) = (190, 120);

/// Semi-axes of each synthetic eye (narrow and tall)
pub const EYE_RADII: (i32, i32) = (7, 21);

pub const BACKGROUND: Rgba<u8> = Rgba([200, 215, 225, 255]);
pub const EYE_COLOR: Rgba<u8> = Rgba([25, 30, 35, 255]);

/// Light frame without any shapes
pub fn blank_frame() -> Frame {
    Frame::from_rgba(RgbaImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, BACKGROUND))
        .expect("Failed to build blank frame")
}

/// Frame with dark ellipses drawn at the given centers
pub fn frame_with_eyes(centers: &[(i32, i32)]) -> Frame {
    let mut img = RgbaImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, BACKGROUND);
    for &center in centers {
        draw_filled_ellipse_mut(&mut img, center, EYE_RADII.0, EYE_RADII.1, EYE_COLOR);
    }
    Frame::from_rgba(img).expect("Failed to build eye frame")
}

/// Two eyes spaced so that every pairing check passes
pub fn eye_pair_frame() -> Frame {
    frame_with_eyes(&[LEFT_EYE, RIGHT_EYE])
}

/// 40x40 sprite: opaque magenta left half, fully transparent right half
pub fn half_transparent_sprite() -> OverlayAsset {
    let img = RgbaImage::from_fn(40, 40, |x, _| {
        if x < 20 {
            Rgba([255, 0, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    OverlayAsset::new(img).expect("Failed to build sprite")
}

pub fn make_pipeline(config: PipelineConfig) -> FramePipeline {
    FramePipeline::new(config, half_transparent_sprite()).expect("Failed to build pipeline")
}

pub fn default_pipeline() -> FramePipeline {
    make_pipeline(PipelineConfig::default())
}
