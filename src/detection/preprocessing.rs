use image::GrayImage;
use imageproc::contrast::{otsu_level, threshold, ThresholdType};
use imageproc::edges::canny;
use imageproc::filter::separable_filter_equal;

/// Sigma OpenCV derives from a kernel size when none is given
pub fn sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian taps
pub fn gaussian_kernel(kernel_size: u32) -> Vec<f32> {
    let sigma = sigma_for_kernel(kernel_size);
    let center = (kernel_size / 2) as f32;
    let taps: Vec<f32> = (0..kernel_size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = taps.iter().sum();
    taps.into_iter().map(|t| t / sum).collect()
}

/// Gaussian smoothing with a square kernel
pub fn blur(gray: &GrayImage, kernel_size: u32) -> GrayImage {
    let kernel = gaussian_kernel(kernel_size);
    separable_filter_equal(gray, &kernel)
}

/// Inverted binary threshold at the Otsu split point.
///
/// Returns the binary image and the split value. A zero-variance image
/// yields a split of 0.
pub fn binarize(blurred: &GrayImage) -> (GrayImage, u8) {
    let (lo, hi) = blurred
        .pixels()
        .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[0]), hi.max(p[0])));
    let level = if lo >= hi { 0 } else { otsu_level(blurred) };
    (threshold(blurred, level, ThresholdType::BinaryInverted), level)
}

/// Canny thresholds derived from the binarization split: `(0.5 * high, high)`
pub fn edge_thresholds(high: u8) -> (f32, f32) {
    let high = high as f32;
    (0.5 * high, high)
}

/// Canny edge map with thresholds derived from the split value
pub fn detect_edges(binary: &GrayImage, high_threshold: u8) -> GrayImage {
    let (low, high) = edge_thresholds(high_threshold);
    tracing::debug!("canny threshold low, high = {}, {}", low, high);
    // canny keeps magnitudes >= threshold; a zero threshold must still
    // exclude flat regions
    canny(binary, low.max(f32::MIN_POSITIVE), high.max(f32::MIN_POSITIVE))
}
