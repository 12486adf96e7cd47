use crate::config::EyeShapeConfig;
use crate::detection::contours::ContourForest;
use crate::models::{EyeCandidate, OrientedBox, Point2};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use nalgebra::Vector2;

/// Closed intervals a single eye's area and aspect must fall into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceBand {
    pub area_min: f64,
    pub area_max: f64,
    pub aspect_min: f64,
    pub aspect_max: f64,
}

impl AcceptanceBand {
    pub fn from_config(shape: &EyeShapeConfig, relaxed: bool) -> Self {
        let mut band = Self {
            area_min: shape.min_width * shape.min_height(),
            area_max: shape.max_width * shape.max_height(),
            aspect_min: shape.long_aspect * shape.tolerance,
            aspect_max: shape.long_aspect / shape.tolerance,
        };
        if relaxed {
            band.area_min *= shape.relax_factor;
            band.area_max /= shape.relax_factor;
            band.aspect_min *= shape.relax_factor;
            band.aspect_max /= shape.relax_factor;
        }
        band
    }

    pub fn contains(&self, width: f64, height: f64) -> bool {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return false;
        }
        let area = width * height;
        if area < self.area_min || area > self.area_max {
            return false;
        }
        let aspect = width.max(height) / width.min(height);
        aspect >= self.aspect_min && aspect <= self.aspect_max
    }
}

/// Single-shape eye test
pub fn accept(bbox: &OrientedBox, shape: &EyeShapeConfig, relaxed: bool) -> bool {
    AcceptanceBand::from_config(shape, relaxed).contains(bbox.width, bbox.height)
}

/// Minimum-area rotated rectangle enclosing the points.
///
/// Tries one rectangle per convex hull edge direction and keeps the
/// smallest. Returns `None` for an empty point set.
pub fn fit_box(points: &[Point<i32>]) -> Option<OrientedBox> {
    if points.is_empty() {
        return None;
    }
    let hull: Vec<Point2> = convex_hull::<i32>(points)
        .iter()
        .map(|p| Point2::new(p.x as f64, p.y as f64))
        .collect();

    if hull.len() == 1 {
        return Some(OrientedBox::new(hull[0], 0.0, 0.0, 0.0));
    }

    let mut best: Option<(f64, OrientedBox)> = None;
    for i in 0..hull.len() {
        let origin = hull[i];
        let edge = hull[(i + 1) % hull.len()] - origin;
        let len = edge.norm();
        if len == 0.0 {
            continue;
        }
        let u = edge / len;
        let v = Vector2::new(-u.y, u.x);

        let (mut min_u, mut max_u, mut min_v, mut max_v) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for p in &hull {
            let d = p - origin;
            let (pu, pv) = (d.dot(&u), d.dot(&v));
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let (width, height) = (max_u - min_u, max_v - min_v);
        let area = width * height;
        if best.as_ref().is_none_or(|(best_area, _)| area < *best_area) {
            let center = origin + u * ((min_u + max_u) * 0.5) + v * ((min_v + max_v) * 0.5);
            let angle = u.y.atan2(u.x).to_degrees();
            best = Some((area, normalize(center, width, height, angle)));
        }
    }

    best.map(|(_, b)| b)
}

/// Bring the angle into `(-90, 0]`, swapping sides for every quarter turn
fn normalize(center: Point2, mut width: f64, mut height: f64, mut angle: f64) -> OrientedBox {
    while angle > 0.0 {
        angle -= 90.0;
        std::mem::swap(&mut width, &mut height);
    }
    while angle <= -90.0 {
        angle += 90.0;
        std::mem::swap(&mut width, &mut height);
    }
    OrientedBox::new(center, width, height, angle)
}

/// Fit a box to every top-level contour and keep the ones shaped like an
/// eye, in discovery order
pub fn classify(forest: &ContourForest, shape: &EyeShapeConfig, relaxed: bool) -> Vec<EyeCandidate> {
    let band = AcceptanceBand::from_config(shape, relaxed);
    let candidates: Vec<EyeCandidate> = forest
        .top_level()
        .filter_map(|(_, contour)| fit_box(&contour.points))
        .filter(|b| band.contains(b.width, b.height))
        .filter_map(EyeCandidate::new)
        .collect();

    tracing::debug!(
        "{} eye candidates from {} contours (relaxed: {})",
        candidates.len(),
        forest.len(),
        relaxed
    );
    candidates
}
