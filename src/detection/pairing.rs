use crate::config::PairingConfig;
use crate::models::{EyeCandidate, EyePair, OrientedBox};
use std::collections::HashSet;

/// How the pair predicate is evaluated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingMode {
    /// All four geometric checks
    Strict,
    /// Every ordered pair is accepted (raw candidate visualization)
    Bypass,
}

/// `max(a, b) / min(a, b)`, or `None` when the smaller side is not positive
fn side_ratio(a: f64, b: f64) -> Option<f64> {
    let lo = a.min(b);
    (lo > 0.0).then(|| a.max(b) / lo)
}

/// Whether `second` looks like the partner of `first`.
///
/// The distance and symmetry checks measure from `first`, so the relation
/// is not guaranteed to be symmetric.
pub fn is_pair(first: &OrientedBox, second: &OrientedBox, config: &PairingConfig) -> bool {
    // similar size
    let similar = match (
        side_ratio(first.width, second.width),
        side_ratio(first.height, second.height),
    ) {
        (Some(w), Some(h)) => w <= config.max_size_ratio && h <= config.max_size_ratio,
        _ => false,
    };
    if !similar {
        return false;
    }

    // similar angle
    if (first.angle - second.angle).abs() > config.max_angle_delta {
        return false;
    }

    // spacing between centroids relative to the first eye's short side
    let c1 = first.corner_centroid();
    let c2 = second.corner_centroid();
    let distance = nalgebra::distance(&c1, &c2);
    let expected = first.short_side() * config.spacing_factor;
    if distance < expected * config.distance_tolerance
        || distance > expected / config.distance_tolerance
    {
        return false;
    }

    // the second box faces the first one squarely
    let (near, far) = second.corners().iter().fold((f64::INFINITY, 0.0f64), |(near, far), p| {
        let d = nalgebra::distance(&c1, p);
        (near.min(d), far.max(d))
    });
    tracing::trace!("pair near, far = {}, {}", near, far);
    if !(near > 0.0) || far / near > config.max_symmetry_ratio {
        return false;
    }

    true
}

/// Scan every ordered pair `(i, j)`, `i != j`, in discovery order
pub fn match_pairs(
    candidates: &[EyeCandidate],
    config: &PairingConfig,
    mode: PairingMode,
) -> Vec<EyePair> {
    let mut pairs = Vec::new();
    for (i, first) in candidates.iter().enumerate() {
        for (j, second) in candidates.iter().enumerate() {
            if i == j {
                continue;
            }
            let accepted = match mode {
                PairingMode::Bypass => true,
                PairingMode::Strict => is_pair(first.bbox(), second.bbox(), config),
            };
            if accepted {
                pairs.push(EyePair {
                    first_index: i,
                    second_index: j,
                    first: *first,
                    second: *second,
                });
            }
        }
    }
    pairs
}

/// Keep only the first discovered ordering of each unordered pair
pub fn dedup_unordered(pairs: Vec<EyePair>) -> Vec<EyePair> {
    let mut seen = HashSet::new();
    pairs
        .into_iter()
        .filter(|p| seen.insert(p.unordered_key()))
        .collect()
}

/// Full pairing step: ordered scan, then deduplication when configured
pub fn find_pairs(
    candidates: &[EyeCandidate],
    config: &PairingConfig,
    mode: PairingMode,
) -> Vec<EyePair> {
    let raw = match_pairs(candidates, config, mode);
    let raw_count = raw.len();
    let pairs = if config.dedup { dedup_unordered(raw) } else { raw };
    tracing::debug!(
        "{} eye pairs ({} ordered) from {} candidates",
        pairs.len(),
        raw_count,
        candidates.len()
    );
    pairs
}
