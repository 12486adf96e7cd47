//! Eye-shape detection: preprocessing, contour tracing, single-shape
//! classification and pairing.

pub mod candidates;
pub mod contours;
pub mod pairing;
pub mod preprocessing;

pub use candidates::{accept, classify, fit_box, AcceptanceBand};
pub use contours::{extract, ContourForest};
pub use pairing::{find_pairs, is_pair, match_pairs, PairingMode};
