use crate::models::Contour;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

/// Contours of an edge map with two-level sibling links.
///
/// Outer borders form the top level; hole borders are chained with the
/// other holes of the same outer border.
#[derive(Debug, Clone, Default)]
pub struct ContourForest {
    pub contours: Vec<Contour>,
}

impl ContourForest {
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// First contour of the top level
    pub fn first_top_level(&self) -> Option<usize> {
        self.contours.iter().position(|c| !c.is_hole)
    }

    /// Walk the top level through the sibling links
    pub fn top_level(&self) -> SiblingIter<'_> {
        SiblingIter {
            forest: self,
            next: self.first_top_level(),
        }
    }
}

pub struct SiblingIter<'a> {
    forest: &'a ContourForest,
    next: Option<usize>,
}

impl<'a> Iterator for SiblingIter<'a> {
    type Item = (usize, &'a Contour);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.next?;
        let contour = self.forest.contours.get(idx)?;
        self.next = contour.next_sibling;
        Some((idx, contour))
    }
}

/// Trace every border in the edge map (non-zero pixels are foreground)
pub fn extract(edges: &GrayImage) -> ContourForest {
    let raw = find_contours::<i32>(edges);

    let mut contours: Vec<Contour> = raw
        .iter()
        .map(|c| {
            let is_hole = matches!(c.border_type, BorderType::Hole);
            Contour {
                points: compress_runs(&c.points),
                is_hole,
                parent: if is_hole { c.parent } else { None },
                next_sibling: None,
            }
        })
        .collect();

    // Link each contour to the next one sharing its level and parent
    let mut last_in_group: Vec<((bool, Option<usize>), usize)> = Vec::new();
    for idx in 0..contours.len() {
        let key = (contours[idx].is_hole, contours[idx].parent);
        match last_in_group.iter_mut().find(|(k, _)| *k == key) {
            Some((_, last)) => {
                contours[*last].next_sibling = Some(idx);
                *last = idx;
            }
            None => last_in_group.push((key, idx)),
        }
    }

    ContourForest { contours }
}

/// Drop interior points of horizontal, vertical and diagonal runs, keeping
/// only their end points
pub fn compress_runs(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |a: Point<i32>, b: Point<i32>| ((b.x - a.x).signum(), (b.y - a.y).signum());

    points
        .iter()
        .enumerate()
        .filter(|&(i, p)| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, *p) != step(*p, next)
        })
        .map(|(_, p)| *p)
        .collect()
}
