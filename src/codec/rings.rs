//! Polygon ring classification.
//!
//! Some producers write a multi-part polygon as a single polygon with every
//! part wound as a hole. Given the ordered rings of one polygon record, the
//! classifier decides whether to trust the winding convention or to fall
//! back to generic containment-based grouping. It is a best-effort
//! disambiguation of an ambiguous legacy format, not a correctness
//! guarantee, and it never raises a hard error.

use geo::{Area, BoundingRect, Contains, InteriorPoint, Intersects};

use crate::geom::{Dimension, LineString, Polygon};

/// How the rings of one record should be grouped into polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingGrouping {
    /// Trust the winding convention: ring 0 opens the first polygon, further
    /// clockwise rings open new polygons, counter-clockwise rings are holes
    /// of the polygon they follow.
    ByWinding,
    /// Winding looks wrong; nest rings by point-in-ring containment.
    ByContainment,
}

/// Decides the grouping strategy for the rings of one record.
///
/// Only meaningful for 2D rings; callers with Z or M data use
/// [`RingGrouping::ByWinding`] directly. Ring 0's own orientation is never
/// inspected: if ring 0 itself is the anomaly this heuristic misclassifies,
/// a known limitation of the source format's ecosystem.
pub fn classify_rings(rings: &[LineString]) -> RingGrouping {
    if rings.len() < 2 {
        return RingGrouping::ByWinding;
    }

    // Any clockwise non-first ring means the winding convention is intact.
    if rings[1..].iter().any(|r| r.is_clockwise()) {
        return RingGrouping::ByWinding;
    }

    // Only hole-wound rings from here on.
    let exterior = rings[0].to_geo();
    let Some(exterior_rect) = exterior.bounding_rect() else {
        return RingGrouping::ByWinding;
    };
    let exterior_poly = geo::Polygon::new(exterior.clone(), vec![]);

    for ring in &rings[1..] {
        let Some(rect) = ring.to_geo().bounding_rect() else {
            continue;
        };
        if !exterior_rect.intersects(&rect) {
            // Disjoint envelopes: clearly an independent polygon.
            return RingGrouping::ByContainment;
        }
        // Take the four axis-extreme points of the ring and check whether
        // any lies inside the exterior. If none does, the ring is very
        // likely a second exterior (or an invalid ring that is neither).
        let mut left = (f64::INFINITY, 0.0f64);
        let mut right = (f64::NEG_INFINITY, 0.0f64);
        let mut bottom = (0.0f64, f64::INFINITY);
        let mut top = (0.0f64, f64::NEG_INFINITY);
        let n = ring.coords.len();
        for c in &ring.coords[..n.saturating_sub(1)] {
            if c.x < left.0 || (c.x == left.0 && c.y < left.1) {
                left = (c.x, c.y);
            }
            if c.x > right.0 || (c.x == right.0 && c.y > right.1) {
                right = (c.x, c.y);
            }
            if c.y < bottom.1 || (c.y == bottom.1 && c.x > bottom.0) {
                bottom = (c.x, c.y);
            }
            if c.y > top.1 || (c.y == top.1 && c.x < top.0) {
                top = (c.x, c.y);
            }
        }
        let inside = [left, right, bottom, top]
            .iter()
            .any(|&(x, y)| exterior_poly.contains(&geo::Point::new(x, y)));
        if !inside {
            return RingGrouping::ByContainment;
        }
    }

    RingGrouping::ByWinding
}

/// Groups rings into polygons under the chosen strategy.
///
/// Returns the polygons and whether the grouping is certified valid. The
/// containment path reports `false` when some hole has no plausible parent;
/// the rings are still returned, ungrouped, for the caller to mark the
/// geometry as not validated.
pub fn group_rings(
    rings: Vec<LineString>,
    grouping: RingGrouping,
    dim: Dimension,
) -> (Vec<Polygon>, bool) {
    match grouping {
        RingGrouping::ByWinding => (group_by_winding(rings, dim), true),
        RingGrouping::ByContainment => group_by_containment(rings, dim),
    }
}

/// Ring 0 opens the first polygon without orientation inspection; afterwards
/// clockwise rings open polygons and counter-clockwise rings are holes of
/// the most recent polygon.
fn group_by_winding(rings: Vec<LineString>, dim: Dimension) -> Vec<Polygon> {
    let mut polygons: Vec<Polygon> = Vec::new();
    for (i, ring) in rings.into_iter().enumerate() {
        if i == 0 || ring.is_clockwise() || polygons.is_empty() {
            polygons.push(Polygon::new(vec![ring], dim));
        } else if let Some(last) = polygons.last_mut() {
            last.rings.push(ring);
        }
    }
    polygons
}

/// Generic grouping: nest rings by point-in-ring containment and alternate
/// exterior/hole by nesting depth.
fn group_by_containment(rings: Vec<LineString>, dim: Dimension) -> (Vec<Polygon>, bool) {
    let geo_polys: Vec<geo::Polygon<f64>> = rings
        .iter()
        .map(|r| geo::Polygon::new(r.to_geo(), vec![]))
        .collect();
    let rects: Vec<_> = geo_polys.iter().map(|p| p.bounding_rect()).collect();
    let rep_points: Vec<geo::Point<f64>> = rings
        .iter()
        .zip(&geo_polys)
        .map(|(r, p)| {
            p.interior_point().unwrap_or_else(|| {
                let c = r.coords.first().copied().unwrap_or_default();
                geo::Point::new(c.x, c.y)
            })
        })
        .collect();

    let contains = |j: usize, i: usize| -> bool {
        if i == j {
            return false;
        }
        match (&rects[j], &rects[i]) {
            (Some(a), Some(b)) if a.intersects(b) => geo_polys[j].contains(&rep_points[i]),
            _ => false,
        }
    };

    let n = rings.len();
    let depths: Vec<usize> = (0..n)
        .map(|i| (0..n).filter(|&j| contains(j, i)).count())
        .collect();

    // Exterior rings sit at even depth; each hole's immediate parent is the
    // smallest containing ring one level up.
    let mut valid = true;
    let mut parent: Vec<Option<usize>> = vec![None; n];
    for i in 0..n {
        if depths[i] % 2 == 0 {
            continue;
        }
        parent[i] = (0..n)
            .filter(|&j| depths[j] == depths[i] - 1 && contains(j, i))
            .min_by(|&a, &b| {
                geo_polys[a]
                    .unsigned_area()
                    .partial_cmp(&geo_polys[b].unsigned_area())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        if parent[i].is_none() {
            valid = false;
        }
    }

    let mut slot: Vec<Option<usize>> = vec![None; n];
    let mut polygons: Vec<Polygon> = Vec::new();
    for (i, ring) in rings.iter().enumerate() {
        if depths[i] % 2 == 0 {
            slot[i] = Some(polygons.len());
            polygons.push(Polygon::new(vec![ring.clone()], dim));
        }
    }
    for (i, ring) in rings.into_iter().enumerate() {
        if depths[i] % 2 == 0 {
            continue;
        }
        match parent[i].and_then(|p| slot[p]) {
            Some(s) => polygons[s].rings.push(ring),
            // Orphan hole: keep it as its own polygon, best effort.
            None => polygons.push(Polygon::new(vec![ring], dim)),
        }
    }
    (polygons, valid)
}
