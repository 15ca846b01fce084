//! Nearest-neighbor association of labels and units to diagram anchors.
//!
//! All passes are brute force, `O(items x candidates)`, and run once per
//! diagram load.

use foundation::math::Vec2;

use crate::building::{BuildingId, BuildingMarker};
use crate::label::LabelTransform;

/// Unit-number labels further than this from every unit center stay put.
pub const UNIT_LABEL_THRESHOLD: f64 = 500.0;

/// Building-number labels further than this from every circle stay put.
pub const BUILDING_LABEL_THRESHOLD: f64 = 100.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Nearest {
    /// Index into the candidate sequence.
    pub index: usize,
    pub distance: f64,
}

/// Closest candidate to `point`.
///
/// Ordering contract:
/// - Candidates are visited in iteration order; on equal distance the first
///   one wins.
/// - A NaN distance never wins.
pub fn nearest(point: Vec2, candidates: impl IntoIterator<Item = Vec2>) -> Option<Nearest> {
    let mut best: Option<Nearest> = None;
    for (index, c) in candidates.into_iter().enumerate() {
        let distance = point.distance(c);
        let better = match best {
            None => !distance.is_nan(),
            Some(b) => distance < b.distance,
        };
        if better {
            best = Some(Nearest { index, distance });
        }
    }
    best
}

/// Closest candidate strictly closer than `threshold`.
pub fn nearest_within(
    point: Vec2,
    candidates: impl IntoIterator<Item = Vec2>,
    threshold: f64,
) -> Option<Nearest> {
    nearest(point, candidates).filter(|n| n.distance < threshold)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    /// Index of the anchor the label snapped to.
    pub target: usize,
    pub transform: LabelTransform,
}

/// Re-anchors a label onto the nearest center within `threshold`.
///
/// Returns `None` when nothing is close enough; the caller leaves the label
/// where it is.
pub fn center_label(
    label: &LabelTransform,
    centers: &[Vec2],
    threshold: f64,
) -> Option<LabelPlacement> {
    let hit = nearest_within(label.translate, centers.iter().copied(), threshold)?;
    Some(LabelPlacement {
        target: hit.index,
        transform: label.anchored_at(centers[hit.index]),
    })
}

/// Nearest building for every unit center, index-aligned with `unit_centers`.
///
/// Markers without an id are not candidates.
pub fn assign_buildings(
    unit_centers: &[Vec2],
    buildings: &[BuildingMarker],
) -> Vec<Option<BuildingId>> {
    let candidates: Vec<(&BuildingId, Vec2)> = buildings
        .iter()
        .filter_map(|b| b.id.as_ref().map(|id| (id, b.center)))
        .collect();

    unit_centers
        .iter()
        .map(|center| {
            nearest(*center, candidates.iter().map(|(_, c)| *c))
                .map(|hit| candidates[hit.index].0.clone())
        })
        .collect()
}
