//! Candidate layout representation: trays, per-class groups and full solutions.

use serde::{Deserialize, Serialize};

/// One axis-aligned tray candidate.
///
/// Size and position are independent; nothing couples one axis to another
/// while the search is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlacementBox {
    pub dim_x: u32,
    pub dim_y: u32,
    pub dim_z: u32,
    pub x: u32,
    pub y: u32,
    pub z: u32,
    /// Partition index; only boxes on the same layer can overlap.
    pub layer: usize,
}

impl PlacementBox {
    /// Sizes as an `[x, y, z]` array.
    #[inline]
    pub fn dims(&self) -> [u32; 3] {
        [self.dim_x, self.dim_y, self.dim_z]
    }

    /// Position as an `[x, y, z]` array.
    #[inline]
    pub fn position(&self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }

    /// Mutable size along `axis` (0 = x, 1 = y, 2 = z).
    pub fn dim_mut(&mut self, axis: usize) -> &mut u32 {
        match axis {
            0 => &mut self.dim_x,
            1 => &mut self.dim_y,
            2 => &mut self.dim_z,
            _ => panic!("axis index {axis} out of range"),
        }
    }

    pub fn volume(&self) -> u64 {
        self.dim_x as u64 * self.dim_y as u64 * self.dim_z as u64
    }

    /// Per-axis overlap lengths with `other`.
    ///
    /// An axis where the boxes are disjoint (or merely touch) reports 0.
    pub fn overlap(&self, other: &PlacementBox) -> [u32; 3] {
        let a_pos = self.position();
        let a_dim = self.dims();
        let b_pos = other.position();
        let b_dim = other.dims();
        std::array::from_fn(|axis| {
            let a_end = a_pos[axis] as u64 + a_dim[axis] as u64;
            let b_end = b_pos[axis] as u64 + b_dim[axis] as u64;
            let start = a_pos[axis].max(b_pos[axis]) as u64;
            a_end.min(b_end).saturating_sub(start) as u32
        })
    }

    /// Intersection volume with `other`; 0 if any axis is disjoint.
    pub fn overlap_volume(&self, other: &PlacementBox) -> u64 {
        self.overlap(other).iter().map(|&o| o as u64).product()
    }
}

/// Trays assigned to one item class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub boxes: Vec<PlacementBox>,
    /// Upper bound on `boxes.len()` that growth mutation respects.
    pub max_boxes: usize,
}

impl Group {
    pub fn new(max_boxes: usize) -> Self {
        Self {
            boxes: Vec::new(),
            max_boxes,
        }
    }

    pub fn with_boxes(boxes: Vec<PlacementBox>, max_boxes: usize) -> Self {
        Self { boxes, max_boxes }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Whether another box may be appended.
    pub fn can_grow(&self) -> bool {
        self.boxes.len() < self.max_boxes
    }

    /// Sum of box heights along the stacking (y) axis.
    pub fn stacked_extent(&self) -> u64 {
        self.boxes.iter().map(|b| b.dim_y as u64).sum()
    }
}

/// Breakdown of the raw (unweighted) penalty magnitudes behind a fitness.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PenaltyBreakdown {
    /// Container volume left empty, summed over layers.
    pub unused_space: f64,
    /// Shortfall of trays against the required item boxes.
    pub unfit: f64,
    /// Volume shared by trays on the same layer.
    pub overlap: f64,
    /// Tray volume sticking out of the container.
    pub overfit: f64,
}

impl PenaltyBreakdown {
    /// True when every penalty is zero.
    pub fn is_perfect(&self) -> bool {
        self.unused_space == 0.0 && self.unfit == 0.0 && self.overlap == 0.0 && self.overfit == 0.0
    }
}

/// A full candidate packing: one group per item class, in catalogue order.
///
/// Fitness and penalties are cached by the evaluator and dropped whenever the
/// groups are borrowed mutably.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    groups: Vec<Group>,
    #[serde(default)]
    fitness: Option<f64>,
    #[serde(default)]
    penalties: Option<PenaltyBreakdown>,
}

impl Solution {
    pub fn new(groups: Vec<Group>) -> Self {
        Self {
            groups,
            fitness: None,
            penalties: None,
        }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Mutable access to all groups; invalidates the cached evaluation.
    pub fn groups_mut(&mut self) -> &mut [Group] {
        self.invalidate();
        &mut self.groups
    }

    /// Mutable access to one group; invalidates the cached evaluation.
    pub fn group_mut(&mut self, index: usize) -> &mut Group {
        self.invalidate();
        &mut self.groups[index]
    }

    /// Cached fitness, if the solution has been evaluated since its last change.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    pub fn penalties(&self) -> Option<PenaltyBreakdown> {
        self.penalties
    }

    pub(crate) fn set_evaluation(&mut self, fitness: f64, penalties: PenaltyBreakdown) {
        self.fitness = Some(fitness);
        self.penalties = Some(penalties);
    }

    fn invalidate(&mut self) {
        self.fitness = None;
        self.penalties = None;
    }

    /// Total number of boxes across all groups.
    pub fn box_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }

    /// Every box, group by group.
    pub fn boxes(&self) -> impl Iterator<Item = &PlacementBox> {
        self.groups.iter().flat_map(|g| g.boxes.iter())
    }

    /// Flatten into placement records scaled by `scale`, sorted by x.
    pub fn to_placements(&self, scale: f64) -> Vec<PlacementRecord> {
        let mut records: Vec<PlacementRecord> = self
            .boxes()
            .map(|b| PlacementRecord::from_box(b, scale))
            .collect();
        records.sort_by(|a, b| a.x.total_cmp(&b.x));
        records
    }
}

/// A tray as handed to geometry generation, in consumer units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub size_x: f64,
    pub size_y: f64,
    pub size_z: f64,
}

impl PlacementRecord {
    pub fn from_box(placement: &PlacementBox, scale: f64) -> Self {
        Self {
            x: placement.x as f64 * scale,
            y: placement.y as f64 * scale,
            z: placement.z as f64 * scale,
            size_x: placement.dim_x as f64 * scale,
            size_y: placement.dim_y as f64 * scale,
            size_z: placement.dim_z as f64 * scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tray(dims: [u32; 3], pos: [u32; 3]) -> PlacementBox {
        PlacementBox {
            dim_x: dims[0],
            dim_y: dims[1],
            dim_z: dims[2],
            x: pos[0],
            y: pos[1],
            z: pos[2],
            layer: 0,
        }
    }

    #[test]
    fn test_overlap_partial() {
        let a = tray([10, 10, 10], [0, 0, 0]);
        let b = tray([10, 4, 20], [5, 8, 0]);
        assert_eq!(a.overlap(&b), [5, 2, 10]);
        assert_eq!(a.overlap_volume(&b), 100);
        assert_eq!(b.overlap(&a), [5, 2, 10]);
    }

    #[test]
    fn test_touching_boxes_do_not_overlap() {
        let a = tray([10, 10, 10], [0, 0, 0]);
        let b = tray([10, 10, 10], [10, 0, 0]);
        assert_eq!(a.overlap(&b), [0, 10, 10]);
        assert_eq!(a.overlap_volume(&b), 0);
    }

    #[test]
    fn test_cache_invalidated_on_mutation() {
        let mut solution = Solution::new(vec![Group::with_boxes(
            vec![tray([1, 1, 1], [0, 0, 0])],
            1,
        )]);
        solution.set_evaluation(-1.0, PenaltyBreakdown::default());
        assert_eq!(solution.fitness(), Some(-1.0));

        solution.group_mut(0).boxes[0].dim_x = 2;
        assert_eq!(solution.fitness(), None);
        assert_eq!(solution.penalties(), None);
    }

    #[test]
    fn test_placements_sorted_and_scaled() {
        let solution = Solution::new(vec![
            Group::with_boxes(vec![tray([30, 20, 10], [50, 0, 0])], 1),
            Group::with_boxes(vec![tray([40, 20, 10], [10, 5, 0])], 1),
        ]);
        let records = solution.to_placements(0.1);

        assert_eq!(records.len(), 2);
        assert!((records[0].x - 1.0).abs() < 1e-9);
        assert!((records[0].size_x - 4.0).abs() < 1e-9);
        assert!((records[0].y - 0.5).abs() < 1e-9);
        assert!((records[1].x - 5.0).abs() < 1e-9);
        assert!((records[1].size_z - 1.0).abs() < 1e-9);
    }

    fn arb_box() -> impl Strategy<Value = PlacementBox> {
        (
            prop::array::uniform3(1u32..60),
            prop::array::uniform3(0u32..60),
        )
            .prop_map(|(dims, pos)| tray(dims, pos))
    }

    proptest! {
        #[test]
        fn prop_overlap_volume_is_axis_product(a in arb_box(), b in arb_box()) {
            let axes = a.overlap(&b);
            let product: u64 = axes.iter().map(|&o| o as u64).product();
            prop_assert_eq!(a.overlap_volume(&b), product);
            prop_assert_eq!(a.overlap_volume(&b), b.overlap_volume(&a));
        }

        #[test]
        fn prop_separated_axis_means_no_overlap(a in arb_box(), b in arb_box(), axis in 0usize..3) {
            // Move `b` past the far side of `a` along one axis.
            let mut b = b;
            let end = a.position()[axis] + a.dims()[axis];
            match axis {
                0 => b.x = end,
                1 => b.y = end,
                _ => b.z = end,
            }
            prop_assert_eq!(a.overlap(&b)[axis], 0);
            prop_assert_eq!(a.overlap_volume(&b), 0);
        }
    }
}
