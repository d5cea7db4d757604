//! Layout manipulation utilities for evolutionary search.
//!
//! Provides random tray generation, crossover, and mutation operations.

use rand::prelude::*;

use crate::schema::{Container, Group, MutationConfig, PlacementBox, Solution};

/// Random number generator wrapper for layout operations.
pub struct LayoutRng {
    rng: StdRng,
}

impl LayoutRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Generate a random tray inside the container footprint.
    ///
    /// Trays always start on the floor and span the full container height;
    /// only the footprint is drawn. The drawn size may overshoot the far wall
    /// by one unit, which repair clamps away.
    pub fn random_box(&mut self, container: &Container) -> PlacementBox {
        let (size_x, size_y, size_z) = container.layer_size();
        let x = self.rng.gen_range(0..size_x);
        let y = self.rng.gen_range(0..size_y);
        PlacementBox {
            dim_x: self.rng.gen_range(1..=size_x - x + 1),
            dim_y: self.rng.gen_range(1..=size_y - y + 1),
            dim_z: size_z,
            x,
            y,
            z: 0,
            layer: 0,
        }
    }

    /// A fresh solution with one random tray per group.
    pub fn random_solution(
        &mut self,
        group_count: usize,
        max_boxes: usize,
        container: &Container,
    ) -> Solution {
        let groups = (0..group_count)
            .map(|_| Group::with_boxes(vec![self.random_box(container)], max_boxes))
            .collect();
        Solution::new(groups)
    }

    /// Nudge one of `dim_x`, `dim_y`, `x`, `y` by `±k`, `k` in `1..=max_step`.
    ///
    /// Height and vertical position are never touched. Sizes stay at least 1
    /// and positions at least 0.
    pub fn mutate_box(&mut self, tray: &mut PlacementBox, max_step: u32) {
        let k = self.rng.gen_range(1..=max_step.max(1)) as i64;
        let delta = if self.rng.gen_bool(0.5) { k } else { -k };
        let shift = |value: u32, floor: i64| (value as i64 + delta).max(floor) as u32;

        match self.rng.gen_range(0..4) {
            0 => tray.dim_x = shift(tray.dim_x, 1),
            1 => tray.dim_y = shift(tray.dim_y, 1),
            2 => tray.x = shift(tray.x, 0),
            _ => tray.y = shift(tray.y, 0),
        }
    }

    /// Blended crossover.
    ///
    /// Trays present in both parents at the same index are blended field by
    /// field with a fresh `alpha` from `alpha_range`; a tray present in only
    /// one parent is copied. The layer comes from the first parent.
    pub fn blended_crossover(
        &mut self,
        parent1: &Solution,
        parent2: &Solution,
        alpha_range: (f64, f64),
    ) -> Solution {
        assert_eq!(
            parent1.groups().len(),
            parent2.groups().len(),
            "parents must have one group per item class"
        );

        let groups = parent1
            .groups()
            .iter()
            .zip(parent2.groups())
            .map(|(g1, g2)| {
                let len = g1.len().max(g2.len());
                let boxes = (0..len)
                    .map(|j| match (g1.boxes.get(j), g2.boxes.get(j)) {
                        (Some(t1), Some(t2)) => {
                            let alpha = self.sample_alpha(alpha_range);
                            blend_box(t1, t2, alpha)
                        }
                        (Some(t), None) | (None, Some(t)) => *t,
                        (None, None) => unreachable!("index below both group lengths"),
                    })
                    .collect();
                Group::with_boxes(boxes, g1.max_boxes)
            })
            .collect();

        Solution::new(groups)
    }

    /// One-point crossover: per group, trays before a random cut come from the
    /// first parent and the rest from the second.
    pub fn one_point_crossover(&mut self, parent1: &Solution, parent2: &Solution) -> Solution {
        assert_eq!(
            parent1.groups().len(),
            parent2.groups().len(),
            "parents must have one group per item class"
        );

        let groups = parent1
            .groups()
            .iter()
            .zip(parent2.groups())
            .map(|(g1, g2)| {
                let cut = self.rng.gen_range(0..=g1.len().min(g2.len()));
                let boxes = g1.boxes[..cut]
                    .iter()
                    .chain(&g2.boxes[cut..])
                    .copied()
                    .collect();
                Group::with_boxes(boxes, g1.max_boxes)
            })
            .collect();

        Solution::new(groups)
    }

    /// Mutate one randomly chosen group of a solution.
    ///
    /// A single uniform draw is partitioned into geometry change (`rate`),
    /// growth (`growth_rate`, only below the group cap) and shrink
    /// (`shrink_rate`, only with more than one tray). Anything else is a no-op.
    pub fn mutate(&mut self, solution: &mut Solution, config: &MutationConfig, container: &Container) {
        let group_count = solution.groups().len();
        assert!(group_count > 0, "cannot mutate a solution without groups");
        let group_index = self.rng.gen_range(0..group_count);
        assert!(
            !solution.groups()[group_index].is_empty(),
            "group {group_index} has no trays"
        );

        let mut draw = self.rng.r#gen::<f64>();
        if draw < config.rate {
            let group = solution.group_mut(group_index);
            let idx = self.rng.gen_range(0..group.len());
            self.mutate_box(&mut group.boxes[idx], config.max_step);
            return;
        }

        draw -= config.rate;
        if solution.groups()[group_index].can_grow() && draw < config.growth_rate {
            let tray = self.random_box(container);
            solution.group_mut(group_index).boxes.push(tray);
            return;
        }

        draw -= config.growth_rate;
        if solution.groups()[group_index].len() > 1 && draw < config.shrink_rate {
            solution.group_mut(group_index).boxes.pop();
        }
    }

    /// Sample `amount` distinct indices below `len`.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, len, amount.min(len)).into_vec()
    }

    /// Sample up to `amount` distinct entries of `pool`.
    pub fn choose_multiple(&mut self, pool: &[usize], amount: usize) -> Vec<usize> {
        pool.choose_multiple(&mut self.rng, amount).copied().collect()
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }

    fn sample_alpha(&mut self, (lo, hi): (f64, f64)) -> f64 {
        if lo >= hi {
            lo
        } else {
            self.rng.gen_range(lo..=hi)
        }
    }
}

/// Linear blend of two trays, clamped to legal sizes and positions.
fn blend_box(t1: &PlacementBox, t2: &PlacementBox, alpha: f64) -> PlacementBox {
    PlacementBox {
        dim_x: blend(t1.dim_x, t2.dim_x, alpha, 1),
        dim_y: blend(t1.dim_y, t2.dim_y, alpha, 1),
        dim_z: blend(t1.dim_z, t2.dim_z, alpha, 1),
        x: blend(t1.x, t2.x, alpha, 0),
        y: blend(t1.y, t2.y, alpha, 0),
        z: blend(t1.z, t2.z, alpha, 0),
        layer: t1.layer,
    }
}

/// `round(alpha * a + (1 - alpha) * b)`, at least `floor`.
fn blend(a: u32, b: u32, alpha: f64, floor: u32) -> u32 {
    let mixed = (alpha * a as f64 + (1.0 - alpha) * b as f64).round();
    mixed.max(floor as f64).min(u32::MAX as f64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> Container {
        Container::new(300, 200, 120).unwrap()
    }

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
    fn test_random_box_within_footprint() {
        let mut rng = LayoutRng::new(42);
        let container = container();
        let (sx, sy, sz) = container.layer_size();

        for _ in 0..500 {
            let t = rng.random_box(&container);
            assert!(t.x < sx && t.y < sy);
            assert_eq!((t.z, t.dim_z, t.layer), (0, sz, 0));
            assert!(t.dim_x >= 1 && t.x + t.dim_x <= sx + 1);
            assert!(t.dim_y >= 1 && t.y + t.dim_y <= sy + 1);
        }
    }

    #[test]
    fn test_mutate_box_changes_one_footprint_field() {
        let mut rng = LayoutRng::new(7);
        for _ in 0..500 {
            let original = tray([3, 3, 50], [2, 2, 0]);
            let mut t = original;
            rng.mutate_box(&mut t, 10);

            assert_eq!((t.dim_z, t.z, t.layer), (50, 0, 0));
            assert!(t.dim_x >= 1 && t.dim_y >= 1);
            let changed = [t.dim_x != 3, t.dim_y != 3, t.x != 2, t.y != 2];
            assert!(changed.iter().filter(|&&c| c).count() <= 1);
            assert!(t.dim_x.abs_diff(3) <= 10 && t.x.abs_diff(2) <= 10);
        }
    }

    #[test]
    fn test_crossover_alpha_one_copies_first_parent() {
        let mut rng = LayoutRng::new(1);
        let container = container();
        let p1 = rng.random_solution(3, 1, &container);
        let p2 = rng.random_solution(3, 1, &container);

        let child = rng.blended_crossover(&p1, &p2, (1.0, 1.0));
        assert_eq!(child.groups(), p1.groups());
        assert_eq!(child.fitness(), None);

        let child = rng.blended_crossover(&p1, &p2, (0.0, 0.0));
        assert_eq!(child.groups(), p2.groups());
    }

    #[test]
    fn test_crossover_blends_and_inherits_unpaired() {
        let mut rng = LayoutRng::new(3);
        let p1 = Solution::new(vec![Group::with_boxes(
            vec![tray([10, 20, 30], [0, 0, 0]), tray([5, 5, 5], [40, 40, 0])],
            2,
        )]);
        let p2 = Solution::new(vec![Group::with_boxes(vec![tray([20, 40, 30], [10, 10, 0])], 2)]);

        let child = rng.blended_crossover(&p1, &p2, (0.5, 0.5));
        let boxes = &child.groups()[0].boxes;
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0], tray([15, 30, 30], [5, 5, 0]));
        assert_eq!(boxes[1], p1.groups()[0].boxes[1]);
    }

    #[test]
    fn test_crossover_clamps_extrapolation() {
        let mut rng = LayoutRng::new(3);
        let p1 = Solution::new(vec![Group::with_boxes(vec![tray([1, 1, 1], [0, 0, 0])], 1)]);
        let p2 = Solution::new(vec![Group::with_boxes(vec![tray([50, 50, 50], [50, 50, 50])], 1)]);

        // alpha > 1 pushes away from the second parent, below the floors.
        let child = rng.blended_crossover(&p1, &p2, (1.5, 1.5));
        assert_eq!(child.groups()[0].boxes[0], tray([1, 1, 1], [0, 0, 0]));
    }

    #[test]
    fn test_one_point_crossover_takes_prefix_and_suffix() {
        let mut rng = LayoutRng::new(11);
        let a: Vec<_> = (0..3).map(|i| tray([1, 1, 1], [i, 0, 0])).collect();
        let b: Vec<_> = (0..3).map(|i| tray([2, 2, 2], [i, 9, 0])).collect();
        let p1 = Solution::new(vec![Group::with_boxes(a.clone(), 3)]);
        let p2 = Solution::new(vec![Group::with_boxes(b.clone(), 3)]);

        for _ in 0..50 {
            let child = rng.one_point_crossover(&p1, &p2);
            let boxes = &child.groups()[0].boxes;
            assert_eq!(boxes.len(), 3);
            let cut = boxes.iter().take_while(|t| t.dim_x == 1).count();
            assert_eq!(&boxes[..cut], &a[..cut]);
            assert_eq!(&boxes[cut..], &b[cut..]);
        }
    }

    #[test]
    fn test_mutation_without_geometry_rate_only_resizes_groups() {
        let mut rng = LayoutRng::new(5);
        let container = container();
        let config = MutationConfig {
            rate: 0.0,
            growth_rate: 0.5,
            shrink_rate: 0.5,
            max_step: 10,
        };

        let original = rng.random_solution(2, 4, &container);
        let mut solution = original.clone();
        for _ in 0..200 {
            rng.mutate(&mut solution, &config, &container);
            for (group, before) in solution.groups().iter().zip(original.groups()) {
                assert!(!group.is_empty() && group.len() <= 4);
                assert_eq!(group.boxes[0], before.boxes[0]);
            }
        }
    }

    #[test]
    fn test_mutation_is_noop_when_group_cannot_change() {
        let mut rng = LayoutRng::new(9);
        let container = container();
        let config = MutationConfig {
            rate: 0.0,
            growth_rate: 0.5,
            shrink_rate: 0.5,
            max_step: 10,
        };

        let original = rng.random_solution(3, 1, &container);
        let mut solution = original.clone();
        for _ in 0..100 {
            rng.mutate(&mut solution, &config, &container);
        }
        assert_eq!(solution.groups(), original.groups());
    }

    #[test]
    fn test_child_seeds_are_reproducible() {
        let mut a = LayoutRng::new(99);
        let mut b = LayoutRng::new(99);
        assert_eq!(a.next_seed(), b.next_seed());
        assert_eq!(a.sample_indices(10, 4), b.sample_indices(10, 4));
    }
}
