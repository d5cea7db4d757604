//! Penalty-weighted fitness for candidate layouts.

use crate::schema::{Catalogue, Container, FitnessWeights, PenaltyBreakdown, Solution};

/// Scores solutions against a catalogue.
///
/// Fitness is the negated, volume-normalised weighted sum of four penalties
/// plus a small term for trays beyond one per class: 0 is a perfect layout and
/// anything else is negative.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    weights: FitnessWeights,
    container: Container,
    required: Vec<[i64; 3]>,
    layers: usize,
}

/// Running per-axis sums for one group.
#[derive(Debug, Default, Clone, Copy)]
struct AxisSums([i64; 3]);

impl AxisSums {
    fn add(&mut self, axis: usize, excess: i64, others: [i64; 2]) {
        self.0[axis] += excess.max(0) * others[0].max(1) * others[1].max(1);
    }

    /// `max(1, x) * max(1, y) * max(1, z)` if any axis is positive.
    fn penalty(&self) -> f64 {
        if self.0.iter().all(|&v| v <= 0) {
            return 0.0;
        }
        self.0.iter().map(|&v| v.max(1) as f64).product()
    }
}

impl FitnessEvaluator {
    /// Create an evaluator for `catalogue` using `layers` space partitions.
    pub fn new(catalogue: &Catalogue, weights: FitnessWeights, layers: usize) -> Self {
        let required = catalogue
            .classes()
            .iter()
            .map(|class| {
                let (x, y, z) = class.required_box();
                [x as i64, y as i64, z as i64]
            })
            .collect();

        Self {
            weights,
            container: *catalogue.container(),
            required,
            layers: layers.max(1),
        }
    }

    pub fn weights(&self) -> &FitnessWeights {
        &self.weights
    }

    /// Score a solution without touching its cache.
    ///
    /// Panics if the solution is not index-aligned with the catalogue or a
    /// tray references a layer outside the configured partitions.
    pub fn evaluate(&self, solution: &Solution) -> (f64, PenaltyBreakdown) {
        let groups = solution.groups();
        assert_eq!(
            groups.len(),
            self.required.len(),
            "solution has {} groups but the catalogue has {} item classes",
            groups.len(),
            self.required.len()
        );

        let mut unused_space = self.container.total_space(self.layers);
        let (max_x, max_y, max_z) = self.container.layer_size();
        let limits = [max_x as i64, max_y as i64, max_z as i64];
        let mut unfit_penalty = 0.0;
        let mut overfit_penalty = 0.0;
        let mut overlap_penalty = 0u64;

        for (i, group) in groups.iter().enumerate() {
            let required = self.required[i];
            let stacked = group.stacked_extent() as i64;

            for tray in &group.boxes {
                *layer_slot(&mut unused_space, tray.layer) -= tray.volume() as i64;
            }

            let mut unfit = AxisSums::default();
            let mut overfit = AxisSums::default();
            for tray in &group.boxes {
                let [dx, dy, dz] = tray.dims().map(i64::from);
                let [x, y, z] = tray.position().map(i64::from);

                // Copies stack along y, so y is checked against the whole group.
                unfit.add(0, required[0] - dx, [dy, dz]);
                unfit.add(1, required[1] - stacked, [dx, dz]);
                unfit.add(2, required[2] - dz, [dx, dy]);

                overfit.add(0, x + dx - limits[0], [dy, dz]);
                overfit.add(1, y + dy - limits[1], [dx, dz]);
                overfit.add(2, z + dz - limits[2], [dx, dy]);
            }
            unfit_penalty += unfit.penalty();
            overfit_penalty += overfit.penalty();

            // Overlap within the group, then against every later group.
            let later_boxes = groups[i + 1..].iter().flat_map(|g| g.boxes.iter());
            for (j, tray) in group.boxes.iter().enumerate() {
                for other in group.boxes[j + 1..].iter().chain(later_boxes.clone()) {
                    if other.layer != tray.layer {
                        continue;
                    }
                    let shared = tray.overlap_volume(other);
                    *layer_slot(&mut unused_space, tray.layer) += shared as i64;
                    overlap_penalty += shared;
                }
            }
        }

        let penalties = PenaltyBreakdown {
            unused_space: unused_space.iter().map(|v| v.unsigned_abs() as f64).sum(),
            unfit: unfit_penalty,
            overlap: overlap_penalty as f64,
            overfit: overfit_penalty,
        };

        let w = &self.weights;
        let raw = w.unused_space * penalties.unused_space
            + w.unfit * penalties.unfit
            + w.overlap * penalties.overlap
            + w.overfit * penalties.overfit;

        let group_count = groups.len().max(1) as f64;
        let extra_boxes = solution.box_count() as f64 - groups.len() as f64;
        let score = raw / (self.container.volume() as f64 / 100.0)
            + w.element_count * extra_boxes / group_count / 100.0;

        (-score, penalties)
    }

    /// Score a solution and cache the result on it.
    pub fn evaluate_in_place(&self, solution: &mut Solution) -> f64 {
        let (fitness, penalties) = self.evaluate(solution);
        solution.set_evaluation(fitness, penalties);
        fitness
    }
}

fn layer_slot(space: &mut [i64], layer: usize) -> &mut i64 {
    let layers = space.len();
    space
        .get_mut(layer)
        .unwrap_or_else(|| panic!("tray layer {layer} outside {layers} configured layers"))
}
