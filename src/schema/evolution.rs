//! Evolution configuration and result types for the layout search.

use serde::{Deserialize, Serialize};

use super::{ConfigError, PenaltyBreakdown, PlacementRecord, Solution};

/// Top-level configuration for the evolutionary layout search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Population and termination settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Penalty weights used by the fitness evaluator.
    #[serde(default)]
    pub fitness: FitnessWeights,
    /// Mutation probabilities.
    #[serde(default)]
    pub mutation: MutationConfig,
    /// Crossover operator.
    #[serde(default)]
    pub crossover: CrossoverStrategy,
    /// Parent selection.
    #[serde(default)]
    pub selection: SelectionMethod,
    /// Fraction of the population carried over unchanged each generation.
    #[serde(default = "default_elite_fraction")]
    pub elite_fraction: f64,
    /// Maximum trays per item class.
    #[serde(default = "default_max_boxes_per_group")]
    pub max_boxes_per_group: usize,
    /// Evaluate and breed on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Factor applied to integer units when emitting placement records.
    #[serde(default = "default_unit_scale")]
    pub unit_scale: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: PopulationConfig::default(),
            fitness: FitnessWeights::default(),
            mutation: MutationConfig::default(),
            crossover: CrossoverStrategy::default(),
            selection: SelectionMethod::default(),
            elite_fraction: default_elite_fraction(),
            max_boxes_per_group: default_max_boxes_per_group(),
            parallel: false,
            random_seed: None,
            unit_scale: default_unit_scale(),
        }
    }
}

fn default_elite_fraction() -> f64 {
    0.06
}
fn default_max_boxes_per_group() -> usize {
    1
}
fn default_unit_scale() -> f64 {
    0.1
}

impl EvolutionConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population.size = size;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.population.max_generations = generations;
        self
    }

    /// Sets (or disables) the stagnation limit.
    pub fn with_stagnation_limit(mut self, limit: Option<usize>) -> Self {
        self.population.stagnation_limit = limit;
        self
    }

    pub fn with_fitness(mut self, fitness: FitnessWeights) -> Self {
        self.fitness = fitness;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Number of elites: `max(1, round(elite_fraction * size))`, capped at size.
    pub fn elite_count(&self) -> usize {
        let elites = (self.elite_fraction * self.population.size as f64).round() as usize;
        elites.max(1).min(self.population.size)
    }

    /// Tournament size for the configured selection method.
    pub fn tournament_size(&self) -> usize {
        let size = match self.selection {
            SelectionMethod::Tournament { size } | SelectionMethod::DistinctTournament { size } => {
                size
            }
        };
        size.unwrap_or_else(|| (self.population.size / 100).max(4))
    }
}

/// Population size and stop conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of solutions per generation.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Hard cap on generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Stop after this many generations without a better best fitness.
    #[serde(default = "default_stagnation_limit")]
    pub stagnation_limit: Option<usize>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
            stagnation_limit: default_stagnation_limit(),
        }
    }
}

fn default_population_size() -> usize {
    100
}
fn default_max_generations() -> usize {
    10_000
}
fn default_stagnation_limit() -> Option<usize> {
    Some(100)
}

/// Weights of the five fitness terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessWeights {
    /// Penalty per extra tray beyond one per class.
    #[serde(default)]
    pub element_count: f64,
    /// Penalty per unit of empty container volume.
    #[serde(default = "default_weight")]
    pub unused_space: f64,
    /// Penalty for trays too small for their items.
    #[serde(default = "default_weight")]
    pub unfit: f64,
    /// Penalty for overlapping trays.
    #[serde(default = "default_weight")]
    pub overlap: f64,
    /// Penalty for trays leaving the container.
    #[serde(default = "default_weight")]
    pub overfit: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            element_count: 0.0,
            unused_space: default_weight(),
            unfit: default_weight(),
            overlap: default_weight(),
            overfit: default_weight(),
        }
    }
}

impl FitnessWeights {
    pub fn new(
        element_count: f64,
        unused_space: f64,
        unfit: f64,
        overlap: f64,
        overfit: f64,
    ) -> Self {
        Self {
            element_count,
            unused_space,
            unfit,
            overlap,
            overfit,
        }
    }

    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("element_count", self.element_count),
            ("unused_space", self.unused_space),
            ("unfit", self.unfit),
            ("overlap", self.overlap),
            ("overfit", self.overfit),
        ]
    }
}

fn default_weight() -> f64 {
    1.0
}

/// Mutation probabilities.
///
/// `rate`, `growth_rate` and `shrink_rate` partition a single uniform draw in
/// that order, so their sum must not exceed 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Probability of perturbing one tray's geometry.
    #[serde(default = "default_mutation_rate")]
    pub rate: f64,
    /// Probability of appending a new random tray.
    #[serde(default = "default_growth_rate")]
    pub growth_rate: f64,
    /// Probability of dropping the last tray.
    #[serde(default = "default_shrink_rate")]
    pub shrink_rate: f64,
    /// Largest step applied by a geometry mutation.
    #[serde(default = "default_max_step")]
    pub max_step: u32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            rate: default_mutation_rate(),
            growth_rate: default_growth_rate(),
            shrink_rate: default_shrink_rate(),
            max_step: default_max_step(),
        }
    }
}

fn default_mutation_rate() -> f64 {
    0.5
}
fn default_growth_rate() -> f64 {
    0.1
}
fn default_shrink_rate() -> f64 {
    0.1
}
fn default_max_step() -> u32 {
    10
}

/// Crossover operator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CrossoverStrategy {
    /// Per-field linear blend with `alpha` drawn from `alpha_range`.
    Blended {
        #[serde(default = "default_alpha_range")]
        alpha_range: (f64, f64),
    },
    /// Single cut per group: head from the first parent, tail from the second.
    OnePoint,
}

impl Default for CrossoverStrategy {
    fn default() -> Self {
        Self::Blended {
            alpha_range: default_alpha_range(),
        }
    }
}

fn default_alpha_range() -> (f64, f64) {
    (-0.05, 1.05)
}

/// Parent selection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum SelectionMethod {
    /// Independent tournaments; both parents may be the same solution.
    Tournament {
        /// Defaults to `max(4, population / 100)`.
        #[serde(default)]
        size: Option<usize>,
    },
    /// Tournaments that never return the same solution twice for one pair.
    DistinctTournament {
        #[serde(default)]
        size: Option<usize>,
    },
}

impl Default for SelectionMethod {
    fn default() -> Self {
        Self::Tournament { size: None }
    }
}

// ============================================================================
// Progress and results
// ============================================================================

/// Snapshot reported after every evaluated generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Generation just evaluated (0 = initial population).
    pub generation: usize,
    /// Configured generation cap.
    pub max_generations: usize,
    /// Best fitness seen so far.
    pub best_fitness: f64,
    /// Best fitness in the current population.
    pub generation_best: f64,
    /// Mean fitness of the current population.
    pub avg_fitness: f64,
    /// Generations since the best fitness last improved.
    pub stagnation_count: usize,
    /// Penalties of the current best solution.
    pub best_penalties: PenaltyBreakdown,
}

/// Per-generation fitness history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionHistory {
    pub best_fitness: Vec<f64>,
    pub avg_fitness: Vec<f64>,
}

/// Final result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best solution found.
    pub best: Solution,
    /// The best solution decoded for geometry generation.
    pub placements: Vec<PlacementRecord>,
    /// Statistics from the run.
    pub stats: EvolutionStats,
    /// Full history for analysis.
    pub history: EvolutionHistory,
}

/// Statistics from a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations bred after the initial population.
    pub generations: usize,
    /// Total fitness evaluations performed.
    pub total_evaluations: u64,
    /// Best fitness achieved.
    pub best_fitness: f64,
    /// Penalty breakdown of the best solution.
    pub best_penalties: PenaltyBreakdown,
    /// Average fitness of the final population.
    pub final_avg_fitness: f64,
    /// Time taken (in seconds).
    pub elapsed_seconds: f64,
    /// Reason for stopping.
    pub stop_reason: StopReason,
}

/// Reason the search stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// Found a layout with fitness exactly 0.
    PerfectFit,
    /// Best fitness unchanged for the stagnation limit.
    Stagnation,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Invalid fitness weight {name}: {value} (must be finite and non-negative)")]
    InvalidWeight { name: &'static str, value: f64 },
    #[error("Invalid mutation settings: {0}")]
    InvalidMutation(String),
    #[error("Invalid alpha range ({0}, {1})")]
    InvalidAlphaRange(f64, f64),
    #[error("Tournament size must be positive")]
    InvalidTournamentSize,
    #[error("Elite fraction must be within [0, 1], got {0}")]
    InvalidEliteFraction(f64),
    #[error("At least one tray per item class must be allowed")]
    InvalidGroupCap,
    #[error("Unit scale must be positive, got {0}")]
    InvalidUnitScale(f64),
    #[error("Catalogue validation failed: {0}")]
    Catalogue(#[from] ConfigError),
}

impl EvolutionConfig {
    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        if self.population.size < 2 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }

        for (name, value) in self.fitness.entries() {
            if !value.is_finite() || value < 0.0 {
                return Err(EvolutionConfigError::InvalidWeight { name, value });
            }
        }

        let m = &self.mutation;
        for (name, p) in [
            ("rate", m.rate),
            ("growth_rate", m.growth_rate),
            ("shrink_rate", m.shrink_rate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(EvolutionConfigError::InvalidMutation(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }
        if m.rate + m.growth_rate + m.shrink_rate > 1.0 + f64::EPSILON {
            return Err(EvolutionConfigError::InvalidMutation(
                "probabilities sum to more than 1".to_string(),
            ));
        }
        if m.max_step == 0 {
            return Err(EvolutionConfigError::InvalidMutation(
                "max_step must be positive".to_string(),
            ));
        }

        if let CrossoverStrategy::Blended { alpha_range: (lo, hi) } = self.crossover
            && (!lo.is_finite() || !hi.is_finite() || lo > hi)
        {
            return Err(EvolutionConfigError::InvalidAlphaRange(lo, hi));
        }

        if self.tournament_size() == 0 {
            return Err(EvolutionConfigError::InvalidTournamentSize);
        }

        if !(0.0..=1.0).contains(&self.elite_fraction) {
            return Err(EvolutionConfigError::InvalidEliteFraction(
                self.elite_fraction,
            ));
        }

        if self.max_boxes_per_group == 0 {
            return Err(EvolutionConfigError::InvalidGroupCap);
        }

        if !(self.unit_scale.is_finite() && self.unit_scale > 0.0) {
            return Err(EvolutionConfigError::InvalidUnitScale(self.unit_scale));
        }

        Ok(())
    }
}
