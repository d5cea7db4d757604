//! Generation loop for the evolutionary layout search.

use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::schema::{
    Catalogue, CrossoverStrategy, EvolutionConfig, EvolutionConfigError, EvolutionHistory,
    EvolutionProgress, EvolutionResult, EvolutionStats, SelectionMethod, Solution, StopReason,
};

use super::fitness::FitnessEvaluator;
use super::genome::LayoutRng;
use super::repair::repair;

/// Parent indices plus the seed used to breed their two children.
type BreedingTask = (usize, usize, u64);

/// Evolution engine that runs the search.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    catalogue: Catalogue,
    rng: LayoutRng,
    evaluator: FitnessEvaluator,
    population: Vec<Solution>,
    history: EvolutionHistory,
    generation: usize,
    evaluations: u64,
    best_fitness: f64,
    stagnation_count: usize,
}

impl EvolutionEngine {
    /// Create a new evolution engine, validating the catalogue and config.
    pub fn new(
        catalogue: Catalogue,
        config: EvolutionConfig,
    ) -> Result<Self, EvolutionConfigError> {
        catalogue.validate()?;
        config.validate()?;

        let rng = match config.random_seed {
            Some(seed) => LayoutRng::new(seed),
            None => LayoutRng::random(),
        };
        // Every tray lives on layer 0, so the whole volume is one partition.
        let evaluator = FitnessEvaluator::new(&catalogue, config.fitness, 1);

        Ok(Self {
            config,
            catalogue,
            rng,
            evaluator,
            population: Vec::new(),
            history: EvolutionHistory::default(),
            generation: 0,
            evaluations: 0,
            best_fitness: f64::NEG_INFINITY,
            stagnation_count: 0,
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn evaluator(&self) -> &FitnessEvaluator {
        &self.evaluator
    }

    pub fn population(&self) -> &[Solution] {
        &self.population
    }

    /// Generations bred since initialisation.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Best evaluated solution of the current population.
    pub fn best(&self) -> Option<&Solution> {
        self.population
            .iter()
            .filter(|s| s.fitness().is_some())
            .max_by(|a, b| score(a).total_cmp(&score(b)))
    }

    /// Initialize the population: one random, repaired tray per group.
    pub fn initialize(&mut self) {
        self.population.clear();
        self.history = EvolutionHistory::default();
        self.generation = 0;
        self.evaluations = 0;
        self.best_fitness = f64::NEG_INFINITY;
        self.stagnation_count = 0;

        let container = *self.catalogue.container();
        for _ in 0..self.config.population.size {
            let mut solution = self.rng.random_solution(
                self.catalogue.len(),
                self.config.max_boxes_per_group,
                &container,
            );
            repair(&mut solution, &container);
            self.population.push(solution);
        }
    }

    /// Evaluate every solution without a cached fitness.
    pub fn evaluate_population(&mut self) {
        let evaluator = &self.evaluator;
        let pending = self
            .population
            .iter()
            .filter(|s| s.fitness().is_none())
            .count();

        if self.config.parallel {
            self.population
                .par_iter_mut()
                .filter(|s| s.fitness().is_none())
                .for_each(|s| {
                    evaluator.evaluate_in_place(s);
                });
        } else {
            for solution in self.population.iter_mut().filter(|s| s.fitness().is_none()) {
                evaluator.evaluate_in_place(solution);
            }
        }

        self.evaluations += pending as u64;
    }

    /// Breed the next generation from the evaluated population.
    ///
    /// The top `elite_count` solutions are carried over unchanged; the rest is
    /// filled with repaired children, two per selected parent pair.
    pub fn step_generation(&mut self) {
        assert!(
            self.population.iter().all(|s| s.fitness().is_some()),
            "population must be evaluated before breeding"
        );

        let size = self.config.population.size;
        self.population.sort_by(|a, b| score(b).total_cmp(&score(a)));

        let elites = self.config.elite_count();
        let mut next_gen = self.population[..elites.min(self.population.len())].to_vec();

        // Parents and child seeds are drawn up front so sequential and
        // parallel breeding produce the same children.
        let pairs = (size - next_gen.len()).div_ceil(2);
        let tasks: Vec<BreedingTask> = (0..pairs)
            .map(|_| {
                let (p1, p2) = self.select_parents();
                (p1, p2, self.rng.next_seed())
            })
            .collect();

        let children: Vec<Solution> = if self.config.parallel {
            tasks
                .par_iter()
                .flat_map_iter(|&task| self.breed(task))
                .collect()
        } else {
            tasks.iter().flat_map(|&task| self.breed(task)).collect()
        };

        next_gen.extend(children);
        next_gen.truncate(size);

        self.population = next_gen;
        self.generation += 1;
    }

    /// Tournament selection: the fittest of `tournament_size` distinct draws.
    pub fn select(&mut self) -> &Solution {
        let idx = self.select_index();
        &self.population[idx]
    }

    /// Run tournaments until `count` distinct winners are found.
    ///
    /// Winners are excluded from later tournaments. `count` is capped at the
    /// population size.
    pub fn select_distinct(&mut self, count: usize) -> Vec<&Solution> {
        let indices = self.select_distinct_indices(count);
        indices.into_iter().map(|i| &self.population[i]).collect()
    }

    fn select_index(&mut self) -> usize {
        let size = self.config.tournament_size();
        let entrants = self.rng.sample_indices(self.population.len(), size);
        self.fittest(&entrants)
    }

    fn select_distinct_indices(&mut self, count: usize) -> Vec<usize> {
        let size = self.config.tournament_size();
        let count = count.min(self.population.len());
        let mut pool: Vec<usize> = (0..self.population.len()).collect();
        let mut winners = Vec::with_capacity(count);

        while winners.len() < count {
            let entrants = self.rng.choose_multiple(&pool, size);
            let winner = self.fittest(&entrants);
            pool.retain(|&i| i != winner);
            winners.push(winner);
        }
        winners
    }

    fn select_parents(&mut self) -> (usize, usize) {
        match self.config.selection {
            SelectionMethod::Tournament { .. } => (self.select_index(), self.select_index()),
            SelectionMethod::DistinctTournament { .. } => {
                let winners = self.select_distinct_indices(2);
                match winners[..] {
                    [a, b] => (a, b),
                    [a] => (a, a),
                    _ => unreachable!("population holds at least two solutions"),
                }
            }
        }
    }

    fn fittest(&self, entrants: &[usize]) -> usize {
        entrants
            .iter()
            .copied()
            .max_by(|&a, &b| score(&self.population[a]).total_cmp(&score(&self.population[b])))
            .unwrap_or(0)
    }

    /// Produce two repaired children from one parent pair.
    fn breed(&self, (p1, p2, seed): BreedingTask) -> [Solution; 2] {
        let mut rng = LayoutRng::new(seed);
        let parent1 = &self.population[p1];
        let parent2 = &self.population[p2];
        let container = self.catalogue.container();

        [(); 2].map(|_| {
            let mut child = match self.config.crossover {
                CrossoverStrategy::Blended { alpha_range } => {
                    rng.blended_crossover(parent1, parent2, alpha_range)
                }
                CrossoverStrategy::OnePoint => rng.one_point_crossover(parent1, parent2),
            };
            rng.mutate(&mut child, &self.config.mutation, container);
            repair(&mut child, container);
            child
        })
    }

    /// Record statistics for the freshly evaluated population.
    fn record_generation(&mut self) {
        let gen_best = self
            .population
            .iter()
            .map(score)
            .fold(f64::NEG_INFINITY, f64::max);

        if gen_best > self.best_fitness {
            self.best_fitness = gen_best;
            self.stagnation_count = 0;
        } else {
            self.stagnation_count += 1;
        }

        let avg_fitness = self.average_fitness();
        self.history.best_fitness.push(gen_best);
        self.history.avg_fitness.push(avg_fitness);

        debug!(
            "generation {}: best={:.6} avg={:.6} stagnation={}",
            self.generation, gen_best, avg_fitness, self.stagnation_count
        );
    }

    fn average_fitness(&self) -> f64 {
        if self.population.is_empty() {
            return 0.0;
        }
        self.population.iter().map(score).sum::<f64>() / self.population.len() as f64
    }

    /// Get current progress.
    pub fn progress(&self) -> EvolutionProgress {
        let best = self.best();
        EvolutionProgress {
            generation: self.generation,
            max_generations: self.config.population.max_generations,
            best_fitness: self.best_fitness,
            generation_best: best.map(score).unwrap_or(f64::NEG_INFINITY),
            avg_fitness: self.average_fitness(),
            stagnation_count: self.stagnation_count,
            best_penalties: best.and_then(Solution::penalties).unwrap_or_default(),
        }
    }

    /// Check if evolution should stop.
    fn should_stop(&self) -> Option<StopReason> {
        if self.best_fitness == 0.0 {
            return Some(StopReason::PerfectFit);
        }

        if self.generation >= self.config.population.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(limit) = self.config.population.stagnation_limit
            && self.stagnation_count >= limit
        {
            return Some(StopReason::Stagnation);
        }

        None
    }

    /// Run evolution with progress callback.
    pub fn run_with_callback<F>(&mut self, mut callback: F) -> EvolutionResult
    where
        F: FnMut(&EvolutionProgress),
    {
        let start_time = Instant::now();
        info!(
            "starting layout search: {} item classes, population {}, parallel={}",
            self.catalogue.len(),
            self.config.population.size,
            self.config.parallel
        );

        self.initialize();
        self.evaluate_population();
        self.record_generation();
        callback(&self.progress());

        let stop_reason = loop {
            if let Some(reason) = self.should_stop() {
                break reason;
            }

            self.step_generation();
            self.evaluate_population();
            self.record_generation();
            callback(&self.progress());
        };

        let best = self
            .best()
            .cloned()
            .unwrap_or_else(|| unreachable!("population is never empty after initialization"));
        let best_penalties = best.penalties().unwrap_or_default();
        let elapsed = start_time.elapsed().as_secs_f64();

        info!(
            "layout search stopped after {} generations ({:?}): fitness {:.6}",
            self.generation, stop_reason, self.best_fitness
        );

        EvolutionResult {
            placements: best.to_placements(self.config.unit_scale),
            best,
            stats: EvolutionStats {
                generations: self.generation,
                total_evaluations: self.evaluations,
                best_fitness: self.best_fitness,
                best_penalties,
                final_avg_fitness: self.average_fitness(),
                elapsed_seconds: elapsed,
                stop_reason,
            },
            history: self.history.clone(),
        }
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> EvolutionResult {
        self.run_with_callback(|_| {})
    }
}

fn score(solution: &Solution) -> f64 {
    solution.fitness().unwrap_or(f64::NEG_INFINITY)
}
