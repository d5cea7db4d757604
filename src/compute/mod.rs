//! Compute module - Layout search algorithms.

pub mod evolution;

pub use evolution::{EvolutionEngine, FitnessEvaluator, LayoutRng};
