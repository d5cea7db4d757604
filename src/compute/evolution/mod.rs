//! Evolutionary search for tray layouts.
//!
//! # Overview
//!
//! The search system consists of:
//!
//! - **Fitness** (`fitness`): weighted unused-space, unfit, overlap and overfit penalties
//! - **Layout operations** (`genome`): random trays, crossover, and mutation
//! - **Repair** (`repair`): restores container bounds after variation
//! - **Search** (`search`): elitist genetic algorithm with tournament selection
//!
//! # Example
//!
//! ```rust,no_run
//! use tray_packer::compute::evolution::EvolutionEngine;
//! use tray_packer::schema::{Catalogue, Container, EvolutionConfig, ItemDescriptor};
//!
//! let container = Container::new(300, 300, 120)?;
//! let catalogue = Catalogue::from_items(
//!     container,
//!     [(ItemDescriptor::card(88, 63, 1), 100), (ItemDescriptor::card(100, 100, 1), 100)],
//! )?;
//!
//! let mut engine = EvolutionEngine::new(catalogue, EvolutionConfig::default())?;
//! let result = engine.run_with_callback(|progress| {
//!     println!("Generation {}: best fitness = {:.3}",
//!         progress.generation, progress.best_fitness);
//! });
//!
//! for tray in &result.placements {
//!     println!("{:?}", tray);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod fitness;
mod genome;
mod repair;
mod search;

pub use fitness::FitnessEvaluator;
pub use genome::LayoutRng;
pub use repair::repair;
pub use search::EvolutionEngine;
