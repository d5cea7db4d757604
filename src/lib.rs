//! Tray Packer - Evolutionary layout search for packing item trays into a box.
//!
//! Given a container and a catalogue of items with required counts, the crate
//! searches for one tray per item class that holds all copies, fits inside the
//! container, avoids overlapping other trays and leaves as little space unused
//! as possible.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Catalogue, layout, configuration and result types
//! - `compute`: Fitness evaluation, variation operators, repair and the search loop
//!
//! # Example
//!
//! ```rust,no_run
//! use tray_packer::{
//!     compute::EvolutionEngine,
//!     schema::{Catalogue, Container, EvolutionConfig, ItemDescriptor},
//! };
//!
//! // Describe the box and what has to go in it
//! let container = Container::new(300, 300, 120)?;
//! let catalogue = Catalogue::from_items(container, [(ItemDescriptor::card(88, 63, 1), 100)])?;
//!
//! // Search with a fixed seed
//! let config = EvolutionConfig::default().with_seed(42);
//! let mut engine = EvolutionEngine::new(catalogue, config)?;
//! let result = engine.run();
//!
//! println!("Best fitness: {}", result.stats.best_fitness);
//! println!("Trays: {:?}", result.placements);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::{EvolutionEngine, FitnessEvaluator};
pub use schema::{
    Catalogue, Container, EvolutionConfig, EvolutionResult, ItemDescriptor, PackingJob,
    PlacementRecord,
};
