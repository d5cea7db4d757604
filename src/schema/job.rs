//! Packing job files: container, catalogue and search settings in one JSON document.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    Catalogue, ConfigError, Container, EvolutionConfig, EvolutionConfigError, ItemDescriptor,
};

/// A complete optimisation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackingJob {
    pub container: Container,
    pub items: Vec<ItemEntry>,
    #[serde(default)]
    pub evolution: EvolutionConfig,
}

/// One catalogue line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ItemEntry {
    pub item: ItemDescriptor,
    pub count: u32,
}

impl PackingJob {
    /// Load and validate a job from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate a job from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, JobError> {
        let job: Self = serde_json::from_str(json)?;
        job.catalogue()?;
        job.evolution.validate()?;
        Ok(job)
    }

    /// Build the validated catalogue described by this job.
    pub fn catalogue(&self) -> Result<Catalogue, ConfigError> {
        Catalogue::from_items(
            self.container,
            self.items.iter().map(|entry| (entry.item, entry.count)),
        )
    }

    /// The two-class board-game box used as the reference scenario.
    pub fn example() -> Self {
        Self {
            container: Container {
                length: 300,
                width: 300,
                height: 120,
            },
            items: vec![
                ItemEntry {
                    item: ItemDescriptor::card(88, 63, 1),
                    count: 100,
                },
                ItemEntry {
                    item: ItemDescriptor::card(100, 100, 1),
                    count: 100,
                },
            ],
            evolution: EvolutionConfig::default()
                .with_population_size(200)
                .with_max_generations(3000)
                .with_fitness(super::FitnessWeights::new(0.0, 0.1, 1.0, 1.0, 1.0)),
        }
    }
}

/// Errors raised while loading a job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Failed to read job file: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse job: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid catalogue: {0}")]
    Catalogue(#[from] ConfigError),
    #[error("Invalid evolution settings: {0}")]
    Evolution(#[from] EvolutionConfigError),
}
