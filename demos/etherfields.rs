//! Etherfields box layout: cards and tiles in a 300x300x120 insert.
//!
//! Runs the reference two-class scenario until the search stagnates, then
//! prints the winning trays. Set `RUST_LOG=debug` for per-generation output.

use std::time::Instant;

use tray_packer::{EvolutionEngine, PackingJob};

fn main() {
    env_logger::init();

    println!("=== Etherfields Layout Search ===\n");

    let job = PackingJob::example();
    let catalogue = match job.catalogue() {
        Ok(catalogue) => catalogue,
        Err(e) => {
            eprintln!("Invalid catalogue: {}", e);
            std::process::exit(1);
        }
    };

    for seed in [7, 42] {
        let config = job
            .evolution
            .clone()
            .with_stagnation_limit(Some(100))
            .with_seed(seed);

        let mut engine = match EvolutionEngine::new(catalogue.clone(), config) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("Invalid search settings: {}", e);
                std::process::exit(1);
            }
        };

        let start = Instant::now();
        let result = engine.run();
        let elapsed = start.elapsed();

        let total_evals = result.stats.total_evaluations;
        let evals_per_sec = total_evals as f64 / elapsed.as_secs_f64();

        println!("Seed {}:", seed);
        println!("  Stopped:        {:?}", result.stats.stop_reason);
        println!("  Generations:    {}", result.stats.generations);
        println!("  Evaluations:    {}", total_evals);
        println!("  Elapsed:        {:.2}s", elapsed.as_secs_f64());
        println!("  Evals/sec:      {:.1}", evals_per_sec);
        println!("  Best fitness:   {:.6}", result.stats.best_fitness);
        println!("  Penalties:      {:?}", result.stats.best_penalties);
        for record in &result.placements {
            println!(
                "    at ({:.1}, {:.1}, {:.1}) size {:.1} x {:.1} x {:.1}",
                record.x, record.y, record.z, record.size_x, record.size_y, record.size_z
            );
        }
        println!();
    }
}
