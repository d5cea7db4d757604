//! Tray Packer CLI - Run a layout search from a JSON job file.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;
use std::time::Instant;

use tray_packer::{EvolutionEngine, PackingJob};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <job.json>", args[0]);
        eprintln!();
        eprintln!("Search for a tray layout described by a JSON job file.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  job.json  Container, item catalogue and evolution settings");
        eprintln!();
        eprintln!("An example job is printed with the --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_job();
        return;
    }

    let job_path = PathBuf::from(&args[1]);
    let job = PackingJob::from_path(&job_path).unwrap_or_else(|e| {
        eprintln!("Error loading job: {}", e);
        std::process::exit(1);
    });

    let catalogue = job.catalogue().unwrap_or_else(|e| {
        eprintln!("Error building catalogue: {}", e);
        std::process::exit(1);
    });

    println!("Tray Packer");
    println!("===========");
    let container = catalogue.container();
    println!(
        "Container: {}x{}x{} (length x width x height)",
        container.length, container.width, container.height
    );
    println!("Item classes: {}", catalogue.len());
    for class in catalogue.classes() {
        println!("  {:?} x{} -> {:?}", class.item, class.count, class.required_box());
    }
    println!("Population: {}", job.evolution.population.size);
    println!();

    let mut engine = EvolutionEngine::new(catalogue, job.evolution.clone()).unwrap_or_else(|e| {
        eprintln!("Error configuring search: {}", e);
        std::process::exit(1);
    });

    println!("Running search...");
    let start = Instant::now();
    let result = engine.run_with_callback(|progress| {
        if progress.generation % 10 == 0 {
            println!(
                "  Generation {}: fitness={:.6}",
                progress.generation, progress.generation_best
            );
        }
    });
    let elapsed = start.elapsed();

    let penalties = result.stats.best_penalties;
    println!();
    println!("Stopped: {:?}", result.stats.stop_reason);
    println!("Generations: {}", result.stats.generations);
    println!("Best fitness: {:.6}", result.stats.best_fitness);
    println!("Unused space penalty: {}", penalties.unused_space);
    println!("Unfit penalty: {}", penalties.unfit);
    println!("Overlap penalty: {}", penalties.overlap);
    println!("Overfit penalty: {}", penalties.overfit);
    println!(
        "Time: {:.2}s ({} evaluations)",
        elapsed.as_secs_f32(),
        result.stats.total_evaluations
    );
    println!();

    match serde_json::to_string_pretty(&result.placements) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error encoding placements: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_example_job() {
    match serde_json::to_string_pretty(&PackingJob::example()) {
        Ok(json) => {
            println!("Example job (job.json):");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Error encoding example: {}", e);
            std::process::exit(1);
        }
    }
}
