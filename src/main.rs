use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tellus::cli::commands;
use tellus::config::{GenerationConfig, SimulationConfig};

#[derive(Parser)]
#[command(name = "tellus")]
#[command(
    about = "A procedural planet simulator with geodesic tiling, hydrology, and atmospheric flow"
)]
#[command(version)]
struct Cli {
    /// Path to the simulation configuration file
    #[arg(short, long, default_value = "tellus.toml")]
    config: String,

    /// Path to the planet generation configuration file
    #[arg(short, long, default_value = "worldgen.toml")]
    worldgen: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a planet from a seed
    Generate {
        /// Seed of the planet; defaults to the wall clock
        #[arg(short, long)]
        seed: Option<i64>,
    },

    /// Simulate a planet's climate
    Simulate {
        /// Seed of the planet; defaults to the wall clock
        #[arg(short, long)]
        seed: Option<i64>,

        /// Number of outer steps to run
        #[arg(long, default_value_t = 1000)]
        steps: u64,
    },

    /// Show a planet summary or a single cell
    Inspect {
        /// Seed of the planet to inspect
        #[arg(short, long)]
        seed: i64,

        /// Cell index to inspect
        #[arg(long)]
        cell: Option<usize>,
    },

    /// Build the tiling cache up to a refinement level
    Spheres {
        /// Deepest level to build; defaults to the generation size
        #[arg(long)]
        size: Option<usize>,
    },
}

fn wall_clock_seed() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

/// Load a config file, falling back to defaults when it does not exist.
fn load_config<T: Default>(
    path: &str,
    from_file: impl FnOnce(&Path) -> Result<T, String>,
) -> Result<T, String> {
    let path = Path::new(path);
    if path.exists() {
        from_file(path)
    } else {
        Ok(T::default())
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli.config, SimulationConfig::from_file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    let generation = match load_config(&cli.worldgen, GenerationConfig::from_file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading generation config: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let result = match cli.command {
        Commands::Generate { seed } => {
            let seed = seed.unwrap_or_else(wall_clock_seed);
            commands::generate(&config, &generation, seed)
        }
        Commands::Simulate { seed, steps } => {
            let seed = seed.unwrap_or_else(wall_clock_seed);
            let stop = Arc::new(AtomicBool::new(false));
            let handler_stop = Arc::clone(&stop);
            if let Err(e) = ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed))
            {
                eprintln!("Warning: cannot install interrupt handler: {}", e);
            }
            commands::simulate(&config, &generation, seed, steps, &stop).map(|_| ())
        }
        Commands::Inspect { seed, cell } => commands::inspect(&config, &generation, seed, cell),
        Commands::Spheres { size } => {
            commands::build_spheres(&config, size.unwrap_or(generation.size))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
