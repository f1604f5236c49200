//! CLI for orbit-rs: list the demo planets or run the navigation tour against the container.

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use orbit_rs::solar::{run_tour, SolarModule, SolarSystemApi};
use orbit_rs::{Application, StoreConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orbit")]
#[command(about = "Orbit component store demo")]
struct Cli {
    /// Container settings as JSON (`detect_cycles`, `max_depth`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging (otherwise `RUST_LOG` applies).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the planets shown by the carousel.
    Planets,
    /// Open the carousel and a detail screen, then navigate back, printing store stats per step.
    Tour {
        /// Carousel index of the planet to open.
        #[arg(long, default_value_t = 3)]
        planet: usize,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> Result<StoreConfig, Box<dyn std::error::Error + Send + Sync>> {
    match path {
        Some(path) => Ok(StoreConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(StoreConfig::default()),
    }
}

fn run_planets(app: &Application, json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let planets = app.container().get::<dyn SolarSystemApi>()?.planets();
    if json {
        println!("{}", serde_json::to_string_pretty(&planets)?);
    } else {
        for (index, planet) in planets.iter().enumerate() {
            println!("{index}  {:<8} {}", planet.name, planet.description);
        }
    }
    Ok(())
}

fn run_tour_command(app: &Application, planet: usize, json: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let steps = run_tour(app, planet)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(());
    }
    for step in &steps {
        println!(
            "{:<22} screen={:<12} holders={} buckets={} parents={} scoped={} retained={}",
            step.step,
            format!("{:?}", step.screen),
            step.stats.holders,
            step.stats.buckets,
            step.stats.indexed_parents,
            step.scoped_bindings,
            step.retained.consumers,
        );
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut app = Application::with_config(load_config(cli.config.as_ref())?);
    app.register(&mut SolarModule::new())?;

    match cli.command {
        Commands::Planets => run_planets(&app, cli.json),
        Commands::Tour { planet } => run_tour_command(&app, planet, cli.json),
    }
}
