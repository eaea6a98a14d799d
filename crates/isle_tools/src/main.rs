//! Isleforge - Development Tools
//!
//! # Usage
//!
//! ```bash
//! # Print a seeded world
//! cargo run -p isle_tools -- generate --seed 42
//!
//! # Validate a structure catalog
//! cargo run -p isle_tools -- validate assets/data/structures.ron
//!
//! # Place a capital and some structures, then save
//! cargo run -p isle_tools -- place --seed 42 house farm market --save island.sav
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use isle_core::prelude::*;
use isle_tools::report::{parse_kind, WorldReport};
use isle_tools::validate::{validate_catalog_file, validate_config_file, validate_path, DataKind};
use isle_tools::Result;

#[derive(Parser)]
#[command(name = "isle-tools")]
#[command(about = "Development tools for Isleforge")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    North,
    South,
    East,
    West,
}

impl From<Direction> for ExpansionDirection {
    fn from(d: Direction) -> Self {
        match d {
            Direction::North => ExpansionDirection::North,
            Direction::South => ExpansionDirection::South,
            Direction::East => ExpansionDirection::East,
            Direction::West => ExpansionDirection::West,
        }
    }
}

#[derive(clap::Args)]
struct WorldArgs {
    /// Random seed (wall clock if omitted)
    #[arg(short, long)]
    seed: Option<i32>,

    /// World config RON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override width
    #[arg(long)]
    width: Option<u32>,

    /// Override height
    #[arg(long)]
    height: Option<u32>,

    /// Structure catalog RON file
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Save the resulting session to a file
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a world and print it
    Generate {
        #[command(flatten)]
        world: WorldArgs,
    },

    /// Validate data files
    Validate {
        /// File or directory of RON files
        #[arg(default_value = "assets/data")]
        path: PathBuf,

        /// What the files contain
        #[arg(short, long, value_enum, default_value = "catalog")]
        kind: DataKind,
    },

    /// Generate a world, place the capital, then place structures in order
    Place {
        #[command(flatten)]
        world: WorldArgs,

        /// Structures to auto-place after the capital (e.g. house, lumber_camp)
        structures: Vec<String>,

        /// Expand the border before placing
        #[arg(long, value_enum)]
        expand: Vec<Direction>,
    },

    /// Print a saved session
    Inspect {
        /// Save file
        path: PathBuf,

        /// Structure catalog RON file
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { world } => run_generate(&world),
        Commands::Validate { path, kind } => run_validate(&path, kind),
        Commands::Place {
            world,
            structures,
            expand,
        } => run_place(&world, &structures, &expand),
        Commands::Inspect {
            path,
            catalog,
            json,
        } => run_inspect(&path, catalog.as_deref(), json),
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn load_catalog(path: Option<&Path>) -> Result<StructureCatalog> {
    match path {
        Some(path) => Ok(validate_catalog_file(path)?),
        None => Ok(StructureCatalog::default()),
    }
}

fn start_session(args: &WorldArgs) -> Result<(i32, Session)> {
    let mut config = match &args.config {
        Some(path) => validate_config_file(path)?,
        None => WorldConfig::standard(),
    };
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    let catalog = load_catalog(args.catalog.as_deref())?;
    let seed = args.seed.unwrap_or_else(|| SeededRng::from_time().state());
    tracing::info!(seed, width = config.width, height = config.height, "Generating world");
    Ok((seed, Session::with_catalog(seed, config, catalog)))
}

fn finish(args: &WorldArgs, session: &Session, report: &WorldReport) -> Result<()> {
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }
    if let Some(path) = &args.save {
        session.save(path)?;
        tracing::info!(path = %path.display(), "Session saved");
    }
    Ok(())
}

fn run_generate(args: &WorldArgs) -> Result<()> {
    let (seed, session) = start_session(args)?;
    let report = WorldReport::from_session(&session, Some(seed));
    finish(args, &session, &report)
}

fn run_validate(path: &Path, kind: DataKind) -> Result<()> {
    tracing::info!("Validating data files in: {}", path.display());
    let checked = validate_path(path, kind)?;
    tracing::info!(checked, "Validation passed");
    Ok(())
}

fn run_place(args: &WorldArgs, structures: &[String], expand: &[Direction]) -> Result<()> {
    let kinds = structures
        .iter()
        .map(|key| parse_kind(key))
        .collect::<Result<Vec<_>>>()?;
    let (seed, mut session) = start_session(args)?;
    let mut failures = Vec::new();

    for &direction in expand {
        if let Err(e) = session.expand_border(direction.into()) {
            failures.push(e.to_string());
        }
    }
    if let Err(e) = session.place_capital() {
        failures.push(e.to_string());
    }
    for kind in kinds {
        if let Err(e) = session.place_best(kind) {
            failures.push(e.to_string());
        }
    }

    let mut report = WorldReport::from_session(&session, Some(seed));
    report.failures = failures;
    finish(args, &session, &report)
}

fn run_inspect(path: &Path, catalog: Option<&Path>, json: bool) -> Result<()> {
    let catalog = load_catalog(catalog)?;
    let session = Session::load(path, catalog)?;
    let report = WorldReport::from_session(&session, None);
    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}
