//! vtharvest CLI - Command-line interface
//!
//! This binary provides a command-line interface to the vtharvest library.

mod commands;
mod error;
mod runner;
mod ui;

use clap::{Parser, Subcommand};

use commands::common::{GlobalArgs, RegionArgs};

#[derive(Parser)]
#[command(name = "vtharvest")]
#[command(version, about = "Harvest vector tiles of a region into GeoJSON and GeoPackage layers", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, merge and convert in one go, resuming finished stages
    Run {
        #[command(flatten)]
        region: RegionArgs,
    },
    /// Download every tile of the region into the cache
    Fetch {
        #[command(flatten)]
        region: RegionArgs,
    },
    /// Merge cached tiles into one gzip GeoJSON-lines file per layer
    Merge {
        #[command(flatten)]
        region: RegionArgs,
    },
    /// Convert merged layers to GeoPackage and union them with ogr2ogr
    Convert {
        #[command(flatten)]
        region: RegionArgs,
    },
    /// Show the tile range of the region without fetching anything
    Tiles {
        #[command(flatten)]
        region: RegionArgs,

        /// Print every tile as z/x/y
        #[arg(long)]
        list: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let global = cli.global;

    let result = match cli.command {
        Commands::Run { region } => commands::run::run(global, region),
        Commands::Fetch { region } => commands::fetch::run(global, region),
        Commands::Merge { region } => commands::merge::run(global, region),
        Commands::Convert { region } => commands::convert::run(global, region),
        Commands::Tiles { region, list } => commands::tiles::run(global, region, list),
    };

    if let Err(e) = result {
        e.exit();
    }
}
