//! Merge command - cached tiles into per-layer GeoJSON-lines streams.

use super::common::{GlobalArgs, RegionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui;

/// Run the merge command.
pub fn run(global: GlobalArgs, region: RegionArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(&global)?;
    runner.log_startup("merge");

    let harvester = runner.create_harvester(runner.harvest_config(region))?;
    let summary = harvester.merge()?;

    ui::print_merge(&summary);
    println!("Layers: {}", harvester.layout().merged().display());
    Ok(())
}
