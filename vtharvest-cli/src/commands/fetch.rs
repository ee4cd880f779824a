//! Fetch command - download the region's tiles into the cache.

use super::common::{GlobalArgs, RegionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui;

/// Run the fetch command.
pub fn run(global: GlobalArgs, region: RegionArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(&global)?;
    runner.log_startup("fetch");

    let harvester = runner.create_harvester(runner.harvest_config(region))?;
    let tiles = harvester.tiles().len();
    println!(
        "Fetching {} tiles at zoom {} from {}",
        tiles,
        harvester.config().zoom(),
        harvester.config().url()
    );

    let summary = runner.block_on(harvester.fetch())??;
    ui::print_fetch(&summary);
    println!("Tiles: {}", harvester.layout().tiles().display());
    Ok(())
}
