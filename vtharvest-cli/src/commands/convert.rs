//! Convert command - GeoPackage conversion and attribute-wise union.

use super::common::{GlobalArgs, RegionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui;

/// Run the convert command.
pub fn run(global: GlobalArgs, region: RegionArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(&global)?;
    runner.log_startup("convert");

    let harvester = runner.create_harvester(runner.harvest_config(region))?;
    println!("Converting with {}", harvester.config().ogr2ogr());
    let summary = harvester.convert()?;

    ui::print_convert(&summary);
    println!(
        "GeoPackages: {}",
        harvester.layout().unioned_geopackages().display()
    );
    Ok(())
}
