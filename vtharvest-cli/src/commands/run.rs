//! Run command - every stage of a harvest in order.

use std::time::Instant;

use super::common::{GlobalArgs, RegionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui;

/// Run the run command.
pub fn run(global: GlobalArgs, region: RegionArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(&global)?;
    runner.log_startup("run");

    let harvester = runner.create_harvester(runner.harvest_config(region))?;
    println!(
        "Harvesting '{}' into {}",
        harvester.config().name(),
        harvester.layout().root().display()
    );

    let start = Instant::now();
    let summary = runner.block_on(harvester.run_all())??;

    ui::print_fetch(&summary.fetch);
    ui::print_merge(&summary.merge);
    ui::print_convert(&summary.convert);
    println!();
    println!("Finished in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
