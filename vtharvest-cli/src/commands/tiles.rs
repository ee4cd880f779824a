//! Tiles command - show which tiles a region covers.

use vtharvest::config::HarvestConfig;
use vtharvest::coord::{tile_range, tiles_in_bbox};
use vtharvest::stage::StageLayout;

use super::common::{GlobalArgs, RegionArgs};
use crate::error::CliError;
use crate::runner::CliRunner;
use crate::ui;

/// Run the tiles command.
///
/// Nothing is fetched and no directories are created.
pub fn run(global: GlobalArgs, region: RegionArgs, list: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(&global)?;
    runner.log_startup("tiles");
    let config = runner.harvest_config(region);

    print_region(&config);
    if list {
        for tile in tiles_in_bbox(config.bbox(), config.zoom()) {
            println!("{}", tile);
        }
    }
    Ok(())
}

fn print_region(config: &HarvestConfig) {
    let (min_x, min_y, max_x, max_y) = tile_range(config.bbox(), config.zoom());
    let columns = (max_x - min_x + 1) as u64;
    let rows = (max_y - min_y + 1) as u64;
    let layout = StageLayout::new(config.cache_dir(), config.name());

    ui::heading(config.name());
    println!("  Bounding box: {}", config.bbox());
    println!("  Zoom:         {}", config.zoom());
    println!("  X range:      {}..={}", min_x, max_x);
    println!("  Y range:      {}..={}", min_y, max_y);
    println!("  Tiles:        {} ({} x {})", columns * rows, columns, rows);
    println!("  URL:          {}", config.url());
    println!("  Directory:    {}", layout.root().display());
}
