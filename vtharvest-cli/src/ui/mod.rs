//! Terminal output helpers.

mod progress;

pub use progress::TerminalSink;

use console::style;
use vtharvest::fetch::FetchSummary;
use vtharvest::harvester::ConvertSummary;
use vtharvest::merge::MergeSummary;

/// Prints a section heading.
pub fn heading(text: &str) {
    println!("{}", style(text).bold().underlined());
}

pub fn print_fetch(summary: &FetchSummary) {
    heading("Fetch");
    if summary.already_complete {
        println!("  already complete ({} tiles)", summary.total);
        return;
    }
    println!("  Tiles:      {}", summary.total);
    println!("  Downloaded: {}", summary.downloaded);
    println!("  Not found:  {}", summary.not_found);
    println!("  Cached:     {}", summary.cached);
}

pub fn print_merge(summary: &MergeSummary) {
    heading("Merge");
    if summary.already_complete {
        println!("  already complete ({} tiles)", summary.total);
        return;
    }
    println!("  Tiles:    {} ({} skipped)", summary.processed, summary.skipped);
    println!("  Features: {}", summary.features);
    println!("  Layers:   {}", summary.layers);
}

pub fn print_convert(summary: &ConvertSummary) {
    heading("Convert");
    println!("  GeoPackages:          {}", summary.geopackages);
    println!("  Unioned layers:       {}", summary.unioned);
    println!("  Unioned GeoPackages:  {}", summary.unioned_geopackages);
}
