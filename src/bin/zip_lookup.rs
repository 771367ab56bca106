//! One-shot service area lookup
//!
//! Loads the dataset once and runs each ZIP given on the command line
//! through the same controller the map server uses.
//!
//! Usage:
//!   cargo run --release --bin zip_lookup -- 02134 4330 99999
//!   cargo run --release --bin zip_lookup -- --csv-file areas.csv 02134

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use service_area_map::{
    config::{init_tracing, DatasetArgs},
    parser,
    source::DatasetSource,
    Controller, LoadStatus, MapEvent, SearchOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "zip_lookup")]
#[command(about = "Check ZIP codes against the service area sheet")]
struct Args {
    /// ZIP codes to look up, searched as typed
    #[arg(required = true)]
    zips: Vec<String>,

    #[command(flatten)]
    dataset: DatasetArgs,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing("warn");

    let args = Args::parse();
    let source = args.dataset.source();

    println!("Service Area Lookup");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Dataset: {}", source.describe());

    let mut controller = Controller::new();
    controller.mount();
    let event = match source.fetch().await {
        Ok(text) => MapEvent::LoadSucceeded(parser::parse(&text)),
        Err(e) => {
            eprintln!("Load failed: {}", e);
            MapEvent::LoadFailed(e)
        }
    };
    controller.apply(event);

    if controller.status() == LoadStatus::Ready {
        println!("Records: {}", controller.dataset().len());
    }
    println!();

    let mut misses = 0;
    for zip in &args.zips {
        controller.apply(MapEvent::QueryChanged(zip.clone()));
        match controller.search() {
            SearchOutcome::Found(location) => {
                println!(
                    "  {:<10} {:<24} ({:.4}, {:.4})",
                    zip, location.city, location.coordinates.lat, location.coordinates.lon
                );
            }
            SearchOutcome::NotFound | SearchOutcome::Unavailable => {
                misses += 1;
                let message = controller
                    .search_state()
                    .error_message
                    .clone()
                    .unwrap_or_default();
                println!("  {:<10} {}", zip, message);
            }
        }
    }

    println!();
    println!("{} of {} in service area", args.zips.len() - misses, args.zips.len());

    if misses > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
