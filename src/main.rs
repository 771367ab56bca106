//! Service area map server
//!
//! Hosts one map controller for the life of the process, loads the
//! service-area sheet once on startup and serves the view model to the
//! rendering surface.
//!
//! Usage:
//!   ./target/release/service_area_map [options]
//!
//! Options:
//!   --port PORT          Port to listen on (default: 8080, env SERVICE_AREA_PORT)
//!   --host ADDR          Interface to bind (default: 0.0.0.0)
//!   --csv-url URL        Published sheet CSV (env SERVICE_AREA_CSV_URL)
//!   --csv-file PATH      Local CSV export instead of the URL
//!
//! Endpoints:
//!   GET  /api/v1/health            - Health check
//!   GET  /api/v1/map               - Current view model
//!   GET  /api/v1/reference-points  - State capital markers
//!   GET  /api/v1/reference-points/:state - One capital by state code
//!   PUT  /api/v1/query             - Edit the ZIP query text
//!   POST /api/v1/search            - Run a ZIP search
//!   PUT  /api/v1/view              - Report pan/zoom
//!   POST /api/v1/view/reset        - Restore the default viewport
//!   GET  /api/v1/events            - SSE stream of view model changes

use anyhow::Result;
use clap::Parser;
use service_area_map::{
    api::create_router,
    config::{init_tracing, DatasetArgs, ServerArgs},
    Controller, MapStore,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "service_area_map")]
#[command(about = "Serve the service area map state over HTTP")]
struct Cli {
    #[command(flatten)]
    server: ServerArgs,

    #[command(flatten)]
    dataset: DatasetArgs,
}

fn print_banner(cli: &Cli) {
    println!("============================================================");
    println!("              SERVICE AREA MAP SERVER");
    println!("============================================================");
    println!();
    println!("  Listen:   http://{}:{}/api/v1/", cli.server.host, cli.server.port);
    match &cli.dataset.csv_file {
        Some(path) => println!("  Dataset:  {}", path.display()),
        None => println!("  Dataset:  {}", cli.dataset.csv_url),
    }
    println!();
    println!("============================================================");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");

    let cli = Cli::parse();
    print_banner(&cli);

    let addr = cli.server.addr()?;
    let store = MapStore::spawn(Controller::new());

    // Load runs in the background; the map serves reference points meanwhile
    store.mount(cli.dataset.source()).await?;

    let app = create_router(store);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
