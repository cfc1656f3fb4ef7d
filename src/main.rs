pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod telemetry;

use std::process;

use config::Config;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

async fn run() -> error::Result<()> {
    let config = Config::load()?;
    telemetry::init_tracing(&config);

    tracing::info!("starting user API");

    api::server::start_server(&config).await
}
