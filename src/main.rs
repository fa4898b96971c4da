use anyhow::Result;
use clap::Parser;
use incident_dashboard::api::RestApi;
use incident_dashboard::config;
use incident_dashboard::db::{seed, store::MemoryIncidentStore, DatabaseService};
use incident_dashboard::IncidentStore;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;

/// Incident dashboard API server
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve seeded demo data from memory instead of PostgreSQL
    #[arg(long)]
    memory: bool,
}

async fn memory_store() -> Result<Arc<dyn IncidentStore>> {
    let store = MemoryIncidentStore::new();
    let mut cameras = Vec::new();
    for camera in seed::demo_cameras() {
        cameras.push(store.add_camera(camera).await);
    }

    let incidents = seed::random_incidents(
        &mut rand::thread_rng(),
        &cameras,
        12,
        0.0,
        chrono::Utc::now(),
    )?;
    for incident in incidents {
        store.add_incident(incident).await?;
    }

    info!("Seeded in-memory store with demo incidents");
    Ok(Arc::new(store))
}

async fn run_app(args: Args) -> Result<()> {
    let config = config::load_config(args.config.as_deref())?;

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.api.log_level))
        .init();
    info!("Starting incident dashboard");
    info!("Configuration loaded");

    let store: Arc<dyn IncidentStore> = if args.memory {
        memory_store().await?
    } else {
        Arc::new(DatabaseService::new(&config.database).await?)
    };

    let http_server = RestApi::new(&config.api, Arc::clone(&store));

    let result = tokio::select! {
        result = http_server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down...");
            Ok(())
        }
    };

    store.close().await;
    result
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run_app(args).await {
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}
