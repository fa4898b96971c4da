use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use incident_dashboard::config;
use incident_dashboard::db::{seed, DatabaseService};
use log::info;

/// Reset the database to the demo cameras and a day of random incidents
#[derive(Parser, Debug)]
struct Args {
    /// Configuration file (.toml or .json); DATABASE_URL overrides the url
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of incidents to create
    #[arg(short = 'n', long, default_value_t = 12)]
    count: usize,

    /// Share of incidents created already resolved (0.0 - 1.0)
    #[arg(long, default_value_t = 0.0)]
    resolved_ratio: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = config::load_config(args.config.as_deref())?;

    info!("Connecting to database at {}", config.database.url);
    let db = DatabaseService::new(&config.database).await?;
    db.run_migrations().await?;

    // Clear existing data
    let removed = db.incidents().delete_all().await?;
    db.cameras().delete_all().await?;
    info!("Removed {} existing incidents", removed);

    let mut cameras = Vec::new();
    for camera in seed::demo_cameras() {
        cameras.push(db.cameras().create(&camera).await?);
    }
    info!("Created cameras: {:?}", cameras);

    let incidents = seed::random_incidents(
        &mut rand::thread_rng(),
        &cameras,
        args.count,
        args.resolved_ratio,
        chrono::Utc::now(),
    )?;
    for incident in &incidents {
        db.incidents().create(incident).await?;
    }

    info!("Seeded {} incidents", db.incidents().count().await?);

    db.pool.close().await;
    Ok(())
}
