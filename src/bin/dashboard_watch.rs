use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveTime, Utc};
use clap::Parser;
use incident_dashboard::api::HttpIncidentStore;
use incident_dashboard::config;
use incident_dashboard::{DashboardController, TimelineDay};
use log::{error, info};

/// Load the unresolved incidents from a running API and show which one is
/// active at a given time of day
#[derive(Parser, Debug)]
struct Args {
    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API base URL, overrides the configuration
    #[arg(long)]
    base_url: Option<String>,

    /// Time of day (HH:MM, UTC) to select on today's timeline; defaults to now
    #[arg(long)]
    at: Option<String>,

    /// Incident ids to resolve before printing
    #[arg(long = "resolve")]
    resolve: Vec<i32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.client.base_url = base_url;
    }

    let store = HttpIncidentStore::new(&config.client)?;
    let controller = DashboardController::new(store)
        .with_max_active_distance(config.dashboard.max_active_distance());
    let mut notifications = controller.subscribe();

    controller.initialize().await;

    for id in &args.resolve {
        match controller.resolve(*id).await {
            Ok(incident) => info!("Resolved incident {}", incident.id),
            Err(e) => error!("Failed to resolve incident {}: {}", id, e),
        }
    }
    while let Ok(notification) = notifications.try_recv() {
        info!("[{}] {}", notification.kind, notification.message);
    }

    let day = TimelineDay::today();
    let selected = match args.at {
        Some(at) => {
            let time = NaiveTime::parse_from_str(&at, "%H:%M")
                .with_context(|| format!("Invalid time of day: {}", at))?;
            day.clamp(day.start() + (time - NaiveTime::MIN))
        }
        None => day.clamp(Utc::now()),
    };
    controller.select_time(selected).await;

    let state = controller.state().await;
    if let Some(error) = &state.error {
        println!("Failed to load incidents: {}", error);
    } else {
        println!("{} unresolved incidents", state.incidents.len());
        for incident in &state.incidents {
            println!(
                "  #{:<4} {} - {}  {:<22} {}",
                incident.id(),
                incident.incident.ts_start.format("%H:%M:%S"),
                incident.incident.ts_end.format("%H:%M:%S"),
                incident.incident.incident_type.label(),
                incident.camera.location,
            );
        }
    }

    println!("Selected time: {}", state.selected_time.format("%H:%M"));
    match controller.active_incident().await {
        Some(active) => println!("Active: #{} {}", active.id(), active.summary()),
        None => println!("No incident at this time"),
    }

    controller.shutdown().await;
    Ok(())
}
