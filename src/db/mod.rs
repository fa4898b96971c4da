use crate::config::DatabaseConfig;
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

pub mod migrations;
pub mod models;
pub mod repositories;
pub mod seed;
pub mod store;

use models::{Camera, Incident, IncidentWithCamera};
use repositories::{CamerasRepository, IncidentsRepository};
use store::{IncidentFilter, IncidentStore};

/// Database service for handling connections and migrations
pub struct DatabaseService {
    pub pool: Arc<PgPool>,
    cameras: CamerasRepository,
    incidents: IncidentsRepository,
}

impl DatabaseService {
    /// Create a new database service
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Initializing Database service");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.url)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        info!("Connected to PostgreSQL database");

        let service = Self::from_pool(Arc::new(pool));

        // Run migrations if configured
        if config.auto_migrate {
            service.run_migrations().await?;
        }

        Ok(service)
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: Arc<PgPool>) -> Self {
        Self {
            cameras: CamerasRepository::new(Arc::clone(&pool)),
            incidents: IncidentsRepository::new(Arc::clone(&pool)),
            pool,
        }
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        migrations::run_migrations(&self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to run migrations: {}", e)))?;

        info!("Database migrations completed successfully");

        Ok(())
    }

    pub fn cameras(&self) -> &CamerasRepository {
        &self.cameras
    }

    pub fn incidents(&self) -> &IncidentsRepository {
        &self.incidents
    }
}

#[async_trait]
impl IncidentStore for DatabaseService {
    async fn list_incidents(&self, filter: IncidentFilter) -> Result<Vec<IncidentWithCamera>> {
        self.incidents.list(filter).await
    }

    async fn set_resolved(&self, id: i32, resolved: bool) -> Result<Incident> {
        self.incidents.set_resolved(id, resolved).await
    }

    async fn toggle_resolved(&self, id: i32) -> Result<Incident> {
        self.incidents.toggle_resolved(id).await
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>> {
        self.cameras.get_all().await
    }

    async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&*self.pool).await {
            Ok(_) => true,
            Err(e) => {
                error!("Database health check failed: {}", e);
                false
            }
        }
    }

    async fn close(&self) {
        info!("Closing database pool");
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{IncidentType, NewCamera, NewIncident};
    use chrono::{TimeZone, Utc};

    // Requires a disposable database: TEST_DATABASE_URL=postgres://... cargo test
    #[tokio::test]
    async fn test_postgres_round_trip() -> Result<()> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                println!("Skipping Postgres test. Set TEST_DATABASE_URL to run.");
                return Ok(());
            }
        };

        let service = DatabaseService::new(&DatabaseConfig {
            url,
            max_connections: 2,
            auto_migrate: true,
        })
        .await?;

        service.cameras().delete_all().await?;
        let camera = service
            .cameras()
            .create(&NewCamera::new("Entrance", "Ground Floor"))
            .await?;

        let early = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 3, 14, 14, 0, 0).unwrap();
        let a = service
            .incidents()
            .create(&NewIncident::new(camera.id, IncidentType::GunThreat, early, early, "/a.jpg")?)
            .await?;
        let b = service
            .incidents()
            .create(&NewIncident::new(
                camera.id,
                IncidentType::SuspiciousLoitering,
                late,
                late,
                "/b.jpg",
            )?)
            .await?;

        let listed = service.list_incidents(IncidentFilter::unresolved()).await?;
        assert_eq!(
            listed.iter().map(|i| i.id()).collect::<Vec<_>>(),
            vec![b.id, a.id]
        );
        assert_eq!(listed[0].camera.location, "Ground Floor");

        assert!(service.set_resolved(a.id, true).await?.resolved);
        assert!(service.set_resolved(a.id, true).await?.resolved);
        assert_eq!(service.list_incidents(IncidentFilter::unresolved()).await?.len(), 1);
        assert_eq!(service.list_incidents(IncidentFilter::all()).await?.len(), 2);

        let missing = service.set_resolved(-1, true).await.unwrap_err();
        assert!(matches!(missing.downcast_ref::<Error>(), Some(Error::NotFound(_))));

        service.close().await;
        Ok(())
    }
}
