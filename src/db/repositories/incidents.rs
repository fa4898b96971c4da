use crate::db::models::{Incident, IncidentRow, IncidentWithCamera, NewIncident};
use crate::db::store::IncidentFilter;
use crate::error::Error;
use anyhow::Result;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, info};

const INCIDENT_COLUMNS: &str =
    "id, camera_id, incident_type, ts_start, ts_end, thumbnail_url, resolved";

/// Incidents repository for handling incident operations
#[derive(Clone)]
pub struct IncidentsRepository {
    pool: Arc<PgPool>,
}

impl IncidentsRepository {
    /// Create a new incidents repository
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a new incident
    pub async fn create(&self, incident: &NewIncident) -> Result<Incident> {
        let result = sqlx::query_as::<_, Incident>(&format!(
            r#"
            INSERT INTO incidents (camera_id, incident_type, ts_start, ts_end, thumbnail_url, resolved)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            INCIDENT_COLUMNS
        ))
        .bind(incident.camera_id)
        .bind(incident.incident_type)
        .bind(incident.ts_start)
        .bind(incident.ts_end)
        .bind(&incident.thumbnail_url)
        .bind(incident.resolved)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to create incident: {}", e)))?;

        Ok(result)
    }

    /// List incidents joined with their camera, newest start first
    pub async fn list(&self, filter: IncidentFilter) -> Result<Vec<IncidentWithCamera>> {
        let mut sql = String::from(
            r#"
            SELECT i.id, i.camera_id, i.incident_type, i.ts_start, i.ts_end,
                   i.thumbnail_url, i.resolved,
                   c.name AS camera_name, c.location AS camera_location
            FROM incidents i
            JOIN cameras c ON c.id = i.camera_id
            "#,
        );

        if filter.unresolved_only {
            sql.push_str(" WHERE i.resolved = FALSE");
        }

        sql.push_str(" ORDER BY i.ts_start DESC, i.id ASC");

        let rows = sqlx::query_as::<_, IncidentRow>(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to list incidents: {}", e)))?;

        debug!("Listed {} incidents ({:?})", rows.len(), filter);

        Ok(rows.into_iter().map(IncidentWithCamera::from).collect())
    }

    /// Set the resolved flag of an incident
    pub async fn set_resolved(&self, id: i32, resolved: bool) -> Result<Incident> {
        let result = sqlx::query_as::<_, Incident>(&format!(
            "UPDATE incidents SET resolved = $2 WHERE id = $1 RETURNING {}",
            INCIDENT_COLUMNS
        ))
        .bind(id)
        .bind(resolved)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to update incident: {}", e)))?
        .ok_or_else(|| Error::NotFound(format!("Incident not found: {}", id)))?;

        info!("Incident {} resolved = {}", id, result.resolved);

        Ok(result)
    }

    /// Flip the resolved flag of an incident
    pub async fn toggle_resolved(&self, id: i32) -> Result<Incident> {
        let result = sqlx::query_as::<_, Incident>(&format!(
            "UPDATE incidents SET resolved = NOT resolved WHERE id = $1 RETURNING {}",
            INCIDENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| Error::Database(format!("Failed to toggle incident: {}", e)))?
        .ok_or_else(|| Error::NotFound(format!("Incident not found: {}", id)))?;

        info!("Incident {} toggled, resolved = {}", id, result.resolved);

        Ok(result)
    }

    /// Count incidents
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM incidents")
            .fetch_one(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to count incidents: {}", e)))?;

        Ok(count)
    }

    /// Delete every incident
    pub async fn delete_all(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM incidents")
            .execute(&*self.pool)
            .await
            .map_err(|e| Error::Database(format!("Failed to delete incidents: {}", e)))?;

        Ok(result.rows_affected())
    }
}
