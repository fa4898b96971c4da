use crate::db::models::{Camera, Incident, IncidentWithCamera, NewCamera, NewIncident};
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Filter accepted by [`IncidentStore::list_incidents`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IncidentFilter {
    /// Only return incidents that are not resolved
    pub unresolved_only: bool,
}

impl IncidentFilter {
    pub fn all() -> Self {
        Self {
            unresolved_only: false,
        }
    }

    pub fn unresolved() -> Self {
        Self {
            unresolved_only: true,
        }
    }

    /// Interpret the `resolved` query parameter. Only the literal string
    /// `false` narrows the result; anything else, `true` included, lists
    /// every incident.
    pub fn from_query_param(resolved: Option<&str>) -> Self {
        match resolved {
            Some("false") => Self::unresolved(),
            _ => Self::all(),
        }
    }

    /// Query parameter value that reproduces this filter over HTTP
    pub fn query_param(&self) -> Option<&'static str> {
        self.unresolved_only.then_some("false")
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        !self.unresolved_only || !incident.resolved
    }
}

/// Source of incidents and the single mutation the dashboard performs.
///
/// Implemented by the Postgres repository, the in-memory store and the HTTP
/// client, so a dashboard controller can run against any of them.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Incidents matching `filter`, newest `ts_start` first, joined with their camera
    async fn list_incidents(&self, filter: IncidentFilter) -> Result<Vec<IncidentWithCamera>>;

    /// Set the resolved flag. Writing the current value again is a no-op.
    async fn set_resolved(&self, id: i32, resolved: bool) -> Result<Incident>;

    /// Flip the resolved flag
    async fn toggle_resolved(&self, id: i32) -> Result<Incident>;

    /// All cameras ordered by id
    async fn list_cameras(&self) -> Result<Vec<Camera>>;

    /// Whether the backing storage is reachable
    async fn health_check(&self) -> bool {
        true
    }

    /// Release any resources held by the store
    async fn close(&self) {}
}

#[async_trait]
impl<T: IncidentStore + ?Sized> IncidentStore for std::sync::Arc<T> {
    async fn list_incidents(&self, filter: IncidentFilter) -> Result<Vec<IncidentWithCamera>> {
        (**self).list_incidents(filter).await
    }

    async fn set_resolved(&self, id: i32, resolved: bool) -> Result<Incident> {
        (**self).set_resolved(id, resolved).await
    }

    async fn toggle_resolved(&self, id: i32) -> Result<Incident> {
        (**self).toggle_resolved(id).await
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>> {
        (**self).list_cameras().await
    }

    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }

    async fn close(&self) {
        (**self).close().await
    }
}

#[derive(Default)]
struct MemoryState {
    cameras: Vec<Camera>,
    incidents: Vec<Incident>,
    next_camera_id: i32,
    next_incident_id: i32,
}

/// In-memory incident store used for tests and demo mode
#[derive(Default)]
pub struct MemoryIncidentStore {
    state: RwLock<MemoryState>,
}

impl MemoryIncidentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a camera and return it with its assigned id
    pub async fn add_camera(&self, camera: NewCamera) -> Camera {
        let mut state = self.state.write().await;
        state.next_camera_id += 1;
        let camera = Camera {
            id: state.next_camera_id,
            name: camera.name,
            location: camera.location,
        };
        state.cameras.push(camera.clone());
        camera
    }

    /// Add an incident. The referenced camera must already exist.
    pub async fn add_incident(&self, incident: NewIncident) -> Result<Incident> {
        let mut state = self.state.write().await;
        if !state.cameras.iter().any(|c| c.id == incident.camera_id) {
            return Err(Error::InvalidInput(format!(
                "Camera not found: {}",
                incident.camera_id
            ))
            .into());
        }

        state.next_incident_id += 1;
        let incident = Incident {
            id: state.next_incident_id,
            camera_id: incident.camera_id,
            incident_type: incident.incident_type,
            ts_start: incident.ts_start,
            ts_end: incident.ts_end,
            thumbnail_url: incident.thumbnail_url,
            resolved: incident.resolved,
        };
        state.incidents.push(incident.clone());
        Ok(incident)
    }

    async fn update<F>(&self, id: i32, change: F) -> Result<Incident>
    where
        F: FnOnce(&mut Incident) + Send,
    {
        let mut state = self.state.write().await;
        let incident = state
            .incidents
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| Error::NotFound(format!("Incident not found: {}", id)))?;
        change(incident);
        Ok(incident.clone())
    }
}

#[async_trait]
impl IncidentStore for MemoryIncidentStore {
    async fn list_incidents(&self, filter: IncidentFilter) -> Result<Vec<IncidentWithCamera>> {
        let state = self.state.read().await;
        let mut incidents = state
            .incidents
            .iter()
            .filter(|i| filter.matches(i))
            .map(|i| -> Result<IncidentWithCamera> {
                let camera = state
                    .cameras
                    .iter()
                    .find(|c| c.id == i.camera_id)
                    .cloned()
                    .ok_or_else(|| Error::Internal(format!("Camera {} missing", i.camera_id)))?;
                Ok(IncidentWithCamera {
                    incident: i.clone(),
                    camera,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        incidents.sort_by(|a, b| {
            b.incident
                .ts_start
                .cmp(&a.incident.ts_start)
                .then(a.incident.id.cmp(&b.incident.id))
        });
        Ok(incidents)
    }

    async fn set_resolved(&self, id: i32, resolved: bool) -> Result<Incident> {
        self.update(id, |incident| incident.resolved = resolved).await
    }

    async fn toggle_resolved(&self, id: i32) -> Result<Incident> {
        self.update(id, |incident| incident.resolved = !incident.resolved)
            .await
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>> {
        let mut cameras = self.state.read().await.cameras.clone();
        cameras.sort_by_key(|c| c.id);
        Ok(cameras)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::IncidentType;
    use chrono::{TimeZone, Utc};

    async fn seeded() -> MemoryIncidentStore {
        let store = MemoryIncidentStore::new();
        let vault = store.add_camera(NewCamera::new("Vault", "Basement")).await;
        for (hour, resolved) in [(9, false), (14, false), (11, true)] {
            let start = Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0).unwrap();
            let incident = NewIncident::new(
                vault.id,
                IncidentType::SuspiciousLoitering,
                start,
                start + chrono::Duration::minutes(10),
                "/thumbnails/incident1.jpg",
            )
            .unwrap()
            .resolved(resolved);
            store.add_incident(incident).await.unwrap();
        }
        store
    }

    #[test]
    fn only_literal_false_filters() {
        assert_eq!(IncidentFilter::from_query_param(Some("false")), IncidentFilter::unresolved());
        assert_eq!(IncidentFilter::from_query_param(Some("true")), IncidentFilter::all());
        assert_eq!(IncidentFilter::from_query_param(Some("False")), IncidentFilter::all());
        assert_eq!(IncidentFilter::from_query_param(Some("0")), IncidentFilter::all());
        assert_eq!(IncidentFilter::from_query_param(None), IncidentFilter::all());
    }

    #[tokio::test]
    async fn list_orders_by_start_descending_and_filters() {
        let store = seeded().await;

        let all = store.list_incidents(IncidentFilter::all()).await.unwrap();
        let ids: Vec<i32> = all.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(all[0].camera.location, "Basement");

        let open = store
            .list_incidents(IncidentFilter::unresolved())
            .await
            .unwrap();
        let ids: Vec<i32> = open.iter().map(|i| i.id()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn set_resolved_is_idempotent_but_toggle_is_not() {
        let store = seeded().await;

        assert!(store.set_resolved(1, true).await.unwrap().resolved);
        assert!(store.set_resolved(1, true).await.unwrap().resolved);

        assert!(store.toggle_resolved(2).await.unwrap().resolved);
        assert!(!store.toggle_resolved(2).await.unwrap().resolved);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = seeded().await;
        let err = store.set_resolved(99, true).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn incidents_require_an_existing_camera() {
        let store = MemoryIncidentStore::new();
        let start = Utc::now();
        let incident =
            NewIncident::new(5, IncidentType::GunThreat, start, start, "/t.jpg").unwrap();
        assert!(store.add_incident(incident).await.is_err());
    }
}
