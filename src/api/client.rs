use crate::api::rest::ApiError;
use crate::config::ClientConfig;
use crate::db::models::{Camera, Incident, IncidentWithCamera};
use crate::db::store::{IncidentFilter, IncidentStore};
use crate::error::Error;
use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Incident store backed by a remote incident API
pub struct HttpIncidentStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIncidentStore {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {} failed: {}", url, e)))?;
        decode(response).await
    }

    async fn patch<T: DeserializeOwned>(&self, url: String) -> Result<T> {
        debug!("PATCH {}", url);
        let response = self
            .client
            .patch(&url)
            .send()
            .await
            .map_err(|e| Error::Http(format!("PATCH {} failed: {}", url, e)))?;
        decode(response).await
    }
}

/// Map non-2xx responses onto the crate error and decode the body otherwise
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let message = match response.json::<ApiError>().await {
            Ok(body) => body.message,
            Err(_) => status.to_string(),
        };

        return Err(match status {
            StatusCode::NOT_FOUND => Error::NotFound(message),
            StatusCode::BAD_REQUEST => Error::InvalidInput(message),
            _ => Error::Http(format!("{}: {}", status, message)),
        }
        .into());
    }

    let body = response
        .json::<T>()
        .await
        .map_err(|e| Error::Http(format!("Failed to decode response: {}", e)))?;

    Ok(body)
}

#[async_trait]
impl IncidentStore for HttpIncidentStore {
    async fn list_incidents(&self, filter: IncidentFilter) -> Result<Vec<IncidentWithCamera>> {
        let url = match filter.query_param() {
            Some(resolved) => self.url(&format!("/incidents?resolved={}", resolved)),
            None => self.url("/incidents"),
        };
        self.get(url).await
    }

    async fn set_resolved(&self, id: i32, resolved: bool) -> Result<Incident> {
        if !resolved {
            return Err(Error::InvalidInput(
                "The incident API cannot reopen incidents".to_string(),
            )
            .into());
        }
        self.patch(self.url(&format!("/incidents/{}/resolve", id)))
            .await
    }

    async fn toggle_resolved(&self, id: i32) -> Result<Incident> {
        self.patch(self.url(&format!("/incidents/{}/toggle", id)))
            .await
    }

    async fn list_cameras(&self) -> Result<Vec<Camera>> {
        self.get(self.url("/cameras")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rest::RestApi;
    use crate::config::ApiConfig;
    use crate::dashboard::DashboardController;
    use crate::db::models::{IncidentType, NewCamera, NewIncident};
    use crate::db::store::MemoryIncidentStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    struct TestServer {
        base_url: String,
        store: Arc<MemoryIncidentStore>,
        ids: (i32, i32, i32),
    }

    /// Serve A(09:00, open), B(14:00, open), C(14:00, resolved) on an ephemeral port
    async fn start_server() -> TestServer {
        let store = Arc::new(MemoryIncidentStore::new());
        let camera = store.add_camera(NewCamera::new("Vault", "Basement")).await;
        let mut ids = Vec::new();
        for (hour, resolved) in [(9, false), (14, false), (14, true)] {
            let start = Utc.with_ymd_and_hms(2025, 3, 14, hour, 0, 0).unwrap();
            let incident = NewIncident::new(
                camera.id,
                IncidentType::GunThreat,
                start,
                start + chrono::Duration::minutes(5),
                format!("/thumbnails/incident{}.jpg", hour),
            )
            .unwrap()
            .resolved(resolved);
            ids.push(store.add_incident(incident).await.unwrap().id);
        }

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let api = RestApi::new(&ApiConfig::default(), store.clone());
        tokio::spawn(async move { api.serve(listener).await });

        TestServer {
            base_url: format!("http://{}", addr),
            store,
            ids: (ids[0], ids[1], ids[2]),
        }
    }

    fn client(server: &TestServer) -> HttpIncidentStore {
        HttpIncidentStore::new(&ClientConfig {
            base_url: server.base_url.clone(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    async fn listed_ids(server: &TestServer, query: &str) -> Vec<i32> {
        let body: Vec<IncidentWithCamera> =
            reqwest::get(format!("{}/api/incidents{}", server.base_url, query))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
        body.iter().map(|i| i.id()).collect()
    }

    #[tokio::test]
    async fn only_literal_false_filters_over_http() {
        let server = start_server().await;
        let (a, b, c) = server.ids;

        assert_eq!(listed_ids(&server, "?resolved=false").await, vec![b, a]);
        assert_eq!(listed_ids(&server, "?resolved=true").await, vec![b, c, a]);
        assert_eq!(listed_ids(&server, "?resolved=no").await, vec![b, c, a]);
        assert_eq!(listed_ids(&server, "").await, vec![b, c, a]);
    }

    #[tokio::test]
    async fn listing_carries_camera_and_wire_names() {
        let server = start_server().await;
        let body: serde_json::Value =
            reqwest::get(format!("{}/api/incidents?resolved=false", server.base_url))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();

        assert_eq!(body[0]["type"], "Gun Threat");
        assert_eq!(body[0]["camera"]["location"], "Basement");
        assert_eq!(body[0]["thumbnailUrl"], "/thumbnails/incident14.jpg");
        assert_eq!(body[0]["resolved"], false);
    }

    #[tokio::test]
    async fn resolve_route_status_codes() {
        let server = start_server().await;
        let http = reqwest::Client::new();
        let (a, _, _) = server.ids;

        let bad = http
            .patch(format!("{}/api/incidents/abc/resolve", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
        let body: ApiError = bad.json().await.unwrap();
        assert_eq!(body.status, 400);

        let missing = http
            .patch(format!("{}/api/incidents/999/resolve", server.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        for _ in 0..2 {
            let ok = http
                .patch(format!("{}/api/incidents/{}/resolve", server.base_url, a))
                .send()
                .await
                .unwrap();
            assert_eq!(ok.status(), StatusCode::OK);
            let incident: Incident = ok.json().await.unwrap();
            assert_eq!(incident.id, a);
            assert!(incident.resolved);
        }
    }

    #[tokio::test]
    async fn health_reports_store_status() {
        let server = start_server().await;
        let response = reqwest::get(format!("{}/api/health", server.base_url))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn toggle_route_flips_the_flag() {
        let server = start_server().await;
        let store = client(&server);
        let (_, _, c) = server.ids;

        assert!(!store.toggle_resolved(c).await.unwrap().resolved);
        assert!(store.toggle_resolved(c).await.unwrap().resolved);
    }

    #[tokio::test]
    async fn client_maps_errors_onto_crate_errors() {
        let server = start_server().await;
        let store = client(&server);

        let err = store.set_resolved(999, true).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotFound(_))));

        let err = store.set_resolved(1, false).await.unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidInput(_))));

        let cameras = store.list_cameras().await.unwrap();
        assert_eq!(cameras.len(), 1);
        assert_eq!(cameras[0].location, "Basement");
    }

    #[tokio::test]
    async fn unreachable_api_surfaces_as_load_error() {
        // bind then drop to get a port nobody listens on
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let store = HttpIncidentStore::new(&ClientConfig {
            base_url: format!("http://127.0.0.1:{}", port),
            timeout_secs: 2,
        })
        .unwrap();
        let controller = DashboardController::new(store);

        controller.initialize().await;

        let state = controller.state().await;
        assert!(state.incidents.is_empty());
        assert!(state.error.is_some());
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn controller_over_http() {
        let server = start_server().await;
        let (a, b, _) = server.ids;
        let controller = DashboardController::new(client(&server));
        let mut rx = controller.subscribe();

        controller.initialize().await;
        assert_eq!(
            controller.state().await.incidents.iter().map(|i| i.id()).collect::<Vec<_>>(),
            vec![b, a]
        );

        controller
            .select_time(Utc.with_ymd_and_hms(2025, 3, 14, 13, 0, 0).unwrap())
            .await;
        assert_eq!(controller.active_incident().await.map(|i| i.id()), Some(b));

        controller.resolve(b).await.unwrap();
        assert!(rx.try_recv().unwrap().kind == crate::dashboard::NotificationKind::ResolveSucceeded);

        let open = server
            .store
            .list_incidents(IncidentFilter::unresolved())
            .await
            .unwrap();
        assert_eq!(controller.state().await.incidents, open);

        assert!(controller.resolve(999).await.is_err());
        assert!(rx.try_recv().unwrap().is_failure());
        assert_eq!(controller.state().await.incidents, open);
    }
}
