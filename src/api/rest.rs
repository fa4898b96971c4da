use crate::config::ApiConfig;
use crate::db::store::IncidentStore;
use crate::error::Error;
use anyhow::Result;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

pub mod incident_controller;

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn IncidentStore>,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    pub status: u16,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: StatusCode::BAD_REQUEST.as_u16(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match err {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) | Error::Config(_) => StatusCode::BAD_REQUEST,
            Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ApiError {
            message: err.to_string(),
            status: status.as_u16(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(err) = err.downcast_ref::<Error>() {
            return (*err).clone().into();
        }

        ApiError {
            message: err.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }
}

/// Implement IntoResponse for ApiError
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(self);
        (status, body).into_response()
    }
}

pub struct RestApi {
    config: ApiConfig,
    store: Arc<dyn IncidentStore>,
}

impl RestApi {
    pub fn new(config: &ApiConfig, store: Arc<dyn IncidentStore>) -> Self {
        Self {
            config: config.clone(),
            store,
        }
    }

    /// Build the API router with routes
    pub fn router(&self) -> Router {
        let state = AppState {
            store: Arc::clone(&self.store),
        };

        // Create a CORS layer that allows all origins and preflight requests
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .allow_credentials(false)
            .max_age(Duration::from_secs(3600));

        Router::new()
            .route("/api/health", get(incident_controller::health))
            .route("/api/cameras", get(incident_controller::list_cameras))
            .route("/api/incidents", get(incident_controller::list_incidents))
            .route(
                "/api/incidents/:id/resolve",
                patch(incident_controller::resolve_incident),
            )
            .route(
                "/api/incidents/:id/toggle",
                patch(incident_controller::toggle_incident),
            )
            .with_state(state)
            // Thumbnails are opaque URLs; missing files are the static server's problem
            .nest_service("/thumbnails", ServeDir::new(&self.config.thumbnails_dir))
            .layer(cors)
    }

    pub async fn run(&self) -> Result<()> {
        // Build the server address
        let addr = self.config.address.clone() + ":" + &self.config.port.to_string();
        let addr: SocketAddr = addr.parse()?;

        let listener = std::net::TcpListener::bind(addr)?;
        info!("API server listening on {}", addr);

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: std::net::TcpListener) -> Result<()> {
        listener.set_nonblocking(true)?;

        axum::Server::from_tcp(listener)?
            .serve(self.router().into_make_service())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::MemoryIncidentStore;

    fn api(address: &str, port: u16) -> RestApi {
        let config = ApiConfig {
            address: address.to_string(),
            port,
            ..ApiConfig::default()
        };
        RestApi::new(&config, Arc::new(MemoryIncidentStore::new()))
    }

    #[tokio::test]
    async fn run_fails_on_bad_address() {
        assert!(api("not-an-address", 4750).run().await.is_err());
    }

    #[tokio::test]
    async fn run_fails_when_port_is_taken() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        assert!(api("127.0.0.1", port).run().await.is_err());
    }
}
