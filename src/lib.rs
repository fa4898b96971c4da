pub mod api;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;

// Re-export main components for easier use
pub use dashboard::{DashboardController, DashboardState, Notification, NotificationKind, TimelineDay};
pub use db::models::{Camera, Incident, IncidentType, IncidentWithCamera};
pub use db::store::{IncidentFilter, IncidentStore, MemoryIncidentStore};
pub use error::Error;
