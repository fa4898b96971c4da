pub mod camera_models;
pub mod incident_models;

pub use camera_models::{Camera, NewCamera};
pub use incident_models::{Incident, IncidentRow, IncidentType, IncidentWithCamera, NewIncident};
