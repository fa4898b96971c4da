use super::camera_models::Camera;
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of security event detected on a camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentType {
    #[serde(rename = "Unauthorised Access")]
    UnauthorisedAccess,
    #[serde(rename = "Gun Threat")]
    GunThreat,
    #[serde(rename = "Suspicious Loitering")]
    SuspiciousLoitering,
}

impl IncidentType {
    pub const ALL: [IncidentType; 3] = [
        IncidentType::UnauthorisedAccess,
        IncidentType::GunThreat,
        IncidentType::SuspiciousLoitering,
    ];

    /// Operator-facing label, also the stored and wire representation
    pub fn label(&self) -> &'static str {
        match self {
            IncidentType::UnauthorisedAccess => "Unauthorised Access",
            IncidentType::GunThreat => "Gun Threat",
            IncidentType::SuspiciousLoitering => "Suspicious Loitering",
        }
    }

    /// Badge color used when rendering the incident type
    pub fn severity_class(&self) -> &'static str {
        match self {
            IncidentType::UnauthorisedAccess => "red",
            IncidentType::GunThreat => "yellow",
            IncidentType::SuspiciousLoitering => "blue",
        }
    }
}

impl std::fmt::Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for IncidentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IncidentType::ALL
            .into_iter()
            .find(|t| t.label() == s)
            .ok_or_else(|| Error::InvalidInput(format!("Unknown incident type: {}", s)))
    }
}

impl sqlx::Type<sqlx::Postgres> for IncidentType {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

impl sqlx::Encode<'_, sqlx::Postgres> for IncidentType {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.label(), buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for IncidentType {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        let text = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(text.parse::<IncidentType>()?)
    }
}

/// Incident model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: i32,
    pub camera_id: i32,
    #[serde(rename = "type")]
    pub incident_type: IncidentType,
    pub ts_start: DateTime<Utc>,
    pub ts_end: DateTime<Utc>,
    pub thumbnail_url: String,
    pub resolved: bool,
}

impl Incident {
    /// Absolute distance between the incident start and `at`
    pub fn distance_to(&self, at: DateTime<Utc>) -> chrono::Duration {
        (self.ts_start - at).abs()
    }
}

/// Incident joined with the camera that recorded it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentWithCamera {
    #[serde(flatten)]
    pub incident: Incident,
    pub camera: Camera,
}

impl IncidentWithCamera {
    pub fn id(&self) -> i32 {
        self.incident.id
    }

    /// One-line description, e.g. "Gun Threat at Basement"
    pub fn summary(&self) -> String {
        format!("{} at {}", self.incident.incident_type, self.camera.location)
    }
}

/// Flat row produced by the incidents/cameras join
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IncidentRow {
    pub id: i32,
    pub camera_id: i32,
    pub incident_type: IncidentType,
    pub ts_start: DateTime<Utc>,
    pub ts_end: DateTime<Utc>,
    pub thumbnail_url: String,
    pub resolved: bool,
    pub camera_name: String,
    pub camera_location: String,
}

impl From<IncidentRow> for IncidentWithCamera {
    fn from(row: IncidentRow) -> Self {
        Self {
            incident: Incident {
                id: row.id,
                camera_id: row.camera_id,
                incident_type: row.incident_type,
                ts_start: row.ts_start,
                ts_end: row.ts_end,
                thumbnail_url: row.thumbnail_url,
                resolved: row.resolved,
            },
            camera: Camera {
                id: row.camera_id,
                name: row.camera_name,
                location: row.camera_location,
            },
        }
    }
}

/// Incident fields needed to insert a new incident
#[derive(Debug, Clone)]
pub struct NewIncident {
    pub camera_id: i32,
    pub incident_type: IncidentType,
    pub ts_start: DateTime<Utc>,
    pub ts_end: DateTime<Utc>,
    pub thumbnail_url: String,
    pub resolved: bool,
}

impl NewIncident {
    /// Build an unresolved incident. Fails if `ts_end` precedes `ts_start`.
    pub fn new(
        camera_id: i32,
        incident_type: IncidentType,
        ts_start: DateTime<Utc>,
        ts_end: DateTime<Utc>,
        thumbnail_url: impl Into<String>,
    ) -> Result<Self, Error> {
        if ts_end < ts_start {
            return Err(Error::InvalidInput(format!(
                "Incident ends ({}) before it starts ({})",
                ts_end, ts_start
            )));
        }

        Ok(Self {
            camera_id,
            incident_type,
            ts_start,
            ts_end,
            thumbnail_url: thumbnail_url.into(),
            resolved: false,
        })
    }

    pub fn resolved(mut self, resolved: bool) -> Self {
        self.resolved = resolved;
        self
    }
}
