//! Demo data: the three store cameras and a day of random incidents.

use crate::db::models::{Camera, IncidentType, NewCamera, NewIncident};
use crate::error::Error;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const THUMBNAIL_COUNT: usize = 6;

pub fn demo_cameras() -> Vec<NewCamera> {
    vec![
        NewCamera::new("Shop Floor A", "First Floor"),
        NewCamera::new("Vault", "Basement"),
        NewCamera::new("Entrance", "Ground Floor"),
    ]
}

/// `count` incidents spread over the 24 hours before `now`.
///
/// Cameras and incident types are assigned round-robin. Each incident lasts
/// up to 30 minutes and a `resolved_ratio` share of them start out resolved.
pub fn random_incidents<R: Rng>(
    rng: &mut R,
    cameras: &[Camera],
    count: usize,
    resolved_ratio: f64,
    now: DateTime<Utc>,
) -> Result<Vec<NewIncident>> {
    if cameras.is_empty() {
        return Err(anyhow::anyhow!("Cannot seed incidents without cameras"));
    }

    if !resolved_ratio.is_finite() {
        return Err(Error::InvalidInput(format!(
            "Resolved ratio must be a number between 0 and 1, got {}",
            resolved_ratio
        ))
        .into());
    }

    let window_start = now - Duration::hours(24);
    let resolved_ratio = resolved_ratio.clamp(0.0, 1.0);

    (0..count)
        .map(|i| -> Result<NewIncident> {
            let camera = &cameras[i % cameras.len()];
            let incident_type = IncidentType::ALL[i % IncidentType::ALL.len()];
            let ts_start = window_start + Duration::milliseconds(rng.gen_range(0..86_400_000));
            let ts_end = ts_start + Duration::milliseconds(rng.gen_range(0..=1_800_000));
            let thumbnail = format!("/thumbnails/incident{}.jpg", (i % THUMBNAIL_COUNT) + 1);

            let incident = NewIncident::new(camera.id, incident_type, ts_start, ts_end, thumbnail)?
                .resolved(rng.gen_bool(resolved_ratio));
            Ok(incident)
        })
        .collect()
}
