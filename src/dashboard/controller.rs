use super::notification::Notification;
use super::timeline::TimelineDay;
use crate::db::models::{Incident, IncidentWithCamera};
use crate::db::store::{IncidentFilter, IncidentStore};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use tokio::sync::{broadcast, Mutex};

const NOTIFICATION_CAPACITY: usize = 64;

/// Snapshot of what the dashboard renders
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    /// Unresolved incidents, newest `ts_start` first
    pub incidents: Vec<IncidentWithCamera>,
    pub selected_time: DateTime<Utc>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Incident whose start is closest to `at`. Exact ties go to the incident
/// encountered first. With `max_distance` set, an incident farther away than
/// that is never returned.
///
/// Linear in `incidents`; called on every scrub event, nothing is cached.
pub fn active_incident(
    incidents: &[IncidentWithCamera],
    at: DateTime<Utc>,
    max_distance: Option<Duration>,
) -> Option<&IncidentWithCamera> {
    let mut closest: Option<(&IncidentWithCamera, Duration)> = None;

    for incident in incidents {
        let distance = incident.incident.distance_to(at);
        if closest.map_or(true, |(_, best)| distance < best) {
            closest = Some((incident, distance));
        }
    }

    closest
        .filter(|(_, distance)| max_distance.map_or(true, |max| *distance <= max))
        .map(|(incident, _)| incident)
}

struct Inner {
    state: DashboardState,
    /// Sequence number handed to the most recent list fetch
    issued_seq: u64,
    /// Sequence number of the last list response written to `state`
    applied_seq: u64,
    fetches_in_flight: usize,
    /// Ids with a resolve request still awaiting its response
    pending_resolves: HashMap<i32, usize>,
    /// Resolved ids mapped to `issued_seq` when their resolve succeeded.
    /// Listings at or below that sequence may predate the resolve.
    settled_resolves: HashMap<i32, u64>,
}

impl Inner {
    fn apply_listing(&mut self, seq: u64, listing: Vec<IncidentWithCamera>) {
        let pending = &self.pending_resolves;
        let settled = &self.settled_resolves;
        self.state.incidents = listing
            .into_iter()
            .filter(|incident| {
                let id = incident.id();
                !pending.contains_key(&id) && settled.get(&id).map_or(true, |&at| seq > at)
            })
            .collect();
        self.state.error = None;

        // a listing issued after the resolve settled already reflects it
        self.settled_resolves.retain(|_, at| *at >= seq);
    }
}

/// Owns the dashboard's view of unresolved incidents.
///
/// State sits behind a mutex that is never held across a store call, so
/// `initialize` and `resolve` futures can interleave freely. List responses
/// carry a sequence number and a response older than the last one applied
/// is dropped.
pub struct DashboardController<S: IncidentStore> {
    store: S,
    inner: Mutex<Inner>,
    notifications: broadcast::Sender<Notification>,
    max_active_distance: Option<Duration>,
}

impl<S: IncidentStore> DashboardController<S> {
    /// Create a controller that owns `store`. Nothing is fetched until
    /// [`initialize`](Self::initialize) is called.
    pub fn new(store: S) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        Self {
            store,
            inner: Mutex::new(Inner {
                state: DashboardState {
                    incidents: Vec::new(),
                    selected_time: Utc::now(),
                    loading: false,
                    error: None,
                },
                issued_seq: 0,
                applied_seq: 0,
                fetches_in_flight: 0,
                pending_resolves: HashMap::new(),
                settled_resolves: HashMap::new(),
            }),
            notifications,
            max_active_distance: None,
        }
    }

    /// Only report an active incident starting within `max` of the selected time
    pub fn with_max_active_distance(mut self, max: Option<Duration>) -> Self {
        self.max_active_distance = max;
        self
    }

    /// Receive resolve notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Load the unresolved incidents from the store.
    ///
    /// On failure the error message is kept in the state and the list is
    /// emptied. Nothing is retried.
    pub async fn initialize(&self) {
        let seq = {
            let mut inner = self.inner.lock().await;
            inner.issued_seq += 1;
            inner.fetches_in_flight += 1;
            inner.state.loading = true;
            inner.issued_seq
        };

        let result = self.store.list_incidents(IncidentFilter::unresolved()).await;

        let mut inner = self.inner.lock().await;
        inner.fetches_in_flight -= 1;
        inner.state.loading = inner.fetches_in_flight > 0;

        if seq < inner.applied_seq {
            debug!(
                "Discarding stale incident listing (seq {} < applied {})",
                seq, inner.applied_seq
            );
            return;
        }
        inner.applied_seq = seq;

        match result {
            Ok(listing) => {
                debug!("Loaded {} unresolved incidents", listing.len());
                inner.apply_listing(seq, listing);
            }
            Err(e) => {
                warn!("Failed to load incidents: {}", e);
                inner.state.incidents.clear();
                inner.state.error = Some(e.to_string());
            }
        }
    }

    /// Operator-triggered reload after a failed load
    pub async fn retry(&self) {
        self.initialize().await
    }

    /// Mark an incident resolved.
    ///
    /// The incident leaves the local list before the store is called. A
    /// failure publishes a failure notification and reloads the whole list
    /// from the store.
    pub async fn resolve(&self, id: i32) -> Result<Incident> {
        {
            let mut inner = self.inner.lock().await;
            inner.state.incidents.retain(|incident| incident.id() != id);
            *inner.pending_resolves.entry(id).or_insert(0) += 1;
        }

        let result = self.store.set_resolved(id, true).await;

        {
            let mut inner = self.inner.lock().await;
            if let Some(count) = inner.pending_resolves.get_mut(&id) {
                *count -= 1;
                if *count == 0 {
                    inner.pending_resolves.remove(&id);
                }
            }
            if result.is_ok() {
                let seq = inner.issued_seq;
                inner.settled_resolves.insert(id, seq);
            }
        }

        match result {
            Ok(incident) => {
                info!("Incident {} resolved", id);
                self.notify(Notification::resolved(id));
                Ok(incident)
            }
            Err(e) => {
                warn!("Failed to resolve incident {}: {}", id, e);
                self.notify(Notification::resolve_failed(id, &e));
                self.initialize().await;
                Err(e)
            }
        }
    }

    /// Move the timeline cursor. Callers clamp drag input to the reference day.
    pub async fn select_time(&self, t: DateTime<Utc>) {
        self.inner.lock().await.state.selected_time = t;
    }

    /// Move the timeline cursor to a scrub position on `day`
    pub async fn scrub(&self, day: &TimelineDay, fraction: f64) {
        self.select_time(day.time_at_fraction(fraction)).await
    }

    /// Incident closest to the selected time, if any
    pub async fn active_incident(&self) -> Option<IncidentWithCamera> {
        let inner = self.inner.lock().await;
        active_incident(
            &inner.state.incidents,
            inner.state.selected_time,
            self.max_active_distance,
        )
        .cloned()
    }

    pub async fn state(&self) -> DashboardState {
        self.inner.lock().await.state.clone()
    }

    /// Close the store and drop the controller
    pub async fn shutdown(self) {
        self.store.close().await;
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            debug!("No notification subscribers");
        }
    }
}
