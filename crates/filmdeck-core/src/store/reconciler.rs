// ── Reconciler ──
//
// Owns the one mutable `DashboardState`. Mutations happen on a single
// task; readers only ever see `Arc` snapshots published over `watch`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use filmdeck_api::BackendClient;
use filmdeck_api::resources;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::field::{FieldError, FieldUpdate};
use crate::error::CoreError;
use crate::model::{CapabilityState, DashboardState, ScanSessionState};
use crate::stream::DashboardStream;

/// Shared publishing side of the state channel.
pub(crate) type Publisher = Arc<watch::Sender<Arc<DashboardState>>>;

/// Merges snapshots and stream events into one authoritative state.
pub struct Reconciler {
    state: DashboardState,
    publisher: Publisher,
    last_snapshot: Option<DateTime<Utc>>,
    last_event: Option<DateTime<Utc>>,
    dropped_events: u64,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Arc::new(DashboardState::default()));
        Self::with_publisher(Arc::new(tx))
    }

    /// Continue from whatever the channel currently holds. Nothing is
    /// published until a merge or snapshot changes it.
    pub(crate) fn with_publisher(publisher: Publisher) -> Self {
        let state = DashboardState::clone(&publisher.borrow());
        Self {
            state,
            publisher,
            last_snapshot: None,
            last_event: None,
            dropped_events: 0,
        }
    }

    // ── Readers ──────────────────────────────────────────────────────

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<DashboardState> {
        self.publisher.borrow().clone()
    }

    pub fn subscribe(&self) -> DashboardStream {
        DashboardStream::new(self.publisher.subscribe())
    }

    pub fn watcher(&self) -> watch::Receiver<Arc<DashboardState>> {
        self.publisher.subscribe()
    }

    pub fn last_snapshot(&self) -> Option<DateTime<Utc>> {
        self.last_snapshot
    }

    pub fn last_event(&self) -> Option<DateTime<Utc>> {
        self.last_event
    }

    /// Events dropped as unknown or malformed since creation.
    pub fn dropped_events(&self) -> u64 {
        self.dropped_events
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Merge one named stream event.
    ///
    /// Returns whether the aggregate changed. Unknown or malformed events
    /// are logged, counted, and leave the state untouched.
    pub fn apply_event(&mut self, name: &str, payload: &str) -> Result<bool, FieldError> {
        match FieldUpdate::parse(name, payload) {
            Ok(update) => {
                self.last_event = Some(Utc::now());
                Ok(self.apply(update))
            }
            Err(err) => {
                self.dropped_events += 1;
                warn!(event = name, error = %err, "dropping stream event");
                Err(err)
            }
        }
    }

    /// Apply one parsed update. Returns whether the aggregate changed.
    pub fn apply(&mut self, update: FieldUpdate) -> bool {
        self.apply_all([update])
    }

    /// Apply updates in order, publishing at most once.
    pub fn apply_all(&mut self, updates: impl IntoIterator<Item = FieldUpdate>) -> bool {
        let mut next = self.state.clone();
        for update in updates {
            update.apply_to(&mut next);
        }
        self.commit(next)
    }

    /// Overwrite the whole aggregate, as a snapshot does.
    pub fn replace(&mut self, state: DashboardState) -> bool {
        self.last_snapshot = Some(Utc::now());
        self.commit(state)
    }

    /// Fetch a full snapshot and overwrite the aggregate with it.
    ///
    /// Any events merged before the response arrives are lost; the
    /// backend's snapshot is taken as the newer truth.
    pub async fn load_snapshot(
        &mut self,
        client: &BackendClient,
    ) -> Result<Arc<DashboardState>, CoreError> {
        let state = fetch_snapshot(client).await?;
        self.replace(state);
        Ok(self.snapshot())
    }

    fn commit(&mut self, next: DashboardState) -> bool {
        if next == self.state {
            return false;
        }
        self.state = next;
        self.publisher.send_replace(Arc::new(self.state.clone()));
        true
    }
}

/// Fetch every snapshot resource concurrently and assemble the aggregate.
pub async fn fetch_snapshot(client: &BackendClient) -> Result<DashboardState, CoreError> {
    debug!(base = %client.base_url(), "fetching snapshot");
    let (light, advance, fast_forward, zoom, scan) = tokio::join!(
        client.get_capability(resources::LIGHT),
        client.get_capability(resources::ADVANCE),
        client.get_capability(resources::FAST_FORWARD),
        client.get_capability(resources::FOCUS_ZOOM),
        client.get_scan(),
    );

    Ok(DashboardState {
        light: CapabilityState::from(light?),
        advance: CapabilityState::from(advance?),
        fast_forward: CapabilityState::from(fast_forward?),
        zoom: CapabilityState::from(zoom?),
        scan: ScanSessionState::try_from(scan?)?,
    })
}
