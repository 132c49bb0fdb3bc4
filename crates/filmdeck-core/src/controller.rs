// ── Controller session ──
//
// Lifecycle management for one scanner backend. Activation opens the
// event streams and fetches a snapshot on a single sync task which owns
// the `Reconciler`; everything else reads published snapshots and sends
// commands through the dispatcher.

use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::SelectAll;
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use filmdeck_api::{BackendClient, StreamHandle, StreamManager, StreamMessage};

use crate::command::{Command, CommandDispatcher, CommandResult, StartScanRequest};
use crate::config::DeviceConfig;
use crate::error::CoreError;
use crate::lifecycle::PowerState;
use crate::model::{Capability, DashboardState};
use crate::store::{Publisher, Reconciler, fetch_snapshot};
use crate::stream::DashboardStream;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// Streams opened, snapshot outstanding.
    Connecting,
    /// Snapshot applied and the event stream is open.
    Live,
    /// The stream closed or the snapshot failed. State is kept but may
    /// drift from the device until the session is restarted.
    Stale { reason: String },
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: DeviceConfig,
    client: BackendClient,
    streams: StreamManager,
    publisher: Publisher,
    connection_state: Arc<watch::Sender<ConnectionState>>,
    power: watch::Sender<PowerState>,
    resync: Arc<Notify>,
    dispatcher: CommandDispatcher,
    session: Mutex<Option<SyncSession>>,
}

/// A running sync task. Dropping it (with the last controller clone)
/// cancels the task and closes its streams.
struct SyncSession {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    _guard: DropGuard,
}

/// What the sync task needs from the controller. Holds no reference back
/// to `ControllerInner`.
struct SyncContext {
    client: BackendClient,
    connection_state: Arc<watch::Sender<ConnectionState>>,
    resync: Arc<Notify>,
}

impl Controller {
    /// Create a controller from configuration. Does NOT connect;
    /// call [`activate()`](Self::activate) to start syncing.
    pub fn new(config: DeviceConfig) -> Result<Self, CoreError> {
        let client = BackendClient::new(config.url.clone(), &config.transport())?;
        let streams = StreamManager::new(&client);
        let (publisher, state_rx) = watch::channel(Arc::new(DashboardState::default()));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (power, _) = watch::channel(PowerState::Available);
        let dispatcher = CommandDispatcher::new(client.clone(), state_rx);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                streams,
                publisher: Arc::new(publisher),
                connection_state: Arc::new(connection_state),
                power,
                resync: Arc::new(Notify::new()),
                dispatcher,
                session: Mutex::new(None),
            }),
        })
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }

    pub fn client(&self) -> &BackendClient {
        &self.inner.client
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Open the configured event streams and start the sync task.
    ///
    /// Returns once the streams are requested; the snapshot and first
    /// events arrive asynchronously. Watch
    /// [`connection_state`](Self::connection_state) for `Live`.
    pub async fn activate(&self) -> Result<(), CoreError> {
        let mut session = self.inner.session.lock().await;
        if session.is_some() {
            return Err(CoreError::AlreadyActivated);
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let mut handles = Vec::with_capacity(self.inner.config.streams.len());
        for subscription in &self.inner.config.streams {
            match self.inner.streams.open(subscription.clone()) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Already-open handles close on drop.
                    drop(handles);
                    self.inner
                        .connection_state
                        .send_replace(ConnectionState::Disconnected);
                    return Err(e.into());
                }
            }
        }

        self.inner.power.send_replace(PowerState::Available);
        let reconciler = Reconciler::with_publisher(Arc::clone(&self.inner.publisher));
        let context = SyncContext {
            client: self.inner.client.clone(),
            connection_state: Arc::clone(&self.inner.connection_state),
            resync: Arc::clone(&self.inner.resync),
        };
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sync_task(context, reconciler, handles, cancel.clone()));
        *session = Some(SyncSession {
            _guard: cancel.clone().drop_guard(),
            cancel,
            handle,
        });

        info!(url = %self.inner.config.url, "controller activated");
        Ok(())
    }

    /// Stop syncing, close every stream, and discard the state.
    pub async fn deactivate(&self) {
        let session = self.inner.session.lock().await.take();
        if let Some(session) = session {
            session.cancel.cancel();
            if let Err(e) = session.handle.await {
                warn!(error = %e, "sync task did not shut down cleanly");
            }
        }

        self.inner
            .publisher
            .send_replace(Arc::new(DashboardState::default()));
        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("controller deactivated");
    }

    /// Ask the sync task to fetch a fresh snapshot.
    pub async fn resync(&self) -> Result<(), CoreError> {
        if self.inner.session.lock().await.is_none() {
            return Err(CoreError::Disconnected);
        }
        self.inner.resync.notify_one();
        Ok(())
    }

    /// Load a snapshot now.
    ///
    /// Without an active session this fetches directly; with one it
    /// defers to the sync task and returns the current state. A failed
    /// fetch leaves the published state as it was.
    pub async fn refresh(&self) -> Result<Arc<DashboardState>, CoreError> {
        let session = self.inner.session.lock().await;
        if session.is_some() {
            self.inner.resync.notify_one();
            return Ok(self.state());
        }

        let mut reconciler = Reconciler::with_publisher(Arc::clone(&self.inner.publisher));
        reconciler.load_snapshot(&self.inner.client).await
    }

    // ── Command hooks ────────────────────────────────────────────

    /// Check and send a command.
    ///
    /// `Poweroff` only goes through the confirmation flow; nothing is
    /// sent once the scanner is powering off.
    pub async fn execute(&self, command: Command) -> Result<CommandResult, CoreError> {
        let power = *self.inner.power.borrow();
        if power.is_terminal() {
            return Err(CoreError::rejected("scanner is powering off"));
        }
        if command == Command::Poweroff {
            return Err(CoreError::rejected(
                "poweroff must be requested and confirmed",
            ));
        }
        if !self.inner.config.snapshot_guards {
            return self.inner.dispatcher.send(command).await;
        }

        // Per-resource streams never report `enabled` or scan fields, so
        // guard against a fresh snapshot and fold it in afterwards.
        let fresh = fetch_snapshot(&self.inner.client).await?;
        let result = self.inner.dispatcher.send_against(command, &fresh).await;
        if self.inner.session.lock().await.is_some() {
            self.inner.resync.notify_one();
        } else {
            self.inner.publisher.send_if_modified(|current| {
                if **current == fresh {
                    false
                } else {
                    *current = Arc::new(fresh);
                    true
                }
            });
        }
        result
    }

    pub async fn advance(&self) -> Result<CommandResult, CoreError> {
        self.execute(Command::Advance).await
    }

    pub async fn toggle(&self, capability: Capability) -> Result<CommandResult, CoreError> {
        self.execute(Command::for_capability(capability)).await
    }

    pub async fn start_scan(&self, request: StartScanRequest) -> Result<CommandResult, CoreError> {
        self.execute(Command::StartScan(request)).await
    }

    pub async fn stop_scan(&self) -> Result<CommandResult, CoreError> {
        self.execute(Command::StopScan).await
    }

    pub async fn dismiss_alert(&self) -> Result<CommandResult, CoreError> {
        self.execute(Command::DismissAlert).await
    }

    /// Fire-and-forget variant of [`execute`](Self::execute).
    pub fn spawn(&self, command: Command) -> JoinHandle<Result<CommandResult, CoreError>> {
        let controller = self.clone();
        tokio::spawn(async move {
            let result = controller.execute(command).await;
            if let Err(ref e) = result {
                warn!(error = %e, "command failed");
            }
            result
        })
    }

    // ── Poweroff confirmation ────────────────────────────────────

    pub fn request_poweroff(&self) -> Result<PowerState, CoreError> {
        let state = self.state();
        self.transition_power(|power| power.request(&state))
    }

    pub fn abort_poweroff(&self) -> PowerState {
        self.inner.power.send_modify(|power| *power = power.abort());
        *self.inner.power.borrow()
    }

    /// Confirm a pending poweroff and send it.
    ///
    /// The gate stays `PoweringOff` even if sending fails.
    pub async fn confirm_poweroff(&self) -> Result<CommandResult, CoreError> {
        let state = self.state();
        let mut command = None;
        self.transition_power(|power| {
            let (next, poweroff) = power.confirm(&state)?;
            command = Some(poweroff);
            Ok(next)
        })?;

        let command = command.ok_or_else(|| CoreError::Internal("poweroff gate yielded no command".into()))?;
        info!("powering off scanner");
        self.inner.dispatcher.send(command).await
    }

    fn transition_power(
        &self,
        step: impl FnOnce(PowerState) -> Result<PowerState, CoreError>,
    ) -> Result<PowerState, CoreError> {
        let mut outcome = None;
        self.inner.power.send_if_modified(|power| match step(*power) {
            Ok(next) => {
                let changed = next != *power;
                *power = next;
                outcome = Some(Ok(next));
                changed
            }
            Err(e) => {
                outcome = Some(Err(e));
                false
            }
        });
        outcome.unwrap_or_else(|| Err(CoreError::Internal("power transition skipped".into())))
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: load a snapshot, run closure, discard the state.
    ///
    /// Meant for the CLI, which needs one request-response cycle and no
    /// event stream.
    pub async fn oneshot<F, Fut, T>(config: DeviceConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let controller = Controller::new(config)?;
        controller.refresh().await?;
        let result = f(controller.clone()).await;
        controller.deactivate().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Latest reconciled state.
    pub fn state(&self) -> Arc<DashboardState> {
        self.inner.publisher.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> DashboardStream {
        DashboardStream::new(self.inner.publisher.subscribe())
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to the poweroff gate.
    pub fn power_state(&self) -> watch::Receiver<PowerState> {
        self.inner.power.subscribe()
    }
}

// ── Sync task ────────────────────────────────────────────────────

type EventStreams = SelectAll<StreamHandle>;

async fn next_message(events: &mut Option<EventStreams>) -> Option<StreamMessage> {
    match events {
        Some(events) => events.next().await,
        None => std::future::pending().await,
    }
}

fn mark_stale(context: &SyncContext, reason: String) {
    warn!(%reason, "event stream lost");
    context
        .connection_state
        .send_replace(ConnectionState::Stale { reason });
}

/// Sole writer of the reconciled state for one session.
///
/// Streams are never reopened; once they end the task only serves
/// resync requests until cancelled.
async fn sync_task(
    context: SyncContext,
    mut reconciler: Reconciler,
    handles: Vec<StreamHandle>,
    cancel: CancellationToken,
) {
    let mut events = Some(futures_util::stream::select_all(handles));
    let snapshot = fetch_snapshot(&context.client);
    tokio::pin!(snapshot);
    let mut snapshot_pending = true;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            message = next_message(&mut events) => match message {
                Some(StreamMessage::Event(event)) => {
                    let _ = reconciler.apply_event(&event.name, &event.data);
                }
                Some(StreamMessage::Ended) | None => {
                    events = None;
                    mark_stale(&context, "event stream ended".into());
                }
                Some(StreamMessage::Failed(e)) => {
                    events = None;
                    mark_stale(&context, e.to_string());
                }
            },
            result = &mut snapshot, if snapshot_pending => {
                snapshot_pending = false;
                match result {
                    Ok(state) => {
                        reconciler.replace(state);
                        if events.is_some() {
                            context.connection_state.send_replace(ConnectionState::Live);
                        }
                        debug!("snapshot applied");
                    }
                    Err(e) => {
                        warn!(error = %e, "snapshot failed");
                        context.connection_state.send_replace(ConnectionState::Stale {
                            reason: e.to_string(),
                        });
                    }
                }
            }
            () = context.resync.notified() => {
                debug!("resync requested");
                snapshot.set(fetch_snapshot(&context.client));
                snapshot_pending = true;
            }
        }
    }

    debug!(
        dropped_events = reconciler.dropped_events(),
        "sync task stopped"
    );
}
