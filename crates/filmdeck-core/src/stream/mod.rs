// ── Reactive dashboard stream ──
//
// Subscription type for consuming reconciled state changes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::DashboardState;

/// A subscription to the reconciled dashboard state.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed`](Self::changed) or by converting into a `Stream`.
pub struct DashboardStream {
    current: Arc<DashboardState>,
    receiver: watch::Receiver<Arc<DashboardState>>,
}

impl DashboardStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<DashboardState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &Arc<DashboardState> {
        &self.current
    }

    /// What the controller holds right now, which can be newer than `current`.
    pub fn latest(&self) -> Arc<DashboardState> {
        self.receiver.borrow().clone()
    }

    /// Resolves with the next published state.
    /// Returns `None` once the owning controller is gone.
    pub async fn changed(&mut self) -> Option<Arc<DashboardState>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Consume the subscription as a `Stream` of states.
    ///
    /// The first item is the current snapshot.
    pub fn into_stream(self) -> DashboardWatchStream {
        DashboardWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// Yields every published state, starting with the current one.
pub struct DashboardWatchStream {
    inner: WatchStream<Arc<DashboardState>>,
}

impl Stream for DashboardWatchStream {
    type Item = Arc<DashboardState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
