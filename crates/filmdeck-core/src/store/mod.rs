// ── Reconciliation engine ──
//
// Single owner of the device state. Snapshots overwrite it, stream
// events patch one field (or one documented group) at a time, and every
// effective change is published through a `watch` channel.

mod field;
mod reconciler;

pub use field::{DashboardUpdate, FieldError, FieldUpdate};
pub(crate) use reconciler::Publisher;
pub use reconciler::{Reconciler, fetch_snapshot};
