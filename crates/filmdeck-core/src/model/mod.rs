// ── Device state model ──
//
// Value types for everything the backend reports about the scanner.
// `DashboardState` is the aggregate the reconciler owns; the rest of the
// client only ever sees shared, read-only snapshots of it.

pub mod capability;
pub mod dashboard;
pub mod scan;

// ── Re-exports ──────────────────────────────────────────────────────

pub use capability::{Capability, CapabilityState};
pub use dashboard::DashboardState;
pub use scan::{ScanOutcome, ScanProgress, ScanSessionState};
