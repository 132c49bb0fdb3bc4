// filmdeck-core: Reconciled device state and command layer between filmdeck-api and consumers.

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandDispatcher, CommandResult, StartScanRequest};
pub use config::DeviceConfig;
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use lifecycle::{PowerState, ScanPhase};
pub use store::{FieldError, FieldUpdate, Reconciler};
pub use stream::DashboardStream;

pub use model::{Capability, CapabilityState, DashboardState, ScanOutcome, ScanProgress, ScanSessionState};
