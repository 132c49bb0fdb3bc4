// filmdeck-api: Async Rust client for the film scanner backend (REST + Server-Sent Events)

pub mod client;
pub mod error;
pub mod models;
pub mod resources;
pub mod sse;
pub mod transport;

pub use client::BackendClient;
pub use error::Error;
pub use sse::{SseDecoder, SseEvent, StreamHandle, StreamManager, StreamMessage, StreamSubscription};
pub use transport::TransportConfig;
