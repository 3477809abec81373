//! Test utilities shared across crate-level unit tests.

pub mod bridge;
pub mod otel;
pub mod timing;

pub use bridge::RecordingBridge;
pub use otel::test_provider;
pub use timing::xhr_entry;
