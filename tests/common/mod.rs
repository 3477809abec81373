//! Shared utilities for the XHR engine integration tests.

use std::sync::Arc;
use std::time::Duration;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::TracerProvider;

use rum_rs_sdk::timing::{InMemoryTimingSource, InitiatorType, ManualClock, ResourceEntry};
use rum_rs_sdk::xhr::{XhrSettings, XhrTracing, DEFAULT_SETTLE_DELAY};

pub struct EngineHarness {
    pub engine: XhrTracing<opentelemetry_sdk::trace::Tracer>,
    pub exporter: InMemorySpanExporter,
    pub clock: ManualClock,
    pub timing: Arc<InMemoryTimingSource>,
    _provider: TracerProvider,
}

/// Engine wired to a manual clock, an in-memory timing source and an
/// in-memory span exporter.
pub fn engine_with(settings: XhrSettings) -> EngineHarness {
    let exporter = InMemorySpanExporter::default();
    let provider = TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let clock = ManualClock::new();
    let timing = Arc::new(InMemoryTimingSource::new());
    let engine = XhrTracing::builder(provider.tracer("xhr-integration"))
        .settings(settings)
        .clock(Arc::new(clock.clone()))
        .timing_source(timing.clone())
        .build();
    EngineHarness {
        engine,
        exporter,
        clock,
        timing,
        _provider: provider,
    }
}

/// Builds an XHR-initiated resource entry with phases spread evenly across
/// `[fetch_start, response_end]`.
pub fn xhr_entry(url: &str, fetch_start: f64, response_end: f64) -> ResourceEntry {
    let step = (response_end - fetch_start) / 8.0;
    ResourceEntry {
        name: url.to_string(),
        initiator_type: InitiatorType::XmlHttpRequest,
        start_time: fetch_start,
        fetch_start,
        domain_lookup_start: fetch_start + step,
        domain_lookup_end: fetch_start + 2.0 * step,
        connect_start: fetch_start + 3.0 * step,
        secure_connection_start: 0.0,
        connect_end: fetch_start + 4.0 * step,
        request_start: fetch_start + 5.0 * step,
        response_start: fetch_start + 6.0 * step,
        response_end,
    }
}

/// Advances paused tokio time past the settle delay and lets the deferred
/// finalization tasks run.
pub async fn run_settle() {
    // Let freshly spawned finalize tasks register their sleep timers
    // before the clock moves, or the advance passes them by.
    tokio::task::yield_now().await;
    tokio::time::advance(DEFAULT_SETTLE_DELAY + Duration::from_millis(10)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
}
