mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

use opentelemetry_sdk::export::trace::SpanData;
use rum_rs_sdk::timing::Clock;
use rum_rs_sdk::xhr::{RequestHandle, ResponseStatus, TerminalEvent, XhrSettings, XhrTracing};

use common::{engine_with, run_settle, xhr_entry};

fn event_timestamp(span: &SpanData, name: &str) -> Option<SystemTime> {
    span.events
        .iter()
        .find(|e| e.name == name)
        .map(|e| e.timestamp)
}

#[tokio::test(start_paused = true)]
async fn entries_collected_by_the_observer_become_network_events() {
    let h = engine_with(XhrSettings::default());
    let url = "https://api.example.com/v1/reports";
    let handle = RequestHandle::next();

    h.engine.on_open(handle, "GET", url).unwrap();
    let mut headers = HashMap::new();
    h.engine.on_send(handle, &mut headers, None);

    h.clock.advance(120.0);
    h.timing.publish(xhr_entry(url, 8.0, 110.0));
    h.engine.on_terminal(
        handle,
        TerminalEvent::Load,
        Some(ResponseStatus::new(200, "OK")),
    );
    run_settle().await;

    let spans = h.exporter.get_finished_spans().unwrap();
    assert_eq!(
        event_timestamp(&spans[0], "responseEnd"),
        Some(h.clock.to_system_time(110.0))
    );
}

#[tokio::test(start_paused = true)]
async fn late_entries_in_the_settle_window_are_still_attributed() {
    let h = engine_with(XhrSettings::default());
    let url = "https://api.example.com/v1/reports";
    let handle = RequestHandle::next();

    h.engine.on_open(handle, "GET", url).unwrap();
    let mut headers = HashMap::new();
    h.engine.on_send(handle, &mut headers, None);
    h.clock.advance(100.0);
    h.engine.on_terminal(
        handle,
        TerminalEvent::Load,
        Some(ResponseStatus::new(200, "OK")),
    );

    // The platform flushes the entry after the terminal event; the settle
    // delay exists exactly for this case.
    h.timing.publish(xhr_entry(url, 5.0, 90.0));
    run_settle().await;

    let spans = h.exporter.get_finished_spans().unwrap();
    assert_eq!(
        event_timestamp(&spans[0], "fetchStart"),
        Some(h.clock.to_system_time(5.0))
    );
}

#[tokio::test(start_paused = true)]
async fn snapshot_only_sources_serve_entries_through_the_fallback_path() {
    use rum_rs_sdk::timing::{
        EntrySink, ManualClock, ObserverRegistration, ResourceEntry, ResourceTimingSource,
    };

    // A source that cannot stream entries; the engine must fall back to
    // querying the full buffer at finalization.
    struct SnapshotOnlySource {
        entries: std::sync::Mutex<Vec<ResourceEntry>>,
    }

    impl ResourceTimingSource for SnapshotOnlySource {
        fn observe(&self, _sink: EntrySink) -> ObserverRegistration {
            ObserverRegistration::new(|| {})
        }

        fn entries(&self) -> Vec<ResourceEntry> {
            self.entries.lock().unwrap().clone()
        }

        fn clear(&self) {
            self.entries.lock().unwrap().clear();
        }
    }

    let url = "https://api.example.com/v1/reports";
    let exporter = opentelemetry_sdk::testing::trace::InMemorySpanExporter::default();
    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let clock = ManualClock::new();
    let source = Arc::new(SnapshotOnlySource {
        entries: std::sync::Mutex::new(Vec::new()),
    });
    let engine = {
        use opentelemetry::trace::TracerProvider as _;
        XhrTracing::builder(provider.tracer("snapshot-only"))
            .clock(Arc::new(clock.clone()))
            .timing_source(source.clone())
            .build()
    };

    let handle = RequestHandle::next();
    engine.on_open(handle, "GET", url).unwrap();
    let mut headers = HashMap::new();
    engine.on_send(handle, &mut headers, None);
    clock.advance(100.0);
    source
        .entries
        .lock()
        .unwrap()
        .push(xhr_entry(url, 5.0, 90.0));
    engine.on_terminal(
        handle,
        TerminalEvent::Load,
        Some(ResponseStatus::new(200, "OK")),
    );
    run_settle().await;

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(
        event_timestamp(&spans[0], "fetchStart"),
        Some(clock.to_system_time(5.0))
    );
}

#[tokio::test(start_paused = true)]
async fn overlapping_requests_to_the_same_url_never_share_an_entry() {
    let h = engine_with(XhrSettings::default());
    let url = "https://api.example.com/v1/search";

    let first = RequestHandle::next();
    let second = RequestHandle::next();
    let mut headers = HashMap::new();

    h.engine.on_open(first, "GET", url).unwrap();
    h.engine.on_send(first, &mut headers, None);
    h.clock.advance(50.0);
    h.engine.on_open(second, "GET", url).unwrap();
    h.engine.on_send(second, &mut headers, None);

    // The request sent second finishes first.
    h.clock.advance(70.0);
    h.timing.publish(xhr_entry(url, 55.0, 115.0));
    h.engine.on_terminal(
        second,
        TerminalEvent::Load,
        Some(ResponseStatus::new(200, "OK")),
    );

    h.clock.advance(60.0);
    h.timing.publish(xhr_entry(url, 2.0, 175.0));
    h.engine.on_terminal(
        first,
        TerminalEvent::Load,
        Some(ResponseStatus::new(200, "OK")),
    );
    run_settle().await;

    let spans = h.exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 2);

    let mut fetch_starts: Vec<SystemTime> = spans
        .iter()
        .filter_map(|span| event_timestamp(span, "fetchStart"))
        .collect();
    fetch_starts.sort();
    assert_eq!(
        fetch_starts,
        vec![h.clock.to_system_time(2.0), h.clock.to_system_time(55.0)]
    );
}

#[tokio::test(start_paused = true)]
async fn disjoint_entry_pair_produces_a_preflight_child_span() {
    let h = engine_with(XhrSettings::default());
    let url = "https://api.other-origin.example.com/v1/upload";
    let handle = RequestHandle::next();

    h.engine.on_open(handle, "PUT", url).unwrap();
    let mut headers = HashMap::new();
    h.engine.on_send(handle, &mut headers, None);

    h.clock.advance(150.0);
    h.timing.publish(xhr_entry(url, 10.0, 40.0));
    h.timing.publish(xhr_entry(url, 60.0, 140.0));
    h.engine.on_terminal(
        handle,
        TerminalEvent::Load,
        Some(ResponseStatus::new(200, "OK")),
    );
    run_settle().await;

    let spans = h.exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 2);

    let preflight = spans
        .iter()
        .find(|span| span.name == "CORS Preflight")
        .expect("preflight span");
    let main = spans.iter().find(|span| span.name == "PUT").unwrap();

    assert_eq!(
        preflight.parent_span_id,
        main.span_context.span_id(),
        "preflight must be a child of the request span"
    );
    assert_eq!(preflight.start_time, h.clock.to_system_time(10.0));
    assert_eq!(preflight.end_time, h.clock.to_system_time(40.0));

    // The main span's phases come from the second entry.
    assert_eq!(
        event_timestamp(main, "fetchStart"),
        Some(h.clock.to_system_time(60.0))
    );
}

#[tokio::test(start_paused = true)]
async fn out_of_window_and_foreign_entries_are_ignored() {
    let h = engine_with(XhrSettings::default());
    let url = "https://api.example.com/v1/reports";
    let handle = RequestHandle::next();

    h.engine.on_open(handle, "GET", url).unwrap();
    let mut headers = HashMap::new();
    h.clock.advance(20.0);
    h.engine.on_send(handle, &mut headers, None);

    h.clock.advance(80.0);
    // Started before send.
    h.timing.publish(xhr_entry(url, 5.0, 60.0));
    // Different URL.
    h.timing
        .publish(xhr_entry("https://api.example.com/v1/other", 30.0, 70.0));
    h.engine.on_terminal(
        handle,
        TerminalEvent::Load,
        Some(ResponseStatus::new(200, "OK")),
    );
    run_settle().await;

    let spans = h.exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 1);
    assert!(event_timestamp(&spans[0], "fetchStart").is_none());
}

#[tokio::test(start_paused = true)]
async fn engines_without_a_timing_source_still_produce_spans() {
    let exporter = opentelemetry_sdk::testing::trace::InMemorySpanExporter::default();
    let provider = opentelemetry_sdk::trace::TracerProvider::builder()
        .with_simple_exporter(exporter.clone())
        .build();
    let clock = rum_rs_sdk::timing::ManualClock::new();
    let engine = {
        use opentelemetry::trace::TracerProvider as _;
        XhrTracing::builder(provider.tracer("bare"))
            .clock(Arc::new(clock.clone()))
            .build()
    };

    let handle = RequestHandle::next();
    engine
        .on_open(handle, "GET", "https://api.example.com/v1/ping")
        .unwrap();
    let mut headers = HashMap::new();
    engine.on_send(handle, &mut headers, None);
    clock.advance(30.0);
    engine.on_terminal(
        handle,
        TerminalEvent::Load,
        Some(ResponseStatus::new(204, "No Content")),
    );
    run_settle().await;

    let spans = exporter.get_finished_spans().unwrap();
    assert_eq!(spans.len(), 1);
    assert!(event_timestamp(&spans[0], "fetchStart").is_none());
    assert!(spans[0]
        .attributes
        .iter()
        .any(|kv| kv.key.as_str() == "http.status_code"));
}
