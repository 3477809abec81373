use std::time::{Duration, SystemTime, UNIX_EPOCH};

use opentelemetry::trace::{Span, SpanBuilder, SpanKind, Tracer};
use opentelemetry::{Context, KeyValue};

use crate::app::constants::{
    APP_START_COMPONENT, APP_START_SPAN_NAME, ATTR_START_TYPE, START_TYPE_COLD, START_TYPE_WARM,
};
use crate::native::AppStartInfo;
use crate::xhr::constants::ATTR_COMPONENT;

/// Emits the `AppStart` span from native launch timing. Nothing is emitted
/// when the platform never reported a start timestamp.
pub(crate) fn record_app_start<T: Tracer>(tracer: &T, info: &AppStartInfo, mut attributes: Vec<KeyValue>) {
    let Some(start_ms) = info.app_start_epoch_ms else {
        log::debug!("no launch start timestamp reported, skipping app-start span");
        return;
    };
    let start = UNIX_EPOCH + Duration::from_millis(start_ms);
    let end = info
        .launch_end_epoch_ms
        .map(|end_ms| UNIX_EPOCH + Duration::from_millis(end_ms))
        .unwrap_or_else(SystemTime::now);

    attributes.push(KeyValue::new(ATTR_COMPONENT, APP_START_COMPONENT));
    attributes.push(KeyValue::new(
        ATTR_START_TYPE,
        if info.is_cold_start {
            START_TYPE_COLD
        } else {
            START_TYPE_WARM
        },
    ));

    let mut span = tracer.build_with_context(
        SpanBuilder::from_name(APP_START_SPAN_NAME)
            .with_kind(SpanKind::Internal)
            .with_start_time(start)
            .with_attributes(attributes),
        &Context::new(),
    );
    span.end_with_timestamp(end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::TracerProvider as _;

    use crate::test_support::test_provider;

    #[test]
    fn cold_start_span_covers_the_reported_window() {
        let (provider, exporter) = test_provider();
        let info = AppStartInfo {
            app_start_epoch_ms: Some(1_700_000_000_000),
            launch_end_epoch_ms: Some(1_700_000_000_750),
            is_cold_start: true,
        };
        record_app_start(&provider.tracer("app-test"), &info, Vec::new());

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        let span = &spans[0];
        assert_eq!(span.name, "AppStart");
        assert_eq!(
            span.end_time.duration_since(span.start_time).unwrap(),
            Duration::from_millis(750)
        );
        assert!(span.attributes.iter().any(|kv| {
            kv.key.as_str() == "component" && kv.value.to_string() == "appstart"
        }));
        assert!(span.attributes.iter().any(|kv| {
            kv.key.as_str() == "start.type" && kv.value.to_string() == "cold"
        }));
    }

    #[test]
    fn warm_start_is_labelled_and_missing_timing_skips_the_span() {
        let (provider, exporter) = test_provider();
        let warm = AppStartInfo {
            app_start_epoch_ms: Some(1_700_000_000_000),
            launch_end_epoch_ms: Some(1_700_000_000_100),
            is_cold_start: false,
        };
        record_app_start(&provider.tracer("app-test"), &warm, Vec::new());
        record_app_start(&provider.tracer("app-test"), &AppStartInfo::default(), Vec::new());

        let spans = exporter.get_finished_spans().unwrap();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].attributes.iter().any(|kv| {
            kv.key.as_str() == "start.type" && kv.value.to_string() == "warm"
        }));
    }
}
