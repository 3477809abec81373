use std::sync::{Arc, Mutex};

use opentelemetry::propagation::Injector;
use opentelemetry::trace::{Span, SpanBuilder, SpanContext, SpanKind, TraceContextExt, Tracer};
use opentelemetry::{global, Context, KeyValue};
use url::Url;

use crate::platform::{sleep, spawn_detached};
use crate::timing::{Clock, EntrySink, ResourceEntry, ResourceTimingSource, SystemClock};
use crate::util::url_match::matches_any;
use crate::util::Unsubscribe;
use crate::xhr::capture::{self, BodyPayload, ResponseBody};
use crate::xhr::config::XhrSettings;
use crate::xhr::constants::{
    ATTR_COMPONENT, ATTR_HTTP_HOST, ATTR_HTTP_METHOD, ATTR_HTTP_REQUEST_BODY,
    ATTR_HTTP_RESPONSE_BODY, ATTR_HTTP_SCHEME, ATTR_HTTP_STATUS_CODE, ATTR_HTTP_STATUS_TEXT,
    ATTR_HTTP_URL, ATTR_HTTP_USER_AGENT, ATTR_LINK_SPAN_ID, ATTR_LINK_TRACE_ID,
    CORS_PREFLIGHT_SPAN_NAME, ERROR_STATUS_THRESHOLD, EVENT_ERROR, EVENT_OPEN, EVENT_SEND,
    HTTP_COMPONENT, MAX_BODY_CAPTURE_BYTES, REQUEST_HEADER_ATTR_PREFIX,
    RESPONSE_HEADER_ATTR_PREFIX,
};
use crate::xhr::correlate::{self, UsedEntries};
use crate::xhr::state::{RequestHandle, RequestRegistry, RequestState, TaskCounter};

/// Final status line read off the transport at a terminal event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseStatus {
    pub code: u16,
    pub text: String,
}

impl ResponseStatus {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        ResponseStatus {
            code,
            text: text.into(),
        }
    }
}

/// Transport-level event that completed a request. Whichever of these fires
/// first wins; the rest become no-ops for that request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TerminalEvent {
    Load,
    Error,
    Abort,
    Timeout,
    /// Ready state reached "done" without a dedicated load callback.
    ReadyStateDone,
}

impl TerminalEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalEvent::Load => "load",
            TerminalEvent::Error => "error",
            TerminalEvent::Abort => "abort",
            TerminalEvent::Timeout => "timeout",
            TerminalEvent::ReadyStateDone => "readystatechange",
        }
    }
}

/// Hook that appends attributes to every request span at creation time.
pub type SpanDecorator = Arc<dyn Fn(&mut Vec<KeyValue>) + Send + Sync + 'static>;

/// XHR auto-instrumentation engine.
///
/// Produces one client span per instrumented request, keyed by the caller's
/// [`RequestHandle`]. The transport-patching layer reports lifecycle moments
/// through [`on_open`], [`on_send`] and [`on_terminal`]; the engine owns
/// everything after that: trace-header injection, resource-timing
/// correlation, header and body capture, and ending the span exactly once.
///
/// [`on_open`]: XhrTracing::on_open
/// [`on_send`]: XhrTracing::on_send
/// [`on_terminal`]: XhrTracing::on_terminal
pub struct XhrTracing<T: Tracer> {
    inner: Arc<XhrTracingInner<T>>,
}

impl<T: Tracer> Clone for XhrTracing<T> {
    fn clone(&self) -> Self {
        XhrTracing {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct XhrTracingInner<T: Tracer> {
    tracer: T,
    settings: XhrSettings,
    clock: Arc<dyn Clock>,
    timing: Option<Arc<dyn ResourceTimingSource>>,
    decorator: Option<SpanDecorator>,
    registry: Mutex<RequestRegistry<T::Span>>,
    used: Mutex<UsedEntries>,
    tasks: TaskCounter,
}

/// Builder for [`XhrTracing`].
pub struct XhrTracingBuilder<T: Tracer> {
    tracer: T,
    settings: XhrSettings,
    clock: Arc<dyn Clock>,
    timing: Option<Arc<dyn ResourceTimingSource>>,
    decorator: Option<SpanDecorator>,
}

impl<T> XhrTracingBuilder<T>
where
    T: Tracer + Send + Sync + 'static,
    T::Span: Send + 'static,
{
    pub fn settings(mut self, settings: XhrSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Attaches the host's resource-timing source. Without one the engine
    /// still produces spans, just without network phase events.
    pub fn timing_source(mut self, source: Arc<dyn ResourceTimingSource>) -> Self {
        self.timing = Some(source);
        self
    }

    pub fn span_decorator<F>(mut self, decorator: F) -> Self
    where
        F: Fn(&mut Vec<KeyValue>) + Send + Sync + 'static,
    {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    pub fn build(self) -> XhrTracing<T> {
        XhrTracing {
            inner: Arc::new(XhrTracingInner {
                tracer: self.tracer,
                settings: self.settings,
                clock: self.clock,
                timing: self.timing,
                decorator: self.decorator,
                registry: Mutex::new(RequestRegistry::new()),
                used: Mutex::new(UsedEntries::new()),
                tasks: TaskCounter::default(),
            }),
        }
    }
}

impl<T> XhrTracing<T>
where
    T: Tracer + Send + Sync + 'static,
    T::Span: Send + 'static,
{
    pub fn builder(tracer: T) -> XhrTracingBuilder<T> {
        XhrTracingBuilder {
            tracer,
            settings: XhrSettings::default(),
            clock: Arc::new(SystemClock::new()),
            timing: None,
            decorator: None,
        }
    }

    pub fn settings(&self) -> &XhrSettings {
        &self.inner.settings
    }

    /// Requests currently between send and finalization.
    pub fn in_flight_tasks(&self) -> usize {
        self.inner.tasks.count()
    }

    /// Requests currently holding registry state.
    pub fn tracked_requests(&self) -> usize {
        self.inner.registry.lock().unwrap().len()
    }

    /// Reports `open(method, url)` on the request object behind `handle`.
    ///
    /// Starts the span and stores fresh per-request state. Reopening a
    /// handle tears down the previous request's listeners and observer
    /// without ending its span. Ignored and unparseable URLs produce no
    /// span and no state; the returned context is the new span's identity
    /// for callers that want it.
    pub fn on_open(&self, handle: RequestHandle, method: &str, url: &str) -> Option<SpanContext> {
        if matches_any(&self.inner.settings.ignore_urls, url) {
            return None;
        }
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::debug!("skipping request with unparseable url {url}: {err}");
                return None;
            }
        };

        let method = method.to_uppercase();
        let mut attributes = vec![
            KeyValue::new(ATTR_COMPONENT, HTTP_COMPONENT),
            KeyValue::new(ATTR_HTTP_METHOD, method.clone()),
            KeyValue::new(ATTR_HTTP_URL, url.to_string()),
        ];
        if let Some(decorator) = &self.inner.decorator {
            decorator(&mut attributes);
        }

        let mut span = self.inner.tracer.build_with_context(
            SpanBuilder::from_name(method.clone())
                .with_kind(SpanKind::Client)
                .with_start_time(self.inner.clock.now())
                .with_attributes(attributes),
            &Context::current(),
        );
        span.add_event_with_timestamp(EVENT_OPEN, self.inner.clock.now(), Vec::new());
        let span_context = span.span_context().clone();

        let state = RequestState::new(span, method, url, parsed);
        let evicted = self.inner.registry.lock().unwrap().insert(handle, state);
        if let Some(mut evicted) = evicted {
            evicted.teardown.run();
        }
        Some(span_context)
    }

    /// Reports `send()` on the request object behind `handle`.
    ///
    /// Expects the transport to have registered its completion listeners
    /// (load, error, abort, timeout and ready-state-done) and to pass their
    /// combined teardown as `listeners`. Records the send moment, injects
    /// W3C trace headers when the URL is on the propagation allow-list,
    /// arms the per-request resource observer and increments the in-flight
    /// counter. Without prior state this is a no-op and the raw request
    /// proceeds uninstrumented.
    pub fn on_send(
        &self,
        handle: RequestHandle,
        headers: &mut dyn Injector,
        listeners: Option<Unsubscribe>,
    ) {
        let send_start = self.inner.clock.now_hr();
        let send_time = self.inner.clock.to_system_time(send_start);

        let context_parts = {
            let mut registry = self.inner.registry.lock().unwrap();
            match registry.get_mut(handle) {
                Some(state) => {
                    state.sent = true;
                    state.send_start_hr = Some(send_start);
                    state.teardown.listeners = listeners;
                    state
                        .span
                        .add_event_with_timestamp(EVENT_SEND, send_time, Vec::new());
                    Some((
                        state.span.span_context().clone(),
                        Arc::clone(&state.collected),
                        state.raw_url.clone(),
                    ))
                }
                None => None,
            }
        };
        let Some((span_context, collected, url)) = context_parts else {
            return;
        };

        // The span stays the active context for the rest of the
        // synchronous send setup.
        let cx = Context::current().with_remote_span_context(span_context);
        let _guard = cx.clone().attach();

        let cors_rules = &self.inner.settings.propagate_trace_header_cors_urls;
        if matches_any(cors_rules, &url) {
            global::get_text_map_propagator(|propagator| {
                propagator.inject_context(&cx, headers);
            });
        } else if !cors_rules.is_empty() {
            log::debug!("not injecting trace headers into request to {url}");
        }

        if let Some(timing) = &self.inner.timing {
            let watched_url = url.clone();
            let sink: EntrySink = Arc::new(move |entry: &ResourceEntry| {
                if entry.name == watched_url && entry.initiator_type.is_xhr_like() {
                    collected.lock().unwrap().push(entry.clone());
                }
            });
            let registration = timing.observe(sink);
            if let Some(state) = self.inner.registry.lock().unwrap().get_mut(handle) {
                state.teardown.observer = Some(registration);
            }
        }

        self.inner.tasks.increment();
    }

    /// Records one outgoing request header, when header capture is on.
    pub fn on_request_header(&self, handle: RequestHandle, name: &str, value: &str) {
        if !self.inner.settings.network_headers_capture {
            return;
        }
        let mut registry = self.inner.registry.lock().unwrap();
        let Some(state) = registry.get_mut(handle) else {
            return;
        };
        if !state.span.is_recording() {
            return;
        }
        let key = format!(
            "{REQUEST_HEADER_ATTR_PREFIX}{}",
            capture::normalize_header_name(name)
        );
        state.span.set_attribute(KeyValue::new(key, value.to_string()));
    }

    /// Consumes the transport's raw response-header blob once headers are
    /// in. `Server-Timing` is always scanned for the backend trace link;
    /// the headers themselves become attributes only when capture is on.
    pub fn on_headers_received(&self, handle: RequestHandle, raw_headers: &str) {
        let mut registry = self.inner.registry.lock().unwrap();
        let Some(state) = registry.get_mut(handle) else {
            return;
        };
        if !state.span.is_recording() {
            return;
        }
        let headers = capture::parse_raw_headers(raw_headers);
        for (name, value) in &headers {
            if name.eq_ignore_ascii_case("server-timing") {
                if let Some((trace_id, span_id)) = capture::server_timing_trace(value) {
                    state
                        .span
                        .set_attribute(KeyValue::new(ATTR_LINK_TRACE_ID, trace_id));
                    state
                        .span
                        .set_attribute(KeyValue::new(ATTR_LINK_SPAN_ID, span_id));
                }
            }
        }
        if self.inner.settings.network_headers_capture {
            for (name, value) in &headers {
                let key = format!(
                    "{RESPONSE_HEADER_ATTR_PREFIX}{}",
                    capture::normalize_header_name(name)
                );
                state.span.set_attribute(KeyValue::new(key, value.clone()));
            }
        }
    }

    /// Captures the outgoing request body, when body capture is on.
    pub fn on_request_body(&self, handle: RequestHandle, body: BodyPayload) {
        if !self.inner.settings.network_body_capture {
            return;
        }
        let mut registry = self.inner.registry.lock().unwrap();
        let Some(state) = registry.get_mut(handle) else {
            return;
        };
        if !state.span.is_recording() {
            return;
        }
        let text = capture::truncate_body(capture::stringify_body(body), MAX_BODY_CAPTURE_BYTES);
        state
            .span
            .set_attribute(KeyValue::new(ATTR_HTTP_REQUEST_BODY, text));
    }

    /// Captures the response body, when body capture is on. A
    /// [`ResponseBody::Pending`] body holds finalization until the host
    /// finishes decoding it.
    pub fn on_response_body(&self, handle: RequestHandle, body: ResponseBody) {
        if !self.inner.settings.network_body_capture {
            return;
        }
        let mut registry = self.inner.registry.lock().unwrap();
        let Some(state) = registry.get_mut(handle) else {
            return;
        };
        match body {
            ResponseBody::Text(text) => {
                if state.span.is_recording() {
                    let text = capture::truncate_body(text, MAX_BODY_CAPTURE_BYTES);
                    state
                        .span
                        .set_attribute(KeyValue::new(ATTR_HTTP_RESPONSE_BODY, text));
                }
            }
            ResponseBody::Pending(receiver) => {
                state.pending_response_body = Some(receiver);
            }
        }
    }

    /// Reports a completion event for the request behind `handle`.
    ///
    /// The first terminal event removes the request's state synchronously,
    /// which is what guarantees the span ends exactly once no matter how
    /// many completion callbacks fire. Finalization itself is deferred by
    /// the settle delay so late resource-timing entries can land.
    pub fn on_terminal(
        &self,
        handle: RequestHandle,
        kind: TerminalEvent,
        status: Option<ResponseStatus>,
    ) {
        let end_hr = self.inner.clock.now_hr();
        let end_time = self.inner.clock.to_system_time(end_hr);

        let state = self.inner.registry.lock().unwrap().remove(handle);
        let Some(mut state) = state else {
            return;
        };

        if let Some(status) = status {
            state.status = Some(status.code);
            state.status_text = Some(status.text);
        }
        state.end_hr = Some(end_hr);
        state.end_time = Some(end_time);

        let event_name = match (kind, state.status) {
            (TerminalEvent::Load, Some(code)) if code >= ERROR_STATUS_THRESHOLD => EVENT_ERROR,
            _ => kind.as_str(),
        };
        state
            .span
            .add_event_with_timestamp(event_name, end_time, Vec::new());

        let engine = self.clone();
        spawn_detached(async move {
            sleep(engine.inner.settings.settle_delay).await;
            engine.finalize(state).await;
        });
    }

    async fn finalize(&self, mut state: RequestState<T::Span>) {
        state.teardown.run();

        if let Some(receiver) = state.pending_response_body.take() {
            if let Ok(text) = receiver.await {
                if state.span.is_recording() {
                    let text = capture::truncate_body(text, MAX_BODY_CAPTURE_BYTES);
                    state
                        .span
                        .set_attribute(KeyValue::new(ATTR_HTTP_RESPONSE_BODY, text));
                }
            }
        }

        self.attach_resource_timings(&mut state);

        if let Some(code) = state.status {
            state
                .span
                .set_attribute(KeyValue::new(ATTR_HTTP_STATUS_CODE, i64::from(code)));
        }
        if let Some(text) = state.status_text.take() {
            state
                .span
                .set_attribute(KeyValue::new(ATTR_HTTP_STATUS_TEXT, text));
        }
        if let Some(host) = state.url.host_str() {
            state
                .span
                .set_attribute(KeyValue::new(ATTR_HTTP_HOST, host.to_string()));
        }
        state
            .span
            .set_attribute(KeyValue::new(ATTR_HTTP_SCHEME, state.url.scheme().to_string()));
        if let Some(user_agent) = &self.inner.settings.user_agent {
            state
                .span
                .set_attribute(KeyValue::new(ATTR_HTTP_USER_AGENT, user_agent.clone()));
        }

        let end_time = state.end_time.unwrap_or_else(|| self.inner.clock.now());
        state.span.end_with_timestamp(end_time);
        log::debug!("request span ended: {} {}", state.method, state.raw_url);

        if state.sent && self.inner.tasks.decrement() == 0 {
            self.clear_shared_caches();
        }
    }

    /// Attributes matching resource-timing entries to the finished request:
    /// network phase events on the span, plus a child span for a detected
    /// CORS preflight. Entries are marked used under the same lock that
    /// selected them, so two requests can never claim the same entry.
    fn attach_resource_timings(&self, state: &mut RequestState<T::Span>) {
        let Some(send_start) = state.send_start_hr else {
            return;
        };
        let Some(end_hr) = state.end_hr else {
            return;
        };

        let mut candidates = state.collected.lock().unwrap().clone();
        if candidates.is_empty() {
            if let Some(timing) = &self.inner.timing {
                candidates = timing.entries();
            }
        }
        if candidates.is_empty() {
            return;
        }

        let matched = {
            let mut used = self.inner.used.lock().unwrap();
            let matched =
                correlate::match_resources(&candidates, &state.raw_url, send_start, end_hr, &used);
            if let Some(matched) = &matched {
                used.mark(&matched.main);
                if let Some(preflight) = &matched.preflight {
                    used.mark(preflight);
                }
            }
            matched
        };
        let Some(matched) = matched else {
            return;
        };

        if let Some(preflight) = &matched.preflight {
            self.add_preflight_span(state.span.span_context().clone(), preflight);
        }
        correlate::add_network_events(&mut state.span, &matched.main, self.inner.clock.as_ref());
    }

    fn add_preflight_span(&self, parent: SpanContext, entry: &ResourceEntry) {
        let clock = self.inner.clock.as_ref();
        let parent_cx = Context::new().with_remote_span_context(parent);
        let mut preflight = self.inner.tracer.build_with_context(
            SpanBuilder::from_name(CORS_PREFLIGHT_SPAN_NAME)
                .with_kind(SpanKind::Client)
                .with_start_time(clock.to_system_time(entry.fetch_start))
                .with_attributes([KeyValue::new(ATTR_COMPONENT, HTTP_COMPONENT)]),
            &parent_cx,
        );
        correlate::add_network_events(&mut preflight, entry, clock);
        preflight.end_with_timestamp(clock.to_system_time(entry.response_end));
    }

    /// Resets the shared timing caches once nothing is in flight. Gated by
    /// the task counter so a request that is still settling never loses the
    /// entries it has yet to claim.
    fn clear_shared_caches(&self) {
        if !self.inner.settings.clear_timing_resources {
            return;
        }
        if let Some(timing) = &self.inner.timing {
            timing.clear();
        }
        {
            let mut used = self.inner.used.lock().unwrap();
            *used = used.next_generation();
        }
        self.inner.registry.lock().unwrap().rebuild();
    }
}
