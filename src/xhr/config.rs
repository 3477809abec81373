use std::time::Duration;

use crate::util::url_match::UrlRule;
use crate::xhr::constants::DEFAULT_SETTLE_DELAY;

/// Tuning knobs for the XHR auto-instrumentation.
#[derive(Clone, Debug)]
pub struct XhrSettings {
    /// Requests whose URL matches any rule here are left uninstrumented.
    pub ignore_urls: Vec<UrlRule>,
    /// Trace-context headers are injected only into requests whose URL
    /// matches one of these rules.
    pub propagate_trace_header_cors_urls: Vec<UrlRule>,
    /// Reset the shared resource-timing caches whenever the last in-flight
    /// request finishes.
    pub clear_timing_resources: bool,
    /// Capture request and response headers as span attributes.
    pub network_headers_capture: bool,
    /// Capture request and response bodies as span attributes.
    pub network_body_capture: bool,
    /// Reported as `http.user_agent` on request spans.
    pub user_agent: Option<String>,
    /// How long finalization waits for resource-timing entries to land.
    pub settle_delay: Duration,
}

impl Default for XhrSettings {
    fn default() -> Self {
        XhrSettings {
            ignore_urls: Vec::new(),
            propagate_trace_header_cors_urls: Vec::new(),
            clear_timing_resources: false,
            network_headers_capture: false,
            network_body_capture: false,
            user_agent: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}
