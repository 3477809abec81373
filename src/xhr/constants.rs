use std::time::Duration;

pub const ATTR_COMPONENT: &str = "component";
pub const ATTR_HTTP_METHOD: &str = "http.method";
pub const ATTR_HTTP_URL: &str = "http.url";
pub const ATTR_HTTP_STATUS_CODE: &str = "http.status_code";
pub const ATTR_HTTP_STATUS_TEXT: &str = "http.status_text";
pub const ATTR_HTTP_HOST: &str = "http.host";
pub const ATTR_HTTP_SCHEME: &str = "http.scheme";
pub const ATTR_HTTP_USER_AGENT: &str = "http.user_agent";
pub const ATTR_HTTP_REQUEST_BODY: &str = "http.request.body";
pub const ATTR_HTTP_RESPONSE_BODY: &str = "http.response.body";
pub const ATTR_LINK_TRACE_ID: &str = "link.traceId";
pub const ATTR_LINK_SPAN_ID: &str = "link.spanId";

/// Captured headers become attributes under these prefixes, with the header
/// name lower-cased and `-` folded to `_`.
pub const REQUEST_HEADER_ATTR_PREFIX: &str = "http.request.header.";
pub const RESPONSE_HEADER_ATTR_PREFIX: &str = "http.response.header.";

pub const HTTP_COMPONENT: &str = "http";
pub const CORS_PREFLIGHT_SPAN_NAME: &str = "CORS Preflight";

pub const EVENT_OPEN: &str = "open";
pub const EVENT_SEND: &str = "send";
pub const EVENT_ERROR: &str = "error";

/// Captured request and response bodies are truncated to this many bytes.
pub const MAX_BODY_CAPTURE_BYTES: usize = 5 * 1024;

/// Grace period between a terminal event and span finalization, giving the
/// platform time to flush the matching resource-timing entry.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Load results at or above this status are recorded as errors.
pub const ERROR_STATUS_THRESHOLD: u16 = 299;
