#![doc = include_str!("README.md")]

mod api;
mod capture;
mod config;
pub(crate) mod constants;
mod correlate;
mod state;

#[doc(inline)]
pub use api::{
    ResponseStatus, SpanDecorator, TerminalEvent, XhrTracing, XhrTracingBuilder,
};

#[doc(inline)]
pub use capture::{BodyPayload, ResponseBody};

#[doc(inline)]
pub use config::XhrSettings;

#[doc(inline)]
pub use constants::{
    CORS_PREFLIGHT_SPAN_NAME, DEFAULT_SETTLE_DELAY, ERROR_STATUS_THRESHOLD,
    MAX_BODY_CAPTURE_BYTES, REQUEST_HEADER_ATTR_PREFIX, RESPONSE_HEADER_ATTR_PREFIX,
};

#[doc(inline)]
pub use state::{RequestHandle, TaskCounter};
