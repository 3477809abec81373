#![doc = include_str!("README.md")]

mod api;
mod app_start;
mod config;
mod constants;
mod error;

#[doc(inline)]
pub use api::{get_rum, init, RumSdk};

#[cfg(test)]
#[allow(unused_imports)]
pub(crate) use api::reset_for_tests;

#[doc(inline)]
pub use config::RumConfig;

#[doc(inline)]
pub use constants::{
    APP_START_COMPONENT, APP_START_SPAN_NAME, ATTR_APP, ATTR_DEPLOYMENT_ENVIRONMENT,
    ATTR_SESSION_ID, ATTR_START_TYPE, RUM_TRACER_NAME, START_TYPE_COLD, START_TYPE_WARM,
};

#[doc(inline)]
pub use error::{
    already_initialized, internal_error, invalid_configuration, not_initialized, RumError,
    RumErrorCode, RumResult,
};
