/// Instrumentation scope under which the SDK acquires its tracer.
pub const RUM_TRACER_NAME: &str = "rum-rs-sdk";

pub const APP_START_SPAN_NAME: &str = "AppStart";
pub const APP_START_COMPONENT: &str = "appstart";

pub const ATTR_APP: &str = "app";
pub const ATTR_SESSION_ID: &str = "session.id";
pub const ATTR_DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment";
pub const ATTR_START_TYPE: &str = "start.type";

pub const START_TYPE_COLD: &str = "cold";
pub const START_TYPE_WARM: &str = "warm";
