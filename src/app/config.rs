use opentelemetry::KeyValue;

use crate::app::error::{invalid_configuration, RumResult};
use crate::session::SessionSettings;
use crate::xhr::XhrSettings;

/// Top-level SDK configuration.
#[derive(Clone, Debug)]
pub struct RumConfig {
    /// Application name reported on every span. Required.
    pub app_name: Option<String>,
    /// Ingest authentication token handed to the native side. Required.
    pub rum_access_token: Option<String>,
    /// Ingest endpoint handed to the native side.
    pub beacon_endpoint: Option<String>,
    /// Reported as `deployment.environment` on every span.
    pub deployment_environment: Option<String>,
    /// Reported as `http.user_agent` on request spans.
    pub user_agent: Option<String>,
    /// Attributes stamped on every span at startup. More can be merged in
    /// later through the SDK handle.
    pub global_attributes: Vec<KeyValue>,
    /// Emit the app-start span when the native side reports launch timing.
    pub track_app_start: bool,
    pub session: SessionSettings,
    pub xhr: XhrSettings,
}

impl Default for RumConfig {
    fn default() -> Self {
        RumConfig {
            app_name: None,
            rum_access_token: None,
            beacon_endpoint: None,
            deployment_environment: None,
            user_agent: None,
            global_attributes: Vec::new(),
            track_app_start: true,
            session: SessionSettings::default(),
            xhr: XhrSettings::default(),
        }
    }
}

impl RumConfig {
    pub(crate) fn validate(&self) -> RumResult<()> {
        match &self.app_name {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(invalid_configuration("app_name is required")),
        }
        match &self.rum_access_token {
            Some(token) if !token.trim().is_empty() => {}
            _ => return Err(invalid_configuration("rum_access_token is required")),
        }
        Ok(())
    }
}
