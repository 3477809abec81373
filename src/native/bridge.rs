use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::native::error::NativeResult;

/// Launch timing reported by the host platform for the current process.
/// Timestamps are unix epoch milliseconds. Serializes with the camelCase
/// names the bridge payload uses on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppStartInfo {
    pub app_start_epoch_ms: Option<u64>,
    pub launch_end_epoch_ms: Option<u64>,
    #[serde(default)]
    pub is_cold_start: bool,
}

/// Subset of the SDK configuration forwarded to the platform side during
/// initialization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeConfig {
    pub app_name: String,
    pub rum_access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beacon_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_environment: Option<String>,
    pub session_id: String,
}

/// Narrow interface to the platform-native half of the SDK. Implementations
/// wrap whatever the host exposes; the crate itself only ships a no-op.
#[async_trait]
pub trait NativeBridge: Send + Sync {
    /// Boots the native side and reports launch timing when it is known.
    async fn initialize(&self, config: NativeConfig) -> NativeResult<Option<AppStartInfo>>;

    /// Pushes a replacement session id to the native side.
    fn set_session_id(&self, session_id: &str);

    /// Triggers a deliberate native crash. Debugging aid for verifying
    /// crash reporting pipelines.
    fn test_crash(&self);
}

/// Bridge for hosts without a native side: initialization succeeds with no
/// launch timing and session pushes are dropped.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNativeBridge;

#[async_trait]
impl NativeBridge for NoopNativeBridge {
    async fn initialize(&self, _config: NativeConfig) -> NativeResult<Option<AppStartInfo>> {
        Ok(None)
    }

    fn set_session_id(&self, _session_id: &str) {}

    fn test_crash(&self) {
        log::warn!("test_crash requested but no native side is attached");
    }
}
