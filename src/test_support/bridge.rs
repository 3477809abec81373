use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::native::{
    initialization_failed, AppStartInfo, NativeBridge, NativeConfig, NativeResult,
};

/// Bridge that records every interaction for later assertions.
#[derive(Default)]
pub struct RecordingBridge {
    pub init_configs: Mutex<Vec<NativeConfig>>,
    pub session_ids: Mutex<Vec<String>>,
    pub crash_requests: AtomicUsize,
    app_start: Option<AppStartInfo>,
    fail_initialize: bool,
}

impl RecordingBridge {
    pub fn new() -> Self {
        RecordingBridge::default()
    }

    /// Bridge whose initialization reports the given launch timing.
    pub fn with_app_start(info: AppStartInfo) -> Self {
        RecordingBridge {
            app_start: Some(info),
            ..RecordingBridge::default()
        }
    }

    /// Bridge whose initialization always fails.
    pub fn failing() -> Self {
        RecordingBridge {
            fail_initialize: true,
            ..RecordingBridge::default()
        }
    }

    pub fn last_session_id(&self) -> Option<String> {
        self.session_ids.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl NativeBridge for RecordingBridge {
    async fn initialize(&self, config: NativeConfig) -> NativeResult<Option<AppStartInfo>> {
        if self.fail_initialize {
            return Err(initialization_failed("native module rejected the config"));
        }
        self.init_configs.lock().unwrap().push(config);
        Ok(self.app_start.clone())
    }

    fn set_session_id(&self, session_id: &str) {
        self.session_ids.lock().unwrap().push(session_id.to_string());
    }

    fn test_crash(&self) {
        self.crash_requests.fetch_add(1, Ordering::SeqCst);
    }
}
