use std::sync::{Arc, LazyLock, Mutex};

use opentelemetry::global::{self, BoxedTracer};
use opentelemetry::KeyValue;

use crate::app::app_start::record_app_start;
use crate::app::config::RumConfig;
use crate::app::constants::{
    ATTR_APP, ATTR_DEPLOYMENT_ENVIRONMENT, ATTR_SESSION_ID, RUM_TRACER_NAME,
};
use crate::app::error::{already_initialized, not_initialized, RumResult};
use crate::attributes::AttributeStore;
use crate::native::{NativeBridge, NativeConfig};
use crate::session::SessionManager;
use crate::timing::{
    Clock, InMemoryTimingSource, ResourceTimingSource, SystemClock,
};
use crate::xhr::XhrTracing;

static INSTANCE: LazyLock<Mutex<Option<RumSdk>>> = LazyLock::new(|| Mutex::new(None));

/// Handle to the initialized SDK, cheap to clone and share.
#[derive(Clone)]
pub struct RumSdk {
    inner: Arc<RumSdkInner>,
}

struct RumSdkInner {
    config: RumConfig,
    session: SessionManager,
    attributes: AttributeStore,
    timing: InMemoryTimingSource,
    xhr: XhrTracing<BoxedTracer>,
    bridge: Arc<dyn NativeBridge>,
}

impl std::fmt::Debug for RumSdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RumSdk")
            .field("app_name", &self.app_name())
            .finish_non_exhaustive()
    }
}

/// Attributes shared by every span the SDK produces. The session id is
/// read fresh so rotation is picked up per span.
fn base_attributes(
    app_name: &str,
    environment: Option<&str>,
    session: &SessionManager,
    attributes: &AttributeStore,
) -> Vec<KeyValue> {
    let mut out = vec![
        KeyValue::new(ATTR_APP, app_name.to_string()),
        KeyValue::new(ATTR_SESSION_ID, session.current_id()),
    ];
    if let Some(environment) = environment {
        out.push(KeyValue::new(
            ATTR_DEPLOYMENT_ENVIRONMENT,
            environment.to_string(),
        ));
    }
    out.extend(attributes.snapshot());
    out
}

/// One-shot SDK initialization.
///
/// Validates the configuration, wires the session manager, attribute store
/// and XHR engine onto the globally installed tracer provider, boots the
/// native side and publishes the singleton handle. A second call is
/// rejected and leaves the first instance untouched. A native side that
/// fails to boot is logged and skipped; span production keeps working.
pub async fn init(config: RumConfig, bridge: Arc<dyn NativeBridge>) -> RumResult<RumSdk> {
    if let Err(err) = config.validate() {
        log::error!("rum initialization failed: {err}");
        return Err(err);
    }
    if INSTANCE.lock().unwrap().is_some() {
        log::warn!("rum sdk is already initialized, ignoring repeated init");
        return Err(already_initialized("init may only be called once"));
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let session = SessionManager::new(config.session.clone(), Arc::clone(&clock));
    let attributes = AttributeStore::new();
    attributes.set_global_attributes(config.global_attributes.iter().cloned());
    let timing = InMemoryTimingSource::new();

    let app_name = config.app_name.clone().unwrap_or_default();
    let environment = config.deployment_environment.clone();

    let mut xhr_settings = config.xhr.clone();
    if xhr_settings.user_agent.is_none() {
        xhr_settings.user_agent = config.user_agent.clone();
    }
    let decorator_session = session.clone();
    let decorator_attributes = attributes.clone();
    let decorator_app_name = app_name.clone();
    let decorator_environment = environment.clone();
    let xhr = XhrTracing::builder(global::tracer(RUM_TRACER_NAME))
        .settings(xhr_settings)
        .clock(Arc::clone(&clock))
        .timing_source(Arc::new(timing.clone()) as Arc<dyn ResourceTimingSource>)
        .span_decorator(move |attrs| {
            attrs.extend(base_attributes(
                &decorator_app_name,
                decorator_environment.as_deref(),
                &decorator_session,
                &decorator_attributes,
            ));
        })
        .build();

    // Keep the native side supplied with the session id, now and after
    // every rotation.
    let session_bridge = Arc::clone(&bridge);
    session.on_change(move |id| session_bridge.set_session_id(id));
    bridge.set_session_id(&session.current_id());

    let native_config = NativeConfig {
        app_name: app_name.clone(),
        rum_access_token: config.rum_access_token.clone().unwrap_or_default(),
        beacon_endpoint: config.beacon_endpoint.clone(),
        deployment_environment: environment.clone(),
        session_id: session.current_id(),
    };
    let app_start_info = match bridge.initialize(native_config).await {
        Ok(info) => info,
        Err(err) => {
            log::warn!("native sdk failed to initialize: {err}");
            None
        }
    };

    if config.track_app_start {
        if let Some(info) = &app_start_info {
            record_app_start(
                &global::tracer(RUM_TRACER_NAME),
                info,
                base_attributes(&app_name, environment.as_deref(), &session, &attributes),
            );
        }
    }

    let sdk = RumSdk {
        inner: Arc::new(RumSdkInner {
            config,
            session,
            attributes,
            timing,
            xhr,
            bridge,
        }),
    };

    {
        let mut instance = INSTANCE.lock().unwrap();
        if instance.is_some() {
            log::warn!("rum sdk is already initialized, ignoring repeated init");
            return Err(already_initialized("init may only be called once"));
        }
        *instance = Some(sdk.clone());
    }
    log::info!("rum sdk initialized for app {app_name}");
    Ok(sdk)
}

/// Returns the singleton SDK handle, if [`init`] has completed.
pub fn get_rum() -> RumResult<RumSdk> {
    INSTANCE.lock().unwrap().clone().ok_or_else(not_initialized)
}

impl RumSdk {
    pub fn app_name(&self) -> &str {
        self.inner.config.app_name.as_deref().unwrap_or_default()
    }

    /// The XHR instrumentation engine backing this SDK instance.
    pub fn xhr(&self) -> &XhrTracing<BoxedTracer> {
        &self.inner.xhr
    }

    pub fn session(&self) -> &SessionManager {
        &self.inner.session
    }

    /// Timing source the host bridge publishes resource entries into.
    pub fn timing_source(&self) -> InMemoryTimingSource {
        self.inner.timing.clone()
    }

    /// Merges `attributes` into the set stamped on every future span.
    pub fn set_global_attributes<I>(&self, attributes: I)
    where
        I: IntoIterator<Item = KeyValue>,
    {
        self.inner.attributes.set_global_attributes(attributes);
    }

    pub fn global_attributes(&self) -> Vec<KeyValue> {
        self.inner.attributes.snapshot()
    }

    /// Asks the native side to crash deliberately.
    pub fn test_native_crash(&self) {
        self.inner.bridge.test_crash();
    }
}

#[cfg(test)]
pub(crate) fn reset_for_tests() {
    *INSTANCE.lock().unwrap() = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::error::RumErrorCode;
    use crate::native::{AppStartInfo, NoopNativeBridge};
    use crate::test_support::RecordingBridge;

    static TEST_GUARD: Mutex<()> = Mutex::new(());

    fn test_config(app_name: &str) -> RumConfig {
        RumConfig {
            app_name: Some(app_name.to_string()),
            rum_access_token: Some("token-abc".to_string()),
            beacon_endpoint: Some("https://ingest.example.com/v1/traces".to_string()),
            deployment_environment: Some("test".to_string()),
            ..RumConfig::default()
        }
    }

    #[tokio::test]
    async fn invalid_configuration_aborts_initialization() {
        let _guard = TEST_GUARD.lock().unwrap();
        reset_for_tests();

        let config = RumConfig {
            rum_access_token: Some("token".to_string()),
            ..RumConfig::default()
        };
        let err = init(config, Arc::new(NoopNativeBridge)).await.unwrap_err();
        assert_eq!(err.code, RumErrorCode::InvalidConfiguration);
        assert!(get_rum().is_err());
    }

    #[tokio::test]
    async fn repeated_init_is_rejected_and_keeps_the_first_instance() {
        let _guard = TEST_GUARD.lock().unwrap();
        reset_for_tests();

        init(test_config("first-app"), Arc::new(NoopNativeBridge))
            .await
            .unwrap();
        let err = init(test_config("second-app"), Arc::new(NoopNativeBridge))
            .await
            .unwrap_err();
        assert_eq!(err.code, RumErrorCode::AlreadyInitialized);
        assert_eq!(get_rum().unwrap().app_name(), "first-app");
    }

    #[tokio::test]
    async fn native_bridge_receives_config_and_session_id() {
        let _guard = TEST_GUARD.lock().unwrap();
        reset_for_tests();

        let bridge = Arc::new(RecordingBridge::new());
        let sdk = init(test_config("bridged-app"), bridge.clone())
            .await
            .unwrap();

        let configs = bridge.init_configs.lock().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].app_name, "bridged-app");
        assert_eq!(configs[0].rum_access_token, "token-abc");
        assert_eq!(
            configs[0].beacon_endpoint.as_deref(),
            Some("https://ingest.example.com/v1/traces")
        );
        assert_eq!(bridge.last_session_id(), Some(sdk.session().current_id()));

        sdk.test_native_crash();
        assert_eq!(bridge.crash_requests.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn native_failure_does_not_abort_initialization() {
        let _guard = TEST_GUARD.lock().unwrap();
        reset_for_tests();

        let bridge = Arc::new(RecordingBridge::failing());
        let sdk = init(test_config("resilient-app"), bridge).await.unwrap();
        assert_eq!(sdk.app_name(), "resilient-app");
        assert!(get_rum().is_ok());
    }

    #[tokio::test]
    async fn global_attribute_updates_merge_by_key() {
        let _guard = TEST_GUARD.lock().unwrap();
        reset_for_tests();

        let mut config = test_config("attr-app");
        config.global_attributes = vec![KeyValue::new("enduser.id", "u-1")];
        let sdk = init(config, Arc::new(NoopNativeBridge)).await.unwrap();

        sdk.set_global_attributes([KeyValue::new("enduser.id", "u-2")]);
        let attributes = sdk.global_attributes();
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes[0].value.to_string(), "u-2");
    }

    #[tokio::test]
    async fn app_start_span_uses_bridge_timing() {
        let _guard = TEST_GUARD.lock().unwrap();
        reset_for_tests();

        // Timing flows through whatever tracer provider is installed
        // globally; here we only verify the bridge report is consumed.
        let bridge = Arc::new(RecordingBridge::with_app_start(AppStartInfo {
            app_start_epoch_ms: Some(1_700_000_000_000),
            launch_end_epoch_ms: Some(1_700_000_000_400),
            is_cold_start: true,
        }));
        let sdk = init(test_config("launch-app"), bridge.clone()).await.unwrap();
        assert_eq!(sdk.app_name(), "launch-app");
        assert_eq!(bridge.init_configs.lock().unwrap().len(), 1);
    }
}
