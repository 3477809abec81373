use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::RngCore;

use crate::session::constants::{MAX_SESSION_AGE, SESSION_ID_BYTES, SESSION_INACTIVITY_TIMEOUT};
use crate::timing::Clock;

/// Rotation policy for session ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    /// Sessions are replaced once they reach this age, active or not.
    pub max_age: Duration,
    /// Sessions are replaced after this much time without activity.
    pub inactivity_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            max_age: MAX_SESSION_AGE,
            inactivity_timeout: SESSION_INACTIVITY_TIMEOUT,
        }
    }
}

type SessionObserver = Arc<dyn Fn(&str) + Send + Sync + 'static>;

/// Tracks the current session id and rotates it when it ages out or goes
/// idle. Rotation is lazy: expiry is checked whenever the id is read, and
/// reading counts as activity.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
    state: Mutex<SessionState>,
    observers: Mutex<Vec<SessionObserver>>,
}

struct SessionState {
    id: String,
    started_hr: f64,
    last_activity_hr: f64,
}

pub(crate) fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

impl SessionManager {
    pub fn new(settings: SessionSettings, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now_hr();
        let state = SessionState {
            id: generate_session_id(),
            started_hr: now,
            last_activity_hr: now,
        };
        SessionManager {
            inner: Arc::new(SessionInner {
                clock,
                settings,
                state: Mutex::new(state),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Returns the current session id, replacing it first if it has expired.
    /// Observers run after the internal lock is released.
    pub fn current_id(&self) -> String {
        let now = self.inner.clock.now_hr();
        let (id, rotated) = {
            let mut state = self.inner.state.lock().unwrap();
            let rotated = self.rotate_if_expired(&mut state, now);
            state.last_activity_hr = now;
            (state.id.clone(), rotated)
        };
        if rotated {
            self.notify(&id);
        }
        id
    }

    /// Marks activity without using the id.
    pub fn track_activity(&self) {
        let _ = self.current_id();
    }

    /// Registers `observer` to run with each replacement id.
    pub fn on_change(&self, observer: impl Fn(&str) + Send + Sync + 'static) {
        self.inner.observers.lock().unwrap().push(Arc::new(observer));
    }

    fn rotate_if_expired(&self, state: &mut SessionState, now_hr: f64) -> bool {
        let age = now_hr - state.started_hr;
        let idle = now_hr - state.last_activity_hr;
        let expired = age >= self.inner.settings.max_age.as_secs_f64() * 1000.0
            || idle >= self.inner.settings.inactivity_timeout.as_secs_f64() * 1000.0;
        if !expired {
            return false;
        }
        state.id = generate_session_id();
        state.started_hr = now_hr;
        state.last_activity_hr = now_hr;
        true
    }

    fn notify(&self, id: &str) {
        let observers: Vec<SessionObserver> = self.inner.observers.lock().unwrap().clone();
        for observer in observers {
            observer(id);
        }
    }
}
