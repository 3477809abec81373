use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime};

/// High-resolution clock anchored to a wall-clock time origin, in the style
/// of the browser performance timeline: readings are fractional milliseconds
/// elapsed since the origin.
pub trait Clock: Send + Sync {
    /// Wall-clock instant that high-resolution readings are relative to.
    fn time_origin(&self) -> SystemTime;

    /// Milliseconds elapsed since the time origin.
    fn now_hr(&self) -> f64;

    /// Current wall-clock time derived from the high-resolution reading.
    fn now(&self) -> SystemTime {
        self.to_system_time(self.now_hr())
    }

    /// Converts a high-resolution reading into wall-clock time.
    fn to_system_time(&self, hr_millis: f64) -> SystemTime {
        self.time_origin() + Duration::from_secs_f64(hr_millis.max(0.0) / 1000.0)
    }
}

/// Default clock. The origin is captured once at construction; readings are
/// driven by a monotonic instant so they never run backwards.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: SystemTime,
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            origin: SystemTime::now(),
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock::new()
    }
}

impl Clock for SystemClock {
    fn time_origin(&self) -> SystemTime {
        self.origin
    }

    fn now_hr(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually driven clock for deterministic tests and offline replay.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: SystemTime,
    now_hr: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock::starting_at(SystemTime::now())
    }

    pub fn starting_at(origin: SystemTime) -> Self {
        ManualClock {
            origin,
            now_hr: Arc::new(Mutex::new(0.0)),
        }
    }

    /// Sets the reading to an absolute number of milliseconds past the origin.
    pub fn set(&self, hr_millis: f64) {
        *self.now_hr.lock().unwrap() = hr_millis;
    }

    /// Moves the reading forward by `delta_millis`.
    pub fn advance(&self, delta_millis: f64) {
        *self.now_hr.lock().unwrap() += delta_millis;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        ManualClock::new()
    }
}

impl Clock for ManualClock {
    fn time_origin(&self) -> SystemTime {
        self.origin
    }

    fn now_hr(&self) -> f64 {
        *self.now_hr.lock().unwrap()
    }
}
