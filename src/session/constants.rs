use std::time::Duration;

/// Hard ceiling on the lifetime of a single session id.
pub const MAX_SESSION_AGE: Duration = Duration::from_secs(4 * 60 * 60);

/// A session id is rotated after this much time without activity.
pub const SESSION_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Session ids are this many random bytes rendered as lower-case hex.
pub const SESSION_ID_BYTES: usize = 16;
