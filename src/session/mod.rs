#![doc = include_str!("README.md")]

mod constants;
mod manager;

#[doc(inline)]
pub use constants::{MAX_SESSION_AGE, SESSION_ID_BYTES, SESSION_INACTIVITY_TIMEOUT};

#[doc(inline)]
pub use manager::{SessionManager, SessionSettings};
