#![doc = include_str!("README.md")]

mod bridge;
mod error;

#[doc(inline)]
pub use bridge::{AppStartInfo, NativeBridge, NativeConfig, NoopNativeBridge};

#[doc(inline)]
pub use error::{
    initialization_failed, unavailable, NativeError, NativeErrorCode, NativeResult,
};
