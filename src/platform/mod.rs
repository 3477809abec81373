#![doc = include_str!("README.md")]

mod runtime;

#[doc(inline)]
pub use runtime::{sleep, spawn_detached};
