#![doc = include_str!("RUSTDOC.md")]

pub mod app;
pub mod attributes;
pub mod native;
pub mod platform;
pub mod session;
pub mod timing;
pub mod util;
pub mod xhr;

#[cfg(test)]
pub mod test_support;
