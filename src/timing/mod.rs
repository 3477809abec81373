#![doc = include_str!("README.md")]

mod clock;
mod entry;
mod source;

#[doc(inline)]
pub use clock::{Clock, ManualClock, SystemClock};

#[doc(inline)]
pub use entry::{EntryKey, InitiatorType, ResourceEntry};

#[doc(inline)]
pub use source::{EntrySink, InMemoryTimingSource, ObserverRegistration, ResourceTimingSource};
