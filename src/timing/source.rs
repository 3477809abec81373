use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use crate::timing::entry::ResourceEntry;

/// Callback receiving resource entries as they are published.
pub type EntrySink = Arc<dyn Fn(&ResourceEntry) + Send + Sync + 'static>;

/// Stream of completed resource-timing observations plus the shared entry
/// buffer, as exposed by the host runtime.
pub trait ResourceTimingSource: Send + Sync {
    /// Installs `sink` to receive entries as they arrive. The observer stays
    /// live until the returned registration is disconnected or dropped.
    fn observe(&self, sink: EntrySink) -> ObserverRegistration;

    /// Snapshot of the full resource-timing buffer.
    fn entries(&self) -> Vec<ResourceEntry>;

    /// Empties the shared buffer.
    fn clear(&self);
}

/// Handle for an installed observer; dropping it disconnects the observer.
pub struct ObserverRegistration {
    disconnect: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl ObserverRegistration {
    pub fn new(disconnect: impl FnOnce() + Send + 'static) -> Self {
        ObserverRegistration {
            disconnect: Some(Box::new(disconnect)),
        }
    }

    /// Disconnects the observer now instead of waiting for drop.
    pub fn disconnect(mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for ObserverRegistration {
    fn drop(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

/// Buffering timing source fed by the host bridge through [`publish`].
///
/// [`publish`]: InMemoryTimingSource::publish
#[derive(Clone, Default)]
pub struct InMemoryTimingSource {
    inner: Arc<TimingSourceInner>,
}

#[derive(Default)]
struct TimingSourceInner {
    entries: Mutex<Vec<ResourceEntry>>,
    observers: Mutex<HashMap<u64, EntrySink>>,
    next_observer_id: AtomicU64,
}

impl InMemoryTimingSource {
    pub fn new() -> Self {
        InMemoryTimingSource::default()
    }

    /// Appends `entry` to the buffer and fans it out to live observers.
    /// Observer callbacks run outside the internal locks.
    pub fn publish(&self, entry: ResourceEntry) {
        self.inner.entries.lock().unwrap().push(entry.clone());
        let sinks: Vec<EntrySink> = self.inner.observers.lock().unwrap().values().cloned().collect();
        for sink in sinks {
            sink(&entry);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceTimingSource for InMemoryTimingSource {
    fn observe(&self, sink: EntrySink) -> ObserverRegistration {
        let id = self.inner.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.lock().unwrap().insert(id, sink);
        // Weak so a forgotten registration cannot keep the source alive.
        let inner: Weak<TimingSourceInner> = Arc::downgrade(&self.inner);
        ObserverRegistration::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.observers.lock().unwrap().remove(&id);
            }
        })
    }

    fn entries(&self) -> Vec<ResourceEntry> {
        self.inner.entries.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.inner.entries.lock().unwrap().clear();
    }
}
