use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use tokio::sync::oneshot;
use url::Url;

use crate::timing::{ObserverRegistration, ResourceEntry};
use crate::util::Unsubscribe;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Identity of one underlying request object. The transport-patching layer
/// allocates a handle per live object and keys every lifecycle call with it;
/// reusing a handle models reusing the underlying object for a new request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestHandle(u64);

impl RequestHandle {
    /// Allocates the next free handle.
    pub fn next() -> Self {
        RequestHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
    }

    pub const fn from_raw(raw: u64) -> Self {
        RequestHandle(raw)
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

/// Everything tracked for one in-flight request, keyed by its handle.
pub(crate) struct RequestState<S> {
    pub span: S,
    pub method: String,
    pub raw_url: String,
    pub url: Url,
    /// Set when send is observed; gates the task-counter pairing.
    pub sent: bool,
    pub send_start_hr: Option<f64>,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub end_hr: Option<f64>,
    pub end_time: Option<SystemTime>,
    /// Entries captured by this request's observer while it was in flight.
    pub collected: Arc<Mutex<Vec<ResourceEntry>>>,
    pub teardown: CompletionTeardown,
    /// Response body still being decoded by the host; finalization waits
    /// for it.
    pub pending_response_body: Option<oneshot::Receiver<String>>,
}

impl<S> RequestState<S> {
    pub fn new(span: S, method: impl Into<String>, raw_url: impl Into<String>, url: Url) -> Self {
        RequestState {
            span,
            method: method.into(),
            raw_url: raw_url.into(),
            url,
            sent: false,
            send_start_hr: None,
            status: None,
            status_text: None,
            end_hr: None,
            end_time: None,
            collected: Arc::new(Mutex::new(Vec::new())),
            teardown: CompletionTeardown::default(),
            pending_response_body: None,
        }
    }
}

/// Detaches the transport's completion listeners and disconnects the
/// per-request resource observer. Each half runs at most once.
#[derive(Default)]
pub(crate) struct CompletionTeardown {
    pub listeners: Option<Unsubscribe>,
    pub observer: Option<ObserverRegistration>,
}

impl CompletionTeardown {
    pub fn run(&mut self) {
        if let Some(unsubscribe) = self.listeners.take() {
            unsubscribe();
        }
        if let Some(observer) = self.observer.take() {
            observer.disconnect();
        }
    }
}

/// Explicit per-handle state map. Entries are inserted on open and removed
/// synchronously by the first terminal event, which is what makes a second
/// terminal event for the same request a no-op.
pub(crate) struct RequestRegistry<S> {
    states: HashMap<RequestHandle, RequestState<S>>,
}

impl<S> RequestRegistry<S> {
    pub fn new() -> Self {
        RequestRegistry {
            states: HashMap::new(),
        }
    }

    /// Stores `state` under `handle`, returning any evicted predecessor.
    pub fn insert(&mut self, handle: RequestHandle, state: RequestState<S>) -> Option<RequestState<S>> {
        self.states.insert(handle, state)
    }

    pub fn get_mut(&mut self, handle: RequestHandle) -> Option<&mut RequestState<S>> {
        self.states.get_mut(&handle)
    }

    pub fn remove(&mut self, handle: RequestHandle) -> Option<RequestState<S>> {
        self.states.remove(&handle)
    }

    /// Moves the live entries into fresh storage, dropping any capacity the
    /// map accumulated during a burst of requests.
    pub fn rebuild(&mut self) {
        let rebuilt: HashMap<RequestHandle, RequestState<S>> = self.states.drain().collect();
        self.states = rebuilt;
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}

/// Count of requests between send and finalization. Shared-cache clearing
/// is allowed only when this reaches zero.
#[derive(Debug, Default)]
pub struct TaskCounter(AtomicUsize);

impl TaskCounter {
    pub fn increment(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Decrements, saturating at zero, and returns the new count.
    pub fn decrement(&self) -> usize {
        let mut current = self.0.load(Ordering::SeqCst);
        loop {
            if current == 0 {
                return 0;
            }
            match self
                .0
                .compare_exchange(current, current - 1, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return current - 1,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
