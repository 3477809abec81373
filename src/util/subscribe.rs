/// Capability that detaches a previously registered listener set.
pub type Unsubscribe = Box<dyn FnOnce() + Send + 'static>;
