/// Initiator of a resource fetch, as reported on the performance timeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitiatorType {
    XmlHttpRequest,
    Fetch,
    Other(String),
}

impl InitiatorType {
    pub fn as_str(&self) -> &str {
        match self {
            InitiatorType::XmlHttpRequest => "xmlhttprequest",
            InitiatorType::Fetch => "fetch",
            InitiatorType::Other(other) => other,
        }
    }

    /// True for entries produced by XHR-style transports.
    pub fn is_xhr_like(&self) -> bool {
        matches!(self, InitiatorType::XmlHttpRequest | InitiatorType::Fetch)
    }
}

impl From<&str> for InitiatorType {
    fn from(raw: &str) -> Self {
        match raw {
            "xmlhttprequest" => InitiatorType::XmlHttpRequest,
            "fetch" => InitiatorType::Fetch,
            other => InitiatorType::Other(other.to_string()),
        }
    }
}

/// One completed sub-resource fetch with its network phase timings. All
/// readings are fractional milliseconds relative to the clock's time origin,
/// mirroring `PerformanceResourceTiming`.
#[derive(Clone, Debug, PartialEq)]
pub struct ResourceEntry {
    /// Full URL of the fetched resource.
    pub name: String,
    pub initiator_type: InitiatorType,
    pub start_time: f64,
    pub fetch_start: f64,
    pub domain_lookup_start: f64,
    pub domain_lookup_end: f64,
    pub connect_start: f64,
    /// Zero when no TLS handshake took place.
    pub secure_connection_start: f64,
    pub connect_end: f64,
    pub request_start: f64,
    pub response_start: f64,
    pub response_end: f64,
}

impl ResourceEntry {
    /// Identity used for used-entry bookkeeping.
    pub fn key(&self) -> EntryKey {
        EntryKey {
            name: self.name.clone(),
            fetch_start: self.fetch_start.to_bits(),
            response_end: self.response_end.to_bits(),
        }
    }

    /// Network phase timings in timeline order, named after the
    /// `PerformanceResourceTiming` fields they come from. The TLS phase is
    /// reported only when a secure handshake actually happened.
    pub fn network_events(&self) -> Vec<(&'static str, f64)> {
        let mut events = vec![
            ("fetchStart", self.fetch_start),
            ("domainLookupStart", self.domain_lookup_start),
            ("domainLookupEnd", self.domain_lookup_end),
            ("connectStart", self.connect_start),
        ];
        if self.secure_connection_start > 0.0 {
            events.push(("secureConnectionStart", self.secure_connection_start));
        }
        events.push(("connectEnd", self.connect_end));
        events.push(("requestStart", self.request_start));
        events.push(("responseStart", self.response_start));
        events.push(("responseEnd", self.response_end));
        events
    }
}

/// Hashable identity of a resource entry: the URL plus the exact bit
/// patterns of the window endpoints. Floats are compared bit-for-bit, which
/// is what we want here since entries are never recomputed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntryKey {
    name: String,
    fetch_start: u64,
    response_end: u64,
}
