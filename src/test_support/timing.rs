use crate::timing::{InitiatorType, ResourceEntry};

/// Builds an XHR-initiated resource entry whose network phases are spread
/// evenly across `[fetch_start, response_end]`.
pub fn xhr_entry(url: &str, fetch_start: f64, response_end: f64) -> ResourceEntry {
    let step = (response_end - fetch_start) / 8.0;
    ResourceEntry {
        name: url.to_string(),
        initiator_type: InitiatorType::XmlHttpRequest,
        start_time: fetch_start,
        fetch_start,
        domain_lookup_start: fetch_start + step,
        domain_lookup_end: fetch_start + 2.0 * step,
        connect_start: fetch_start + 3.0 * step,
        secure_connection_start: 0.0,
        connect_end: fetch_start + 4.0 * step,
        request_start: fetch_start + 5.0 * step,
        response_start: fetch_start + 6.0 * step,
        response_end,
    }
}
