use std::cmp::Ordering;
use std::collections::HashSet;

use opentelemetry::trace::Span;

use crate::timing::{Clock, EntryKey, ResourceEntry};

/// Resource entries already attributed to some span. Generation-tagged so a
/// cache reset swaps in a fresh set instead of mutating one that concurrent
/// finalizations may still be reading against.
pub(crate) struct UsedEntries {
    used: HashSet<EntryKey>,
    generation: u64,
}

impl UsedEntries {
    pub fn new() -> Self {
        UsedEntries {
            used: HashSet::new(),
            generation: 0,
        }
    }

    /// Fresh empty set carrying the next generation number.
    pub fn next_generation(&self) -> Self {
        UsedEntries {
            used: HashSet::new(),
            generation: self.generation + 1,
        }
    }

    pub fn mark(&mut self, entry: &ResourceEntry) -> bool {
        self.used.insert(entry.key())
    }

    pub fn contains(&self, entry: &ResourceEntry) -> bool {
        self.used.contains(&entry.key())
    }

    #[allow(dead_code)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.used.len()
    }
}

/// Timing entries selected for one request: the main fetch plus the CORS
/// preflight that preceded it, when one was detected.
pub(crate) struct MatchedResources {
    pub main: ResourceEntry,
    pub preflight: Option<ResourceEntry>,
}

/// Selects the resource entries belonging to a request that ran against
/// `url` over the window `[start_hr, end_hr]`.
///
/// Candidates must match the URL exactly, come from an XHR-style initiator,
/// not already be attributed to another span, and fit inside the window.
/// When two candidates remain and the first finishes before the second
/// starts, the first is the CORS preflight and the second the main request.
pub(crate) fn match_resources(
    candidates: &[ResourceEntry],
    url: &str,
    start_hr: f64,
    end_hr: f64,
    used: &UsedEntries,
) -> Option<MatchedResources> {
    let mut eligible: Vec<&ResourceEntry> = candidates
        .iter()
        .filter(|entry| entry.name == url)
        .filter(|entry| entry.initiator_type.is_xhr_like())
        .filter(|entry| !used.contains(entry))
        .filter(|entry| entry.fetch_start >= start_hr && entry.response_end <= end_hr)
        .collect();

    if eligible.is_empty() {
        return None;
    }
    eligible.sort_by(|a, b| {
        a.fetch_start
            .partial_cmp(&b.fetch_start)
            .unwrap_or(Ordering::Equal)
    });

    if eligible.len() >= 2 && eligible[0].response_end <= eligible[1].fetch_start {
        return Some(MatchedResources {
            main: eligible[1].clone(),
            preflight: Some(eligible[0].clone()),
        });
    }
    Some(MatchedResources {
        main: eligible[0].clone(),
        preflight: None,
    })
}

/// Replays an entry's network phases onto `span` as timestamped events.
pub(crate) fn add_network_events<S: Span>(span: &mut S, entry: &ResourceEntry, clock: &dyn Clock) {
    for (name, hr_millis) in entry.network_events() {
        span.add_event_with_timestamp(name, clock.to_system_time(hr_millis), Vec::new());
    }
}
