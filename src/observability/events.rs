//! Observable events of the query engine
//!
//! Every event name is stable and upper-snake-cased so log consumers can
//! match on it.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Engine configuration loaded from disk
    ConfigLoaded,

    // Execution
    /// Query execution accepted by the coordinator
    QueryExecuteBegin,
    /// Query execution finished with a result
    QueryExecuteComplete,
    /// Request joined an identical in-flight execution
    QueryDeduplicated,
    /// One pipeline attempt failed and will be retried
    QueryAttemptFailed,
    /// Final attempt failed, error surfaced to the caller
    QueryFailed,

    // Catalog
    /// Property payload fetched and decoded
    PropertyLoaded,
    /// Sort index fetched and decoded
    SortIndexLoaded,
    /// Sort index references records beyond the dataset length
    SortIndexInvalidEntries,
    /// Payload or index creation time disagrees with the loaded snapshot
    DatasetStale,
    /// Loaded data cleared, subsequent fetches bypass caches
    DatasetRefetch,

    // Subsets
    /// Condition references a subset id that doesn't exist
    SubsetMissing,
    /// Subset creation rejected because id or name is taken
    SubsetConflict,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::QueryExecuteBegin => "QUERY_EXECUTE_BEGIN",
            Event::QueryExecuteComplete => "QUERY_EXECUTE_COMPLETE",
            Event::QueryDeduplicated => "QUERY_DEDUPLICATED",
            Event::QueryAttemptFailed => "QUERY_ATTEMPT_FAILED",
            Event::QueryFailed => "QUERY_FAILED",
            Event::PropertyLoaded => "PROPERTY_LOADED",
            Event::SortIndexLoaded => "SORT_INDEX_LOADED",
            Event::SortIndexInvalidEntries => "SORT_INDEX_INVALID_ENTRIES",
            Event::DatasetStale => "DATASET_STALE",
            Event::DatasetRefetch => "DATASET_REFETCH",
            Event::SubsetMissing => "SUBSET_MISSING",
            Event::SubsetConflict => "SUBSET_CONFLICT",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::QueryAttemptFailed
            | Event::DatasetStale
            | Event::DatasetRefetch
            | Event::SortIndexInvalidEntries => Severity::Warn,
            Event::QueryFailed | Event::SubsetMissing | Event::SubsetConflict => Severity::Error,
            Event::PropertyLoaded | Event::SortIndexLoaded => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Event; 13] = [
        Event::ConfigLoaded,
        Event::QueryExecuteBegin,
        Event::QueryExecuteComplete,
        Event::QueryDeduplicated,
        Event::QueryAttemptFailed,
        Event::QueryFailed,
        Event::PropertyLoaded,
        Event::SortIndexLoaded,
        Event::SortIndexInvalidEntries,
        Event::DatasetStale,
        Event::DatasetRefetch,
        Event::SubsetMissing,
        Event::SubsetConflict,
    ];

    #[test]
    fn test_event_names_are_upper_snake() {
        for event in ALL {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::DatasetStale.severity(), Severity::Warn);
        assert_eq!(Event::SubsetMissing.severity(), Severity::Error);
        assert_eq!(Event::QueryExecuteBegin.severity(), Severity::Info);
    }
}
