//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Monotonic counters
//! - Begin/complete scopes around coordinator work
//!
//! Observability is read-only: nothing logged or counted here feeds back into
//! query results.
//!
//! ```ignore
//! use cardquery::observability::{log_event, Event, Logger};
//!
//! Logger::info("QUERY_EXECUTE_BEGIN", &[("hash", "ab12...")]);
//! log_event(Event::DatasetStale, &[("prop", "name")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Log a typed event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
