//! Observability for the write path
//!
//! Structured JSON logging with a typed event vocabulary. Logging is
//! synchronous, unbuffered, and read-only with respect to store state: a
//! log call never changes the outcome of the operation it describes.

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event with fields at its default severity.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
