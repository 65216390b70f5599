//! Observability
//!
//! Structured logging through `tracing`. Every line names its [`Event`] in an
//! `event` field so logs can be filtered by lifecycle step. Raw tokens and
//! account keys are never logged.
//!
//! # Usage
//!
//! ```ignore
//! use recordfiles::observability::{init_logging, Event, LogFormat};
//!
//! init_logging(LogFormat::Json);
//! tracing::info!(event = Event::ConfigLoaded.as_str(), tables = 2);
//! ```

#[cfg(test)]
pub(crate) mod capture;
mod events;
mod logger;

pub use events::Event;
pub use logger::{init_logging, LogFormat};
