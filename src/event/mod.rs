//! Event Module - the shared trace (v0.1)
//!
//! Key types:
//! - `Event`: envelope with id + timestamp + attribution + entry
//! - `EventLog`: thread-safe, append-only, optionally bounded log
//! - `LogView`: read-only capability for displays (plus `clear`)
//! - `LogSink` / `NoopSink`: write-side abstraction for dependency injection
//! - `LogWriter`: write-only capability handed to producers

mod log;
mod sink;

pub use log::{Attribution, Event, EventLog, LogConfig, LogView};
pub use sink::{LogSink, LogWriter, NoopSink};
