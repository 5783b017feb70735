//! Structured logging for Lectern.
//!
//! Console + rolling NDJSON file output, and the bootstrap event log.

pub mod event_logger;
pub mod logger;

pub use event_logger::{BootEvent, BootEventLogger, BootLogEntry, BOOT_EVENTS_TARGET};
pub use logger::{init_console_logger, init_logger, LOG_FILE_PREFIX};
