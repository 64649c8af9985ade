//! Log ingestion for logcascade
//!
//! This crate provides record parsing, batched streaming from line sources,
//! and a bounded record buffer.

mod buffer;
mod parser;
mod stream;

pub use buffer::{LevelCounts, RecordBuffer};
pub use parser::{ROOT_LOGGER, RecordParser};
pub use stream::{BatchOptions, RecordStream};

// Re-export types used in our public API
pub use logcascade_types::{Level, LogRecord};
