//! Journal export parsing for journalscope
//!
//! This crate turns a `systemd-journal-gatewayd` export byte stream into
//! formatted log lines: the field decoder, record assembly, line formatting,
//! and the reader that drives them.

mod assembler;
mod decoder;
mod error;
mod formatter;
mod reader;

pub use assembler::RecordAssembler;
pub use decoder::{DEFAULT_MAX_FIELD_BYTES, JournalExportDecoder};
pub use error::{JournalError, TruncatedStage};
pub use formatter::{LineFormatter, TIMESTAMP_PLACEHOLDER};
pub use reader::{JournalLogReader, journal_logs_reader};

// Re-export types used in our public API
pub use journalscope_types::{JournalRecord, JournalToken, LogFormatter};
