//! Journal gateway client for journalscope
//!
//! This crate fetches entries from `systemd-journal-gatewayd` and hands the
//! response body to the journal export reader.

mod client;
mod request;

pub use client::{DEFAULT_GATEWAY_URL, EntriesBody, GatewayClient};
pub use request::{ENTRIES_PATH, EntriesRange, EntriesRequest};

// Re-export types that are used in our public API
pub use journalscope_logs::{JournalError, JournalLogReader, LineFormatter, LogFormatter};
