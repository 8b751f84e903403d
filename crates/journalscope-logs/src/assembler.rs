use journalscope_types::{JournalRecord, JournalToken};

use crate::error::JournalError;

/// Collects field tokens into complete records
#[derive(Debug, Default)]
pub struct RecordAssembler {
    current: JournalRecord,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one token, returning a record when a boundary completes it
    pub fn push(&mut self, token: JournalToken) -> Option<JournalRecord> {
        match token {
            JournalToken::Field { name, value } => {
                self.current.insert(name, value);
                None
            }
            // Blank line with nothing pending
            JournalToken::RecordBoundary if self.current.is_empty() => None,
            JournalToken::RecordBoundary => Some(std::mem::take(&mut self.current)),
        }
    }

    /// Number of fields collected for the record in progress
    pub fn pending_fields(&self) -> usize {
        self.current.len()
    }

    /// Check the end of the stream; a record must be closed by a blank line
    pub fn finish(&mut self) -> Result<(), JournalError> {
        let pending = std::mem::take(&mut self.current);
        if pending.is_empty() {
            Ok(())
        } else {
            Err(JournalError::IncompleteRecord {
                fields: pending.len(),
            })
        }
    }
}
