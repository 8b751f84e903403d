use std::fmt;
use std::string::FromUtf8Error;

/// Token that was being read when the stream ran out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TruncatedStage {
    /// A `NAME=VALUE` line or a bare binary field name
    FieldLine,
    /// The 8-byte length prefix of a binary field
    BinaryLength,
    /// The payload (or its trailing newline) of a binary field
    BinaryPayload,
}

impl fmt::Display for TruncatedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FieldLine => "field line",
            Self::BinaryLength => "binary length",
            Self::BinaryPayload => "binary payload",
        })
    }
}

/// Errors produced while reading a journal export stream
///
/// Every variant is fatal to the stream it came from: once framing is in doubt,
/// later record boundaries cannot be trusted.
#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("journal stream ended inside a {stage} ({buffered} bytes buffered)")]
    TruncatedStream {
        stage: TruncatedStage,
        buffered: usize,
    },

    #[error("journal stream ended inside an unterminated record ({fields} fields read)")]
    IncompleteRecord { fields: usize },

    #[error("field {field} is not valid UTF-8")]
    Decode {
        field: String,
        #[source]
        source: FromUtf8Error,
    },

    #[error("binary field {field} is not followed by a newline")]
    MissingTerminator { field: String },

    #[error("field {field} is {len} bytes, over the {limit} byte limit")]
    FieldTooLarge { field: String, len: u64, limit: usize },

    #[error("failed to read journal stream")]
    Io(#[from] std::io::Error),
}

impl JournalError {
    /// Check if the stream simply stopped early (a resume may succeed)
    pub fn is_truncation(&self) -> bool {
        matches!(
            self,
            Self::TruncatedStream { .. } | Self::IncompleteRecord { .. }
        )
    }
}
