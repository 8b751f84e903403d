use chrono::{DateTime, FixedOffset, Offset, Utc};

use journalscope_types::{
    FIELD_HOSTNAME, FIELD_MESSAGE, FIELD_PID, FIELD_REALTIME_TIMESTAMP, FIELD_SYSLOG_IDENTIFIER,
    JournalRecord, LogFormatter,
};

/// Rendered in place of a missing or unparsable `__REALTIME_TIMESTAMP`
pub const TIMESTAMP_PLACEHOLDER: &str = "0000-00-00 00:00:00.000";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Renders journal records as single output lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineFormatter {
    mode: LogFormatter,
    offset: FixedOffset,
}

impl LineFormatter {
    /// Create a formatter that renders timestamps in UTC
    pub fn new(mode: LogFormatter) -> Self {
        Self {
            mode,
            offset: Utc.fix(),
        }
    }

    /// Render timestamps in a fixed offset instead of UTC
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn mode(&self) -> LogFormatter {
        self.mode
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Format one record. Missing fields render as empty text, never as an error.
    pub fn format(&self, record: &JournalRecord) -> String {
        match self.mode {
            LogFormatter::Simple => record.get_or_empty(FIELD_MESSAGE).to_string(),
            LogFormatter::Verbose => self.format_verbose(record),
        }
    }

    fn format_verbose(&self, record: &JournalRecord) -> String {
        format!(
            "{} {} {}[{}]: {}",
            self.format_timestamp(record.get(FIELD_REALTIME_TIMESTAMP)),
            record.get_or_empty(FIELD_HOSTNAME),
            record.get_or_empty(FIELD_SYSLOG_IDENTIFIER),
            record.get_or_empty(FIELD_PID),
            record.get_or_empty(FIELD_MESSAGE),
        )
    }

    /// Render microseconds since the epoch, falling back to the placeholder
    fn format_timestamp(&self, raw: Option<&str>) -> String {
        raw.and_then(|micros| micros.parse::<i64>().ok())
            .and_then(DateTime::<Utc>::from_timestamp_micros)
            .map(|ts| {
                ts.with_timezone(&self.offset)
                    .format(TIMESTAMP_FORMAT)
                    .to_string()
            })
            .unwrap_or_else(|| TIMESTAMP_PLACEHOLDER.to_string())
    }
}

impl Default for LineFormatter {
    fn default() -> Self {
        Self::new(LogFormatter::default())
    }
}

impl From<LogFormatter> for LineFormatter {
    fn from(mode: LogFormatter) -> Self {
        Self::new(mode)
    }
}
