use std::time::Duration;

/// Default gateway endpoint serving journal entries
pub const ENTRIES_PATH: &str = "/entries";

/// Selection of entries sent in the `Range` header
///
/// Rendered as `entries=<cursor>:<skip>:<count>`. Without a cursor the gateway
/// positions at the newest entry, so a negative skip walks backwards from there.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntriesRange {
    pub cursor: Option<String>,
    pub skip: i64,
    pub count: Option<u64>,
}

impl EntriesRange {
    /// The last `lines` entries
    pub fn tail(lines: u64) -> Self {
        Self {
            cursor: None,
            skip: -i64::try_from(lines.saturating_sub(1)).unwrap_or(i64::MAX),
            count: Some(lines),
        }
    }

    /// Everything after the entry identified by `cursor`
    pub fn after_cursor(cursor: impl Into<String>) -> Self {
        Self {
            cursor: Some(cursor.into()),
            skip: 1,
            count: None,
        }
    }

    /// Drop the entry limit, e.g. when following
    pub fn unbounded(mut self) -> Self {
        self.count = None;
        self
    }

    /// Header value for `Range`
    pub fn to_header(&self) -> String {
        format!(
            "entries={}:{}:{}",
            self.cursor.as_deref().unwrap_or_default(),
            self.skip,
            self.count.map(|c| c.to_string()).unwrap_or_default()
        )
    }
}

/// A request for journal entries
#[derive(Clone, Debug)]
pub struct EntriesRequest {
    path: String,
    params: Vec<(String, String)>,
    range: Option<EntriesRange>,
    timeout: Option<Duration>,
}

impl EntriesRequest {
    pub fn new() -> Self {
        Self {
            path: ENTRIES_PATH.to_string(),
            params: Vec::new(),
            range: None,
            timeout: None,
        }
    }

    /// Request a different gateway path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Add a query parameter; repeated names are sent repeatedly
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Only return entries whose `field` equals `value`
    pub fn matching(self, field: &str, value: impl Into<String>) -> Self {
        self.param(field, value)
    }

    /// Only return entries from the current boot
    pub fn boot(self) -> Self {
        self.param("boot", "1")
    }

    /// Keep the connection open and stream new entries as they arrive
    pub fn follow(self) -> Self {
        self.param("follow", "1")
    }

    pub fn range(mut self, range: EntriesRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Total time allowed for the request, including reading the body
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn get_path(&self) -> &str {
        &self.path
    }

    pub fn get_params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get_range(&self) -> Option<&EntriesRange> {
        self.range.as_ref()
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for EntriesRequest {
    fn default() -> Self {
        Self::new()
    }
}
