use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::{Stream, StreamExt};
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, warn};

use journalscope_types::JournalRecord;

use crate::assembler::RecordAssembler;
use crate::decoder::JournalExportDecoder;
use crate::error::JournalError;
use crate::formatter::LineFormatter;

/// Reads a journal export stream and yields one formatted line per record
///
/// The reader owns its source. Dropping it, whether the stream was exhausted or
/// abandoned part way, drops the source and releases whatever it holds.
pub struct JournalLogReader<R> {
    /// Framed source producing field tokens
    frames: FramedRead<R, JournalExportDecoder>,

    /// Record in progress
    assembler: RecordAssembler,

    /// Output line shape
    formatter: LineFormatter,

    /// Records completed so far
    records: u64,

    /// Cursor of the last completed record, for resuming
    last_cursor: Option<String>,

    /// Set once the source ended or an error was returned
    done: bool,
}

impl<R: AsyncRead + Unpin> JournalLogReader<R> {
    /// Create a reader over `source` with the default field size limit
    pub fn new(source: R, formatter: impl Into<LineFormatter>) -> Self {
        Self::with_decoder(source, JournalExportDecoder::new(), formatter)
    }

    /// Create a reader with a custom configured decoder
    pub fn with_decoder(
        source: R,
        decoder: JournalExportDecoder,
        formatter: impl Into<LineFormatter>,
    ) -> Self {
        Self {
            frames: FramedRead::new(source, decoder),
            assembler: RecordAssembler::new(),
            formatter: formatter.into(),
            records: 0,
            last_cursor: None,
            done: false,
        }
    }

    /// Wait for the next complete record without formatting it
    pub async fn next_record(&mut self) -> Option<Result<JournalRecord, JournalError>> {
        std::future::poll_fn(|cx| self.poll_next_record(cx)).await
    }

    fn poll_next_record(
        &mut self,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<JournalRecord, JournalError>>> {
        if self.done {
            return Poll::Ready(None);
        }

        loop {
            match ready!(self.frames.poll_next_unpin(cx)) {
                Some(Ok(token)) => {
                    if let Some(record) = self.assembler.push(token) {
                        self.records += 1;
                        if let Some(cursor) = record.cursor() {
                            self.last_cursor = Some(cursor.to_string());
                        }
                        debug!(
                            fields = record.len(),
                            records = self.records,
                            "journal record complete"
                        );
                        return Poll::Ready(Some(Ok(record)));
                    }
                }
                Some(Err(err)) => {
                    self.done = true;
                    warn!(error = %err, records = self.records, "journal stream failed");
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    self.done = true;
                    return Poll::Ready(match self.assembler.finish() {
                        Ok(()) => {
                            debug!(records = self.records, "journal stream finished");
                            None
                        }
                        Err(err) => {
                            warn!(error = %err, records = self.records, "journal stream failed");
                            Some(Err(err))
                        }
                    });
                }
            }
        }
    }
}

impl<R> JournalLogReader<R> {
    /// Number of records read so far
    pub fn records_read(&self) -> u64 {
        self.records
    }

    /// `__CURSOR` of the most recent record that carried one
    pub fn last_cursor(&self) -> Option<&str> {
        self.last_cursor.as_deref()
    }

    pub fn formatter(&self) -> &LineFormatter {
        &self.formatter
    }

    /// Check if the stream has ended (cleanly or with an error)
    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// Stop reading and hand back the source
    pub fn into_inner(self) -> R {
        self.frames.into_inner()
    }
}

impl<R: AsyncRead + Unpin> Stream for JournalLogReader<R> {
    type Item = Result<String, JournalError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        this.poll_next_record(cx)
            .map(|next| next.map(|record| record.map(|r| this.formatter.format(&r))))
    }
}

/// Read formatted log lines from a journal export byte stream
pub fn journal_logs_reader<R: AsyncRead + Unpin>(
    source: R,
    formatter: impl Into<LineFormatter>,
) -> JournalLogReader<R> {
    JournalLogReader::new(source, formatter)
}
