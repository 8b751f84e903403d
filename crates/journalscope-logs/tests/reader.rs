use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use bytes::Bytes;
use chrono::FixedOffset;
use futures::{StreamExt, TryStreamExt, stream};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::io::StreamReader;

use journalscope_logs::{
    JournalError, JournalLogReader, LineFormatter, LogFormatter, TruncatedStage,
    journal_logs_reader,
};

const FIXTURE: &[u8] = include_bytes!("fixtures/logs_export_host.txt");

/// Serve `input` in chunks of `size` bytes, the way a network body arrives
fn chunked(input: &[u8], size: usize) -> impl AsyncRead + Unpin {
    let chunks: Vec<io::Result<Bytes>> = input
        .chunks(size)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    StreamReader::new(stream::iter(chunks))
}

fn binary_field(name: &str, payload: &[u8]) -> Vec<u8> {
    let mut raw = format!("{name}\n").into_bytes();
    raw.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    raw.extend_from_slice(payload);
    raw.push(b'\n');
    raw
}

/// Source that records when it is dropped
struct TrackedSource<R> {
    inner: R,
    released: Arc<AtomicBool>,
}

impl<R: AsyncRead + Unpin> AsyncRead for TrackedSource<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl<R> Drop for TrackedSource<R> {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_format_simple() {
    let mut reader =
        journal_logs_reader(&b"MESSAGE=Hello, world!\n\n"[..], LogFormatter::default());
    assert_eq!(reader.next().await.unwrap().unwrap(), "Hello, world!");
}

#[tokio::test]
async fn test_format_verbose() {
    let input = b"__REALTIME_TIMESTAMP=1379403171000000\n\
                  _HOSTNAME=homeassistant\n\
                  SYSLOG_IDENTIFIER=python\n\
                  _PID=666\n\
                  MESSAGE=Hello, world!\n\n";
    let cest = FixedOffset::east_opt(2 * 3600).unwrap();
    let formatter = LineFormatter::new(LogFormatter::Verbose).with_offset(cest);

    let mut reader = journal_logs_reader(&input[..], formatter);
    assert_eq!(
        reader.next().await.unwrap().unwrap(),
        "2013-09-17 09:32:51.000 homeassistant python[666]: Hello, world!"
    );

    let mut reader = journal_logs_reader(&input[..], LogFormatter::Verbose);
    assert_eq!(
        reader.next().await.unwrap().unwrap(),
        "2013-09-17 07:32:51.000 homeassistant python[666]: Hello, world!"
    );
}

#[tokio::test]
async fn test_binary_message() {
    let input = b"ID=1\n\
                  MESSAGE\n\x0d\x00\x00\x00\x00\x00\x00\x00Hello,\nworld!\n\
                  AFTER=after\n\n";
    let mut reader = journal_logs_reader(&input[..], LogFormatter::Simple);
    assert_eq!(reader.next().await.unwrap().unwrap(), "Hello,\nworld!");
    assert!(reader.next().await.is_none());
}

#[tokio::test]
async fn test_two_messages() {
    let input = b"MESSAGE=Hello, world!\n\
                  ID=1\n\n\
                  MESSAGE=Hello again, world!\n\
                  ID=2\n\n";
    let lines: Vec<String> = journal_logs_reader(&input[..], LogFormatter::Simple)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(lines, vec!["Hello, world!", "Hello again, world!"]);
}

#[tokio::test]
async fn test_spurious_blank_lines_skipped() {
    let input = b"\n\nMESSAGE=first\n\n\n\nMESSAGE=second\n\n";
    let lines: Vec<String> = journal_logs_reader(&input[..], LogFormatter::Simple)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(lines, vec!["first", "second"]);
}

#[tokio::test]
async fn test_one_byte_chunks() {
    let mut input = b"ID=1\n".to_vec();
    input.extend(binary_field("MESSAGE", b"multi\n\nline"));
    input.extend_from_slice(b"\nMESSAGE=next\n\n");

    let lines: Vec<String> = journal_logs_reader(chunked(&input, 1), LogFormatter::Simple)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(lines, vec!["multi\n\nline", "next"]);
}

#[tokio::test]
async fn test_fixture() {
    let mut reader = journal_logs_reader(FIXTURE, LogFormatter::Simple);
    assert_eq!(
        reader.next().await.unwrap().unwrap(),
        "Started Hostname Service."
    );
}

#[tokio::test]
async fn test_fixture_verbose_chunked() {
    let lines: Vec<String> = journal_logs_reader(chunked(FIXTURE, 7), LogFormatter::Verbose)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(
        lines,
        vec![
            "2023-06-22 08:29:40.203 homeassistant systemd[1]: Started Hostname Service.",
            "2023-06-22 08:29:40.210 homeassistant systemd-hostnamed[3410]: Hostname set to <homeassistant> (static)",
        ]
    );
}

#[tokio::test]
async fn test_truncated_length_prefix() {
    let input = b"MESSAGE=complete\n\nID=2\nMESSAGE\n\x0d\x00\x00";
    let mut reader = journal_logs_reader(chunked(input, 4), LogFormatter::Simple);

    assert_eq!(reader.next().await.unwrap().unwrap(), "complete");
    match reader.next().await {
        Some(Err(JournalError::TruncatedStream { stage, buffered })) => {
            assert_eq!(stage, TruncatedStage::BinaryLength);
            assert_eq!(buffered, 3);
        }
        other => panic!("expected truncation, got {other:?}"),
    }
    assert!(reader.next().await.is_none());
    assert_eq!(reader.records_read(), 1);
}

#[tokio::test]
async fn test_unterminated_record() {
    let mut reader = journal_logs_reader(&b"MESSAGE=no boundary\n"[..], LogFormatter::Simple);
    let err = reader.next().await.unwrap().unwrap_err();
    assert!(matches!(err, JournalError::IncompleteRecord { fields: 1 }));
    assert!(err.is_truncation());
}

#[tokio::test]
async fn test_invalid_utf8_payload() {
    let mut input = binary_field("MESSAGE", &[b'o', b'k', 0xc3]);
    input.push(b'\n');
    let mut reader = journal_logs_reader(&input[..], LogFormatter::Simple);
    match reader.next().await {
        Some(Err(JournalError::Decode { field, .. })) => assert_eq!(field, "MESSAGE"),
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_source_error_propagates() {
    let chunks: Vec<io::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"MESSAGE=one\n\n")),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
    ];
    let mut reader =
        journal_logs_reader(StreamReader::new(stream::iter(chunks)), LogFormatter::Simple);
    assert_eq!(reader.next().await.unwrap().unwrap(), "one");
    assert!(matches!(
        reader.next().await,
        Some(Err(JournalError::Io(_)))
    ));
}

#[tokio::test]
async fn test_early_drop_releases_source() {
    let released = Arc::new(AtomicBool::new(false));
    let source = TrackedSource {
        inner: chunked(FIXTURE, 64),
        released: Arc::clone(&released),
    };

    let mut reader = JournalLogReader::new(source, LogFormatter::Simple);
    let first = reader.next().await.unwrap().unwrap();
    assert_eq!(first, "Started Hostname Service.");
    assert!(!released.load(Ordering::SeqCst));

    drop(reader);
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_take_stops_consuming() {
    let released = Arc::new(AtomicBool::new(false));
    let source = TrackedSource {
        inner: chunked(FIXTURE, 16),
        released: Arc::clone(&released),
    };

    let lines: Vec<String> = JournalLogReader::new(source, LogFormatter::Simple)
        .take(1)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(lines, vec!["Started Hostname Service."]);
    assert!(released.load(Ordering::SeqCst));
}
