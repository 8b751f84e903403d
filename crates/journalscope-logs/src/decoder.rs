use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use journalscope_types::JournalToken;

use crate::error::{JournalError, TruncatedStage};

const NEWLINE: u8 = b'\n';
const SEPARATOR: u8 = b'=';
const LENGTH_PREFIX_BYTES: usize = 8;

/// Largest text line or binary payload accepted for a single field (64 MiB)
pub const DEFAULT_MAX_FIELD_BYTES: usize = 64 * 1024 * 1024;

/// Longest field name prefix quoted in errors about unterminated lines
const NAME_PREVIEW_BYTES: usize = 64;

#[derive(Debug)]
enum DecodeState {
    /// Waiting for a full line: `NAME=VALUE`, a bare `NAME`, or a blank boundary
    Line,
    /// Bare name seen, waiting for the little-endian length prefix
    Length { name: String },
    /// Length known, waiting for `len` payload bytes plus the trailing newline
    Payload { name: String, len: usize },
}

/// Incremental decoder for the journal export format
///
/// Yields one [`JournalToken`] per field or blank line. A binary payload is only
/// consumed once all of its declared bytes are buffered, so newlines inside it never
/// reach the line scanner.
#[derive(Debug)]
pub struct JournalExportDecoder {
    state: DecodeState,
    /// Bytes at the front of the buffer already searched for a newline
    scanned: usize,
    max_field_bytes: usize,
}

impl JournalExportDecoder {
    pub fn new() -> Self {
        Self::with_max_field_bytes(DEFAULT_MAX_FIELD_BYTES)
    }

    /// Create a decoder that rejects fields larger than `limit` bytes
    pub fn with_max_field_bytes(limit: usize) -> Self {
        Self {
            state: DecodeState::Line,
            scanned: 0,
            max_field_bytes: limit,
        }
    }

    pub fn max_field_bytes(&self) -> usize {
        self.max_field_bytes
    }

    fn decode_line(&mut self, src: &mut BytesMut) -> Result<Option<JournalToken>, JournalError> {
        let Some(offset) = src[self.scanned..].iter().position(|b| *b == NEWLINE) else {
            self.scanned = src.len();
            if src.len() > self.max_field_bytes {
                return Err(JournalError::FieldTooLarge {
                    field: name_preview(src),
                    len: src.len() as u64,
                    limit: self.max_field_bytes,
                });
            }
            return Ok(None);
        };

        let pos = self.scanned + offset;
        self.scanned = 0;

        let mut line = src.split_to(pos + 1);
        line.truncate(pos);

        if line.is_empty() {
            return Ok(Some(JournalToken::RecordBoundary));
        }
        if line.len() > self.max_field_bytes {
            return Err(JournalError::FieldTooLarge {
                field: name_preview(&line),
                len: line.len() as u64,
                limit: self.max_field_bytes,
            });
        }

        match line.iter().position(|b| *b == SEPARATOR) {
            Some(eq) => {
                let value = line.split_off(eq + 1);
                line.truncate(eq);
                let name = decode_name(&line)?;
                let value = decode_value(&name, &value)?;
                Ok(Some(JournalToken::Field { name, value }))
            }
            None => {
                self.state = DecodeState::Length {
                    name: decode_name(&line)?,
                };
                Ok(None)
            }
        }
    }
}

impl Default for JournalExportDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for JournalExportDecoder {
    type Item = JournalToken;
    type Error = JournalError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match std::mem::replace(&mut self.state, DecodeState::Line) {
                DecodeState::Line => {
                    if let Some(token) = self.decode_line(src)? {
                        return Ok(Some(token));
                    }
                    // A bare name moves us on to the length prefix; otherwise wait
                    if matches!(self.state, DecodeState::Line) {
                        return Ok(None);
                    }
                }
                DecodeState::Length { name } => {
                    if src.len() < LENGTH_PREFIX_BYTES {
                        self.state = DecodeState::Length { name };
                        return Ok(None);
                    }
                    let declared = src.get_u64_le();
                    // The payload plus its newline must fit in a usize
                    let len = usize::try_from(declared)
                        .ok()
                        .filter(|len| *len <= self.max_field_bytes && *len < usize::MAX)
                        .ok_or_else(|| JournalError::FieldTooLarge {
                            field: name.clone(),
                            len: declared,
                            limit: self.max_field_bytes,
                        })?;
                    self.state = DecodeState::Payload { name, len };
                }
                DecodeState::Payload { name, len } => {
                    let needed = len + 1;
                    if src.len() < needed {
                        src.reserve(needed - src.len());
                        self.state = DecodeState::Payload { name, len };
                        return Ok(None);
                    }
                    let payload = src.split_to(len);
                    if src.get_u8() != NEWLINE {
                        return Err(JournalError::MissingTerminator { field: name });
                    }
                    let value = decode_value(&name, &payload)?;
                    return Ok(Some(JournalToken::Field { name, value }));
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(token) = self.decode(src)? {
            return Ok(Some(token));
        }

        let stage = match self.state {
            DecodeState::Line if src.is_empty() => return Ok(None),
            DecodeState::Line => TruncatedStage::FieldLine,
            DecodeState::Length { .. } => TruncatedStage::BinaryLength,
            DecodeState::Payload { .. } => TruncatedStage::BinaryPayload,
        };
        Err(JournalError::TruncatedStream {
            stage,
            buffered: src.len(),
        })
    }
}

fn decode_name(raw: &[u8]) -> Result<String, JournalError> {
    String::from_utf8(raw.to_vec()).map_err(|source| JournalError::Decode {
        field: String::from_utf8_lossy(raw).into_owned(),
        source,
    })
}

fn decode_value(name: &str, raw: &[u8]) -> Result<String, JournalError> {
    String::from_utf8(raw.to_vec()).map_err(|source| JournalError::Decode {
        field: name.to_string(),
        source,
    })
}

/// Best-effort field name for a line that has not been fully split yet
fn name_preview(raw: &[u8]) -> String {
    let end = raw
        .iter()
        .take(NAME_PREVIEW_BYTES)
        .position(|b| *b == SEPARATOR)
        .unwrap_or_else(|| raw.len().min(NAME_PREVIEW_BYTES));
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
