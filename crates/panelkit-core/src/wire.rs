use crate::{NewsSnapshot, ResearchSnapshot, TechnologyId};
use serde::de::{self, DeserializeOwned, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

pub const DEFAULT_MAX_FRAME_BYTES: usize = 256 * 1024;
pub const CURRENT_PROTOCOL_VERSION: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtocolVersion(pub u16);

impl ProtocolVersion {
    pub const CURRENT: Self = Self(CURRENT_PROTOCOL_VERSION);
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl Serialize for ProtocolVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u16(self.0)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;

        impl<'de> Visitor<'de> for VersionVisitor {
            type Value = ProtocolVersion;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a protocol version as integer or string")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                u16::try_from(value)
                    .map(ProtocolVersion)
                    .map_err(|_| E::custom(format!("protocol version out of range: {value}")))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                let unsigned = u64::try_from(value)
                    .map_err(|_| E::custom(format!("negative protocol version: {value}")))?;
                self.visit_u64(unsigned)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                value
                    .trim()
                    .trim_start_matches('v')
                    .parse::<u16>()
                    .map(ProtocolVersion)
                    .map_err(|err| E::custom(format!("invalid protocol version '{value}': {err}")))
            }
        }

        deserializer.deserialize_any(VersionVisitor)
    }
}

/// A message addressed to or from one panel instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PanelEnvelope<M> {
    #[serde(default)]
    pub version: ProtocolVersion,
    pub panel_id: String,
    #[serde(flatten)]
    pub msg: M,
}

impl<M> PanelEnvelope<M> {
    pub fn new(panel_id: impl Into<String>, msg: M) -> Self {
        Self {
            version: ProtocolVersion::CURRENT,
            panel_id: panel_id.into(),
            msg,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmitEntry {
    pub name: String,
    pub body: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteEntry {
    pub index: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectEntry {
    pub key: TechnologyId,
}

/// Fire-and-forget action requests sent to the simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum OutboundRequest {
    RequestInitialState,
    SubmitEntry(SubmitEntry),
    DeleteEntry(DeleteEntry),
    SelectEntry(SelectEntry),
    OpenServerMenu,
}

impl OutboundRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestInitialState => "request_initial_state",
            Self::SubmitEntry(_) => "submit_entry",
            Self::DeleteEntry(_) => "delete_entry",
            Self::SelectEntry(_) => "select_entry",
            Self::OpenServerMenu => "open_server_menu",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InboundMsg {
    NewsSnapshot(NewsSnapshot),
    ResearchSnapshot(ResearchSnapshot),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame exceeds max size: {size} > {max}")]
    OversizedFrame { size: usize, max: usize },
    #[error("unterminated input exceeds max size: {size} > {max}")]
    OversizedBuffer { size: usize, max: usize },
    #[error("frame encode failed: {0}")]
    Encode(String),
    #[error("frame decode failed: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub struct DecodeReport<T> {
    pub frames: Vec<T>,
    pub errors: Vec<FrameError>,
}

impl<T> Default for DecodeReport<T> {
    fn default() -> Self {
        Self {
            frames: Vec::new(),
            errors: Vec::new(),
        }
    }
}

impl<T> DecodeReport<T> {
    fn record(&mut self, outcome: Result<T, FrameError>) {
        match outcome {
            Ok(frame) => self.frames.push(frame),
            Err(err) => self.errors.push(err),
        }
    }
}

/// Serializes `value` as one newline-terminated JSON line.
pub fn encode_frame<T: Serialize>(value: &T, max_frame_bytes: usize) -> Result<Vec<u8>, FrameError> {
    let mut line = serde_json::to_vec(value).map_err(|err| FrameError::Encode(err.to_string()))?;
    if line.len() > max_frame_bytes {
        return Err(FrameError::OversizedFrame {
            size: line.len(),
            max: max_frame_bytes,
        });
    }
    line.push(b'\n');
    Ok(line)
}

pub fn decode_frame<T: DeserializeOwned>(bytes: &[u8], max_frame_bytes: usize) -> Result<T, FrameError> {
    decode_line(strip_line_ending(bytes), max_frame_bytes)
}

fn strip_line_ending(mut line: &[u8]) -> &[u8] {
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    line
}

fn decode_line<T: DeserializeOwned>(line: &[u8], max_frame_bytes: usize) -> Result<T, FrameError> {
    if line.len() > max_frame_bytes {
        return Err(FrameError::OversizedFrame {
            size: line.len(),
            max: max_frame_bytes,
        });
    }
    serde_json::from_slice(line).map_err(|err| FrameError::Decode(err.to_string()))
}

/// Incremental NDJSON decoder. A bad line is reported and skipped; the
/// lines after it still decode.
pub struct LineDecoder<T> {
    max_frame_bytes: usize,
    pending: Vec<u8>,
    marker: PhantomData<T>,
}

impl<T> LineDecoder<T> {
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            max_frame_bytes,
            pending: Vec::new(),
            marker: PhantomData,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl<T> Default for LineDecoder<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl<T: DeserializeOwned> LineDecoder<T> {
    pub fn push_chunk(&mut self, chunk: &[u8]) -> DecodeReport<T> {
        let mut report = DecodeReport::default();
        self.pending.extend_from_slice(chunk);

        let mut consumed = 0;
        while let Some(offset) = self.pending[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset + 1;
            let line = strip_line_ending(&self.pending[consumed..end]);
            if !line.is_empty() {
                report.record(decode_line(line, self.max_frame_bytes));
            }
            consumed = end;
        }
        self.pending.drain(..consumed);

        if self.pending.len() > self.max_frame_bytes {
            report.errors.push(FrameError::OversizedBuffer {
                size: self.pending.len(),
                max: self.max_frame_bytes,
            });
            self.pending.clear();
        }

        report
    }

    /// Decodes whatever is left once the stream ends without a final newline.
    pub fn finish(&mut self) -> DecodeReport<T> {
        let mut report = DecodeReport::default();
        let rest = std::mem::take(&mut self.pending);
        let line = strip_line_ending(&rest);
        if !line.is_empty() {
            report.record(decode_line(line, self.max_frame_bytes));
        }
        report
    }
}
