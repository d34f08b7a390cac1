//! Frame inspection and report output.
//!
//! [`Inspector`] turns raw frame bytes into a [`FrameReport`]; a
//! [`ReportSink`] writes reports somewhere.  Decode failures are data, not
//! errors: every input frame yields exactly one report.

use std::fmt;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, warn};
use vwire_core::protocol::{decode_packet, read_frame_prefix, CodecError, MessageRegistry};
use vwire_core::Message;

use crate::config::{InspectSettings, OutputFormat};
use crate::error::InspectError;
use crate::hex::to_hex;

// ── Report types ──────────────────────────────────────────────────────────────

/// The result of inspecting one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    /// Where the frame came from: a peer address, `line N`, or `--hex #N`.
    pub source: String,
    /// Frame length in bytes.
    pub length: usize,
    #[serde(flatten)]
    pub outcome: FrameOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FrameOutcome {
    /// The frame decoded to a registered message.
    Decoded {
        flags: String,
        sequence: u32,
        id: String,
        name: &'static str,
        /// Bytes the decoder consumed.
        consumed: usize,
        /// Bytes after the message that were not consumed.
        trailing: usize,
        message: Message,
    },
    /// The header parsed but the identifier is not registered.
    Unknown {
        flags: String,
        sequence: u32,
        id: String,
        body_len: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        body_hex: Option<String>,
    },
    /// The frame could not be decoded.
    Failed { error: String },
}

impl fmt::Display for FrameReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} bytes", self.source, self.length)?;
        match &self.outcome {
            FrameOutcome::Decoded {
                flags,
                sequence,
                id,
                name,
                trailing,
                message,
                ..
            } => {
                write!(f, " seq={sequence} flags={flags} [{id}] {name}")?;
                if *trailing > 0 {
                    write!(f, " (+{trailing} trailing)")?;
                }
                write!(f, " {message:?}")
            }
            FrameOutcome::Unknown {
                flags,
                sequence,
                id,
                body_len,
                body_hex,
            } => {
                write!(
                    f,
                    " seq={sequence} flags={flags} [{id}] <unregistered> body={body_len} bytes"
                )?;
                match body_hex {
                    Some(hex) => write!(f, " {hex}"),
                    None => Ok(()),
                }
            }
            FrameOutcome::Failed { error } => write!(f, " error: {error}"),
        }
    }
}

// ── Sinks ─────────────────────────────────────────────────────────────────────

/// Destination for frame reports.
#[cfg_attr(test, mockall::automock)]
pub trait ReportSink {
    /// Writes one report.
    ///
    /// # Errors
    ///
    /// Returns [`InspectError`] if the underlying output fails.
    fn emit(&mut self, report: &FrameReport) -> Result<(), InspectError>;
}

/// Writes reports to any [`Write`] as text lines or JSON lines.
pub struct WriterSink<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn emit(&mut self, report: &FrameReport) -> Result<(), InspectError> {
        match self.format {
            OutputFormat::Text => writeln!(self.writer, "{report}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.writer, report)?;
                self.writer.write_all(b"\n")?;
            }
        }
        // Listen mode prints as frames arrive.
        self.writer.flush()?;
        Ok(())
    }
}

// ── Inspector ─────────────────────────────────────────────────────────────────

/// Decodes frames against a registry and builds reports.
#[derive(Debug, Clone)]
pub struct Inspector<'r> {
    registry: &'r MessageRegistry,
    hex_dump_unknown: bool,
    max_frame_size: usize,
}

impl<'r> Inspector<'r> {
    pub fn new(registry: &'r MessageRegistry, settings: &InspectSettings) -> Self {
        Self {
            registry,
            hex_dump_unknown: settings.hex_dump_unknown,
            max_frame_size: settings.max_frame_size,
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Inspects one frame.
    pub fn inspect(&self, source: impl Into<String>, bytes: &[u8]) -> FrameReport {
        let source = source.into();
        let outcome = self.outcome(bytes);
        if let FrameOutcome::Failed { error } = &outcome {
            warn!("{source}: {error}");
        }
        FrameReport {
            source,
            length: bytes.len(),
            outcome,
        }
    }

    fn outcome(&self, bytes: &[u8]) -> FrameOutcome {
        if bytes.len() > self.max_frame_size {
            return FrameOutcome::Failed {
                error: format!(
                    "frame exceeds max_frame_size ({} > {})",
                    bytes.len(),
                    self.max_frame_size
                ),
            };
        }

        match decode_packet(self.registry, bytes) {
            Ok((packet, consumed)) => FrameOutcome::Decoded {
                flags: packet.header.flags.to_string(),
                sequence: packet.header.sequence,
                id: packet.message.id().to_string(),
                name: packet.message.name(),
                consumed,
                trailing: bytes.len() - consumed,
                message: packet.message,
            },
            Err(CodecError::UnknownMessage { id }) => match read_frame_prefix(bytes, 0, bytes.len()) {
                Ok(prefix) => {
                    debug!("unregistered message {id}");
                    let body = &bytes[prefix.body_offset..];
                    FrameOutcome::Unknown {
                        flags: prefix.header.flags.to_string(),
                        sequence: prefix.header.sequence,
                        id: prefix.id.to_string(),
                        body_len: body.len(),
                        body_hex: self.hex_dump_unknown.then(|| to_hex(body)),
                    }
                }
                Err(e) => FrameOutcome::Failed { error: e.to_string() },
            },
            Err(e) => FrameOutcome::Failed { error: e.to_string() },
        }
    }
}

// ── Batch ─────────────────────────────────────────────────────────────────────

/// Per-outcome frame counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub decoded: usize,
    pub unknown: usize,
    pub failed: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: &FrameOutcome) {
        match outcome {
            FrameOutcome::Decoded { .. } => self.decoded += 1,
            FrameOutcome::Unknown { .. } => self.unknown += 1,
            FrameOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.decoded + self.unknown + self.failed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames: {} decoded, {} unregistered, {} failed",
            self.total(),
            self.decoded,
            self.unknown,
            self.failed
        )
    }
}

/// Inspects every `(source, bytes)` frame in order and emits its report.
///
/// # Errors
///
/// Stops at the first sink error.
pub fn run_batch<I, S>(inspector: &Inspector<'_>, frames: I, sink: &mut S) -> Result<Summary, InspectError>
where
    I: IntoIterator<Item = (String, Vec<u8>)>,
    S: ReportSink + ?Sized,
{
    let mut summary = Summary::default();
    for (source, bytes) in frames {
        let report = inspector.inspect(source, &bytes);
        summary.record(&report.outcome);
        sink.emit(&report)?;
    }
    Ok(summary)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use vwire_core::protocol::messages::{
        ChatAudible, ChatFromSimulatorMessage, ChatSourceType, ChatType, CompletePingCheckMessage,
    };
    use vwire_core::{default_registry, encode_packet, Packet, PacketFlags, PacketHeader, Vector3};

    fn inspector(registry: &MessageRegistry) -> Inspector<'_> {
        Inspector::new(registry, &InspectSettings::default())
    }

    /// `[flags][seq 7][extra_len 0][High 2][ping_id 3]`
    const PING_FRAME: [u8; 8] = [0x00, 0x07, 0x00, 0x00, 0x00, 0x00, 0x02, 0x03];

    #[test]
    fn test_registered_frame_is_decoded() {
        // Arrange
        let registry = default_registry();

        // Act
        let report = inspector(registry).inspect("line 1", &PING_FRAME);

        // Assert
        assert_eq!(report.length, 8);
        assert_eq!(
            report.outcome,
            FrameOutcome::Decoded {
                flags: "-".to_string(),
                sequence: 7,
                id: "High 2".to_string(),
                name: "CompletePingCheck",
                consumed: 8,
                trailing: 0,
                message: CompletePingCheckMessage { ping_id: 3 }.into(),
            }
        );
    }

    #[test]
    fn test_trailing_bytes_are_counted() {
        let mut frame = PING_FRAME.to_vec();
        frame.extend_from_slice(&[0xAA, 0xBB]);

        let report = inspector(default_registry()).inspect("x", &frame);

        match report.outcome {
            FrameOutcome::Decoded { consumed, trailing, .. } => {
                assert_eq!(consumed, 8);
                assert_eq!(trailing, 2);
            }
            other => panic!("expected Decoded, got {other:?}"),
        }
    }

    #[test]
    fn test_unregistered_frame_reports_body_hex() {
        // Arrange: Medium 0x63 is not a built-in message.
        let frame = [0x40, 0x01, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x63, 0xDE, 0xAD];

        // Act
        let report = inspector(default_registry()).inspect("line 4", &frame);

        // Assert
        assert_eq!(
            report.outcome,
            FrameOutcome::Unknown {
                flags: "RELIABLE".to_string(),
                sequence: 1,
                id: "Medium 99".to_string(),
                body_len: 2,
                body_hex: Some("dead".to_string()),
            }
        );
    }

    #[test]
    fn test_hex_dump_can_be_disabled() {
        let settings = InspectSettings {
            hex_dump_unknown: false,
            ..InspectSettings::default()
        };
        let frame = [0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x63, 0xDE, 0xAD];

        let report = Inspector::new(default_registry(), &settings).inspect("x", &frame);

        assert!(matches!(report.outcome, FrameOutcome::Unknown { body_hex: None, .. }));
    }

    #[test]
    fn test_truncated_frame_fails() {
        let report = inspector(default_registry()).inspect("x", &PING_FRAME[..7]);
        match report.outcome {
            FrameOutcome::Failed { error } => assert!(error.contains("out of bounds"), "{error}"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn test_oversized_frame_fails_without_decoding() {
        let settings = InspectSettings {
            max_frame_size: 4,
            ..InspectSettings::default()
        };
        let report = Inspector::new(default_registry(), &settings).inspect("x", &PING_FRAME);
        assert!(matches!(report.outcome, FrameOutcome::Failed { .. }));
    }

    #[test]
    fn test_text_line_format() {
        let report = inspector(default_registry()).inspect("line 1", &PING_FRAME);
        let line = report.to_string();
        assert!(
            line.starts_with("line 1: 8 bytes seq=7 flags=- [High 2] CompletePingCheck"),
            "{line}"
        );
    }

    #[test]
    fn test_json_sink_writes_one_object_per_line() {
        // Arrange
        let packet = Packet::new(
            PacketHeader::new(PacketFlags::empty().with(PacketFlags::RELIABLE), 42),
            ChatFromSimulatorMessage {
                from_name: "Alice".to_string(),
                source_id: Uuid::from_u128(1),
                owner_id: Uuid::from_u128(1),
                source_type: ChatSourceType::Agent,
                chat_type: ChatType::Normal,
                audible: ChatAudible::Fully,
                position: Vector3::new(128.0, 128.0, 25.0),
                message: "hi".to_string(),
            },
        );
        let bytes = encode_packet(&packet).unwrap();
        let inspector = inspector(default_registry());
        let mut sink = WriterSink::new(Vec::new(), OutputFormat::Json);

        // Act
        sink.emit(&inspector.inspect("a", &bytes)).unwrap();
        sink.emit(&inspector.inspect("b", &[0x80])).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();

        // Assert
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).expect("valid JSON line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["status"], "decoded");
        assert_eq!(lines[0]["name"], "ChatFromSimulator");
        assert_eq!(lines[0]["sequence"], 42);
        assert_eq!(lines[0]["message"]["ChatFromSimulator"]["from_name"], "Alice");
        assert_eq!(lines[1]["status"], "failed");
        assert_eq!(lines[1]["source"], "b");
    }

    #[test]
    fn test_run_batch_emits_every_frame_and_counts_outcomes() {
        // Arrange
        let frames = vec![
            ("line 1".to_string(), PING_FRAME.to_vec()),
            ("line 2".to_string(), vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0xFF, 0x63]),
            ("line 3".to_string(), vec![0x00]),
        ];
        let mut sink = MockReportSink::new();
        sink.expect_emit().times(3).returning(|_| Ok(()));

        // Act
        let summary = run_batch(&inspector(default_registry()), frames, &mut sink).unwrap();

        // Assert
        assert_eq!(
            summary,
            Summary {
                decoded: 1,
                unknown: 1,
                failed: 1
            }
        );
        assert_eq!(summary.to_string(), "3 frames: 1 decoded, 1 unregistered, 1 failed");
    }

    #[test]
    fn test_run_batch_stops_on_sink_error() {
        let frames = vec![
            ("a".to_string(), PING_FRAME.to_vec()),
            ("b".to_string(), PING_FRAME.to_vec()),
        ];
        let mut sink = MockReportSink::new();
        sink.expect_emit()
            .times(1)
            .returning(|_| Err(InspectError::Output(std::io::Error::other("closed"))));

        let result = run_batch(&inspector(default_registry()), frames, &mut sink);

        assert!(matches!(result, Err(InspectError::Output(_))));
    }
}
