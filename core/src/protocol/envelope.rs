//! Envelope definitions and the JSON wire codec
//!
//! Every frame on the wire is a single JSON object with a `type` field and a
//! handful of optional, type-specific fields. Binary file content travels as
//! a base64 string so a frame is always plain UTF-8 text.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DecodeError, EncodeError};
use crate::protocol::constants::MAX_ENVELOPE_SIZE;

/// Wire names of the recognized envelope types
pub mod kind {
    pub const MESSAGE: &str = "message";
    pub const FILE: &str = "file";
    pub const CLIPBOARD: &str = "clipboard";
    pub const NOTIFICATION: &str = "notification";
    pub const COMMAND: &str = "command";
    pub const DEVICE_INFO: &str = "device-info";
    pub const BATTERY_LEVEL: &str = "battery-level";
}

/// Kind of device on either end of a connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    #[default]
    Unknown,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Unknown => "unknown",
        }
    }

    /// Lenient parse used for wire and TXT values; anything else is `Unknown`.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "desktop" => DeviceType::Desktop,
            "mobile" => DeviceType::Mobile,
            _ => DeviceType::Unknown,
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single protocol message exchanged over a connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Free text to show to the user
    Message { content: String },

    /// A file, carried in memory as raw bytes
    File { filename: String, data: Vec<u8> },

    /// Text to place on the receiver's clipboard
    Clipboard { content: String },

    /// A notification to display; the receiver picks a title if absent
    Notification { title: Option<String>, content: String },

    /// Name of a remote command to run on the receiver
    Command { command: String },

    /// The sender's device type, exchanged once a link is up
    DeviceInfo { device_type: DeviceType },

    /// Sender's battery percentage
    BatteryLevel { level: u8 },

    /// A type this build does not know; never sent, dropped on receipt
    Unrecognized { kind: String },
}

/// Flat wire representation; every field but `type` is optional.
///
/// Fields stay untyped until the declared type says which ones it reads, so
/// a stray field of the wrong shape never spoils an otherwise valid frame.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filename: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    device_type: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    level: Option<Value>,
}

impl Envelope {
    pub fn message(content: impl Into<String>) -> Self {
        Envelope::Message { content: content.into() }
    }

    pub fn file(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Envelope::File { filename: filename.into(), data }
    }

    pub fn device_info(device_type: DeviceType) -> Self {
        Envelope::DeviceInfo { device_type }
    }

    /// Wire name of this envelope's type
    pub fn kind(&self) -> &str {
        match self {
            Envelope::Message { .. } => kind::MESSAGE,
            Envelope::File { .. } => kind::FILE,
            Envelope::Clipboard { .. } => kind::CLIPBOARD,
            Envelope::Notification { .. } => kind::NOTIFICATION,
            Envelope::Command { .. } => kind::COMMAND,
            Envelope::DeviceInfo { .. } => kind::DEVICE_INFO,
            Envelope::BatteryLevel { .. } => kind::BATTERY_LEVEL,
            Envelope::Unrecognized { kind } => kind,
        }
    }

    /// Serialize to a JSON frame using the default size limit
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        self.encode_text(MAX_ENVELOPE_SIZE).map(String::into_bytes)
    }

    /// Serialize to a JSON text frame no larger than `max_size` bytes
    pub fn encode_text(&self, max_size: usize) -> Result<String, EncodeError> {
        let text = serde_json::to_string(&self.to_wire()?)?;
        if text.len() > max_size {
            return Err(EncodeError::PayloadTooLarge {
                size: text.len(),
                max: max_size,
            });
        }
        Ok(text)
    }

    /// Parse a JSON frame using the default size limit
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_limited(bytes, MAX_ENVELOPE_SIZE)
    }

    /// Parse a JSON frame, rejecting anything over `max_size` bytes.
    ///
    /// An unknown `type` is not an error: it yields `Envelope::Unrecognized`
    /// so the receiver can log and drop it.
    pub fn decode_limited(bytes: &[u8], max_size: usize) -> Result<Self, DecodeError> {
        if bytes.len() > max_size {
            return Err(DecodeError::PayloadTooLarge {
                size: bytes.len(),
                max: max_size,
            });
        }

        let wire: WireEnvelope =
            serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Self::from_wire(wire)
    }

    fn to_wire(&self) -> Result<WireEnvelope, EncodeError> {
        let mut wire = WireEnvelope {
            kind: Some(self.kind().to_string()),
            ..Default::default()
        };

        match self {
            Envelope::Message { content } | Envelope::Clipboard { content } => {
                wire.content = Some(Value::from(content.as_str()));
            }
            Envelope::File { filename, data } => {
                if filename.is_empty() {
                    return Err(EncodeError::EmptyField {
                        kind: kind::FILE,
                        field: "filename",
                    });
                }
                wire.filename = Some(Value::from(filename.as_str()));
                wire.content = Some(Value::from(BASE64.encode(data)));
            }
            Envelope::Notification { title, content } => {
                wire.title = title.as_deref().map(Value::from);
                wire.content = Some(Value::from(content.as_str()));
            }
            Envelope::Command { command } => {
                if command.is_empty() {
                    return Err(EncodeError::EmptyField {
                        kind: kind::COMMAND,
                        field: "command",
                    });
                }
                wire.command = Some(Value::from(command.as_str()));
            }
            Envelope::DeviceInfo { device_type } => {
                wire.device_type = Some(Value::from(device_type.as_str()));
            }
            Envelope::BatteryLevel { level } => {
                if *level > 100 {
                    return Err(EncodeError::LevelOutOfRange(*level));
                }
                wire.level = Some(Value::from(*level));
            }
            Envelope::Unrecognized { kind } => {
                return Err(EncodeError::Unrecognized(kind.clone()));
            }
        }

        Ok(wire)
    }

    fn from_wire(wire: WireEnvelope) -> Result<Self, DecodeError> {
        let kind_name = wire.kind.ok_or(DecodeError::MissingType)?;

        let envelope = match kind_name.as_str() {
            kind::MESSAGE => Envelope::Message {
                content: required_text(wire.content, kind::MESSAGE, "content")?,
            },
            kind::FILE => {
                let filename = required_text(wire.filename, kind::FILE, "filename")?;
                let encoded = required_text(wire.content, kind::FILE, "content")?;
                let data = BASE64
                    .decode(encoded.trim())
                    .map_err(|e| DecodeError::InvalidField {
                        kind: kind::FILE,
                        field: "content",
                        reason: e.to_string(),
                    })?;
                Envelope::File { filename, data }
            }
            kind::CLIPBOARD => Envelope::Clipboard {
                content: required_text(wire.content, kind::CLIPBOARD, "content")?,
            },
            kind::NOTIFICATION => Envelope::Notification {
                title: optional_text(wire.title, kind::NOTIFICATION, "title")?,
                content: required_text(wire.content, kind::NOTIFICATION, "content")?,
            },
            kind::COMMAND => Envelope::Command {
                command: required_text(wire.command, kind::COMMAND, "command")?,
            },
            kind::DEVICE_INFO => Envelope::DeviceInfo {
                device_type: DeviceType::from_wire(&required_text(
                    wire.device_type,
                    kind::DEVICE_INFO,
                    "deviceType",
                )?),
            },
            kind::BATTERY_LEVEL => Envelope::BatteryLevel {
                level: parse_level(require(wire.level, kind::BATTERY_LEVEL, "level")?)?,
            },
            _ => Envelope::Unrecognized { kind: kind_name },
        };

        Ok(envelope)
    }
}

fn require<T>(value: Option<T>, kind: &'static str, field: &'static str) -> Result<T, DecodeError> {
    value.ok_or(DecodeError::MissingField { kind, field })
}

fn required_text(
    value: Option<Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, DecodeError> {
    optional_text(value, kind, field)?.ok_or(DecodeError::MissingField { kind, field })
}

/// A string field the declared type reads; `null` counts as absent
fn optional_text(
    value: Option<Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<Option<String>, DecodeError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(other) => Err(DecodeError::InvalidField {
            kind,
            field,
            reason: format!("expected a string, got {}", other),
        }),
    }
}

fn parse_level(value: Value) -> Result<u8, DecodeError> {
    let invalid = |reason: String| DecodeError::InvalidField {
        kind: kind::BATTERY_LEVEL,
        field: "level",
        reason,
    };

    // Some senders report 57.0 rather than 57
    let level = match value.as_u64() {
        Some(n) => n,
        None => match value.as_f64() {
            Some(f) if f.fract() == 0.0 && f >= 0.0 => f as u64,
            _ => return Err(invalid(format!("expected an integer, got {}", value))),
        },
    };

    if level > 100 {
        return Err(invalid(format!("{} is outside 0-100", level)));
    }
    Ok(level as u8)
}
