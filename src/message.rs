// ============================================================================
// Message Model
// ============================================================================
//
// Two views of the same frame:
//
// - WireMessage: what the broker stores. Opaque body bytes, an optional
//   content type and a flat header bag. Anything that can write this
//   frame can publish to the relay.
// - Message: the typed view the producer and consumer work with. A frame
//   becomes a TextMessage only when its `JMSType` header says so and the
//   body is valid UTF-8; everything else surfaces as a BytesMessage.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{RelayError, RelayResult};

/// Header naming the typed message kind carried by a frame
pub const MESSAGE_TYPE_HEADER: &str = "JMSType";

/// `JMSType` value for text payloads
pub const TEXT_MESSAGE_TYPE: &str = "TextMessage";

/// Content type stamped on outbound text frames
pub const TEXT_PLAIN: &str = "text/plain";

/// Broker-level frame: body bytes plus a header bag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub body: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl WireMessage {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            content_type: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Whether the header bag flags the body as text
    pub fn is_text(&self) -> bool {
        self.header(MESSAGE_TYPE_HEADER) == Some(TEXT_MESSAGE_TYPE)
    }

    /// Serialize to named MessagePack for storage on the broker
    pub fn encode(&self) -> RelayResult<Vec<u8>> {
        Ok(rmp_serde::encode::to_vec_named(self)?)
    }

    pub fn decode(bytes: &[u8]) -> RelayResult<Self> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Immutable text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    text: String,
    headers: BTreeMap<String, String>,
}

impl TextMessage {
    pub fn new(text: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(MESSAGE_TYPE_HEADER.to_string(), TEXT_MESSAGE_TYPE.to_string());
        Self {
            text: text.into(),
            headers,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Message of any kind that is not text-shaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BytesMessage {
    body: Vec<u8>,
    headers: BTreeMap<String, String>,
}

impl BytesMessage {
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

/// Typed view of a received frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Text(TextMessage),
    Bytes(BytesMessage),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Text(_) => "TextMessage",
            Message::Bytes(_) => "BytesMessage",
        }
    }

    /// Narrow to a text message, failing for any other kind
    pub fn into_text(self) -> RelayResult<TextMessage> {
        match self {
            Message::Text(text) => Ok(text),
            Message::Bytes(bytes) => Err(RelayError::malformed(format!(
                "expected TextMessage, got BytesMessage ({} bytes, {}={})",
                bytes.body.len(),
                MESSAGE_TYPE_HEADER,
                bytes
                    .headers
                    .get(MESSAGE_TYPE_HEADER)
                    .map(String::as_str)
                    .unwrap_or("<unset>")
            ))),
        }
    }
}

impl From<WireMessage> for Message {
    fn from(wire: WireMessage) -> Self {
        if !wire.is_text() {
            return Message::Bytes(BytesMessage {
                body: wire.body,
                headers: wire.headers,
            });
        }

        match String::from_utf8(wire.body) {
            Ok(text) => Message::Text(TextMessage {
                text,
                headers: wire.headers,
            }),
            Err(e) => Message::Bytes(BytesMessage {
                body: e.into_bytes(),
                headers: wire.headers,
            }),
        }
    }
}

impl From<TextMessage> for WireMessage {
    fn from(message: TextMessage) -> Self {
        WireMessage {
            body: message.text.into_bytes(),
            content_type: Some(TEXT_PLAIN.to_string()),
            headers: message.headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_sets_type_header() {
        let message = TextMessage::new("Hello 0");
        assert_eq!(
            message.headers().get(MESSAGE_TYPE_HEADER).map(String::as_str),
            Some(TEXT_MESSAGE_TYPE)
        );

        let wire = WireMessage::from(message);
        assert!(wire.is_text());
        assert_eq!(wire.content_type.as_deref(), Some(TEXT_PLAIN));
        assert_eq!(wire.body, b"Hello 0".to_vec());
    }

    #[test]
    fn test_flagged_frame_maps_to_text() {
        let wire = WireMessage::new("payload")
            .with_content_type(TEXT_PLAIN)
            .with_header(MESSAGE_TYPE_HEADER, TEXT_MESSAGE_TYPE)
            .with_header("origin", "amqp-client");

        let text = Message::from(wire).into_text().unwrap();
        assert_eq!(text.text(), "payload");
        assert_eq!(text.headers().get("origin").map(String::as_str), Some("amqp-client"));
    }

    #[test]
    fn test_unflagged_frame_is_malformed() {
        let message = Message::from(WireMessage::new("looks like text"));
        assert_eq!(message.kind(), "BytesMessage");

        let err = message.into_text().unwrap_err();
        assert!(matches!(err, RelayError::MalformedMessage(_)));
        assert!(err.to_string().contains("<unset>"));
    }

    #[test]
    fn test_flagged_frame_with_invalid_utf8_is_bytes() {
        let wire = WireMessage::new(vec![0xff, 0xfe])
            .with_header(MESSAGE_TYPE_HEADER, TEXT_MESSAGE_TYPE);

        match Message::from(wire) {
            Message::Bytes(bytes) => assert_eq!(bytes.body(), &[0xff, 0xfe]),
            other => panic!("expected BytesMessage, got {}", other.kind()),
        }
    }

    #[test]
    fn test_wire_frame_decodes_without_optional_fields() {
        #[derive(Serialize)]
        struct BareFrame {
            body: Vec<u8>,
        }

        let bytes = rmp_serde::encode::to_vec_named(&BareFrame {
            body: b"raw".to_vec(),
        })
        .unwrap();

        let wire = WireMessage::decode(&bytes).unwrap();
        assert_eq!(wire.body, b"raw".to_vec());
        assert!(wire.headers.is_empty());
        assert!(wire.content_type.is_none());
    }

    #[test]
    fn test_garbage_frame_fails_to_decode() {
        let err = WireMessage::decode(b"not messagepack at all").unwrap_err();
        assert!(matches!(err, RelayError::MalformedMessage(_)));
    }
}
