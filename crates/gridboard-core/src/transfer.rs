#![forbid(unsafe_code)]

//! Cross-window transfer codec.
//!
//! One custom transfer slot carries a versioned JSON envelope describing the
//! dragged entity; hosts attach it to the native drag event under
//! [`TRANSFER_SLOT`]. On the receiving side [`decode`] returns a tagged
//! result and NEVER fails outward: a malformed or mis-versioned envelope is
//! treated exactly like a drag that originated outside the application and
//! falls through to the native file/url/text slots.

use serde::{Deserialize, Serialize};

use crate::payload::{Ancestry, DragRole, EntityId, SessionId};

/// Name of the custom transfer slot the envelope travels in.
pub const TRANSFER_SLOT: &str = "application/x-gridboard";

/// Current envelope schema version.
pub const TRANSFER_SCHEMA_VERSION: u16 = 1;

/// Versioned wire form of a dragged entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferEnvelope {
    #[serde(default = "default_schema_version")]
    pub schema_version: u16,
    pub role: DragRole,
    pub id: EntityId,
    #[serde(default)]
    pub ancestry: Ancestry,
    #[serde(default)]
    pub label_hint: String,
    pub source_session: SessionId,
}

fn default_schema_version() -> u16 {
    TRANSFER_SCHEMA_VERSION
}

/// Validation failures for transfer envelopes.
///
/// These never cross the decode boundary; [`decode`] maps them onto the
/// native fallback instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEnvelopeError {
    UnsupportedSchemaVersion { version: u16, expected: u16 },
    EmptyEntityId,
}

impl std::fmt::Display for TransferEnvelopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedSchemaVersion { version, expected } => write!(
                f,
                "unsupported transfer schema version {version} (expected {expected})"
            ),
            Self::EmptyEntityId => write!(f, "transfer envelope entity id must be non-empty"),
        }
    }
}

impl std::error::Error for TransferEnvelopeError {}

impl TransferEnvelope {
    /// Build a current-version envelope.
    #[must_use]
    pub fn new(
        role: DragRole,
        id: EntityId,
        ancestry: Ancestry,
        label_hint: impl Into<String>,
        source_session: SessionId,
    ) -> Self {
        Self {
            schema_version: TRANSFER_SCHEMA_VERSION,
            role,
            id,
            ancestry,
            label_hint: label_hint.into(),
            source_session,
        }
    }

    /// Validate invariants required before the envelope may drive a commit.
    pub fn validate(&self) -> Result<(), TransferEnvelopeError> {
        if self.schema_version != TRANSFER_SCHEMA_VERSION {
            return Err(TransferEnvelopeError::UnsupportedSchemaVersion {
                version: self.schema_version,
                expected: TRANSFER_SCHEMA_VERSION,
            });
        }
        if self.id.as_str().is_empty() {
            return Err(TransferEnvelopeError::EmptyEntityId);
        }
        Ok(())
    }

    /// Serialize for the custom transfer slot.
    #[must_use]
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("transfer envelope serializes to JSON")
    }
}

/// Minimal description of a dragged file, as readable during a browser drag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileStub {
    pub name: String,
    #[serde(default)]
    pub media_type: String,
}

/// What the host read off the native drag event's transfer slots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferSlots {
    /// Content of the [`TRANSFER_SLOT`] slot, if present.
    pub custom: Option<String>,
    /// Plain-text slot.
    pub text: Option<String>,
    /// URL-list slot entries.
    pub urls: Vec<String>,
    /// Dragged files.
    pub files: Vec<FileStub>,
}

/// A drag that originated outside the application.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeTransfer {
    Files(Vec<FileStub>),
    Urls(Vec<String>),
    Text(String),
}

/// Tagged decode result. `Empty` means no usable slot was present at all.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferDecode {
    Envelope(TransferEnvelope),
    Native(NativeTransfer),
    Empty,
}

/// Decode the transfer slots of a drop.
///
/// Order: valid custom envelope, then files, then url list, then plain
/// text. The url list wins over text because browsers mirror dragged links
/// into both slots.
#[must_use]
pub fn decode(slots: &TransferSlots) -> TransferDecode {
    if let Some(raw) = slots.custom.as_deref()
        && let Ok(envelope) = serde_json::from_str::<TransferEnvelope>(raw)
        && envelope.validate().is_ok()
    {
        return TransferDecode::Envelope(envelope);
    }

    if !slots.files.is_empty() {
        return TransferDecode::Native(NativeTransfer::Files(slots.files.clone()));
    }
    if !slots.urls.is_empty() {
        return TransferDecode::Native(NativeTransfer::Urls(slots.urls.clone()));
    }
    if let Some(text) = slots.text.as_deref()
        && !text.is_empty()
    {
        return TransferDecode::Native(NativeTransfer::Text(text.to_owned()));
    }

    TransferDecode::Empty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> TransferEnvelope {
        TransferEnvelope::new(
            DragRole::Instance,
            EntityId::from("inst-7"),
            Ancestry::in_container(EntityId::from("p1"), EntityId::from("c1")),
            "Revenue",
            SessionId::new("tab-a"),
        )
    }

    #[test]
    fn envelope_round_trip() {
        let encoded = envelope().encode();
        let slots = TransferSlots {
            custom: Some(encoded),
            ..TransferSlots::default()
        };
        assert_eq!(decode(&slots), TransferDecode::Envelope(envelope()));
    }

    #[test]
    fn malformed_custom_slot_falls_through_to_text() {
        let slots = TransferSlots {
            custom: Some("{not json".to_owned()),
            text: Some("hello".to_owned()),
            ..TransferSlots::default()
        };
        assert_eq!(
            decode(&slots),
            TransferDecode::Native(NativeTransfer::Text("hello".to_owned()))
        );
    }

    #[test]
    fn future_schema_version_falls_through() {
        let mut future = envelope();
        future.schema_version = TRANSFER_SCHEMA_VERSION + 1;
        let slots = TransferSlots {
            custom: Some(future.encode()),
            urls: vec!["https://example.com".to_owned()],
            ..TransferSlots::default()
        };
        assert_eq!(
            decode(&slots),
            TransferDecode::Native(NativeTransfer::Urls(vec!["https://example.com".to_owned()]))
        );
    }

    #[test]
    fn empty_entity_id_is_rejected_by_validate() {
        let mut bad = envelope();
        bad.id = EntityId::from("");
        assert_eq!(bad.validate(), Err(TransferEnvelopeError::EmptyEntityId));
    }

    #[test]
    fn files_win_over_urls_and_text() {
        let slots = TransferSlots {
            files: vec![FileStub {
                name: "report.csv".to_owned(),
                media_type: "text/csv".to_owned(),
            }],
            urls: vec!["https://example.com".to_owned()],
            text: Some("ignored".to_owned()),
            ..TransferSlots::default()
        };
        match decode(&slots) {
            TransferDecode::Native(NativeTransfer::Files(files)) => {
                assert_eq!(files[0].name, "report.csv");
            }
            other => panic!("expected file transfer, got {other:?}"),
        }
    }

    #[test]
    fn no_slots_is_empty() {
        assert_eq!(decode(&TransferSlots::default()), TransferDecode::Empty);
    }
}
