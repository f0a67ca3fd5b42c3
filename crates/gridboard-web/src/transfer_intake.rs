#![forbid(unsafe_code)]

//! Native drag-event intake: transfer slots in, drag payloads out.
//!
//! On drag-start the host calls [`encode_payload`] and attaches the result
//! under [`TRANSFER_SLOT`]. On a drag entering the window, the host reads
//! the slots it can see and calls [`payload_from_transfer`]; a valid
//! envelope reconstructs the original payload (cross-window case), anything
//! else synthesizes a File/Text/Url payload. Parsing never throws: a
//! malformed envelope is indistinguishable from a drag that started outside
//! the application.

use gridboard_core::payload::{Ancestry, DragPayload, DragRole, EntityId, SessionId};
use gridboard_core::transfer::{
    NativeTransfer, TRANSFER_SLOT, TransferDecode, TransferEnvelope, TransferSlots, decode,
};

/// Longest label synthesized from a dragged text snippet.
const TEXT_LABEL_MAX: usize = 120;

/// Wire form of an outgoing drag, for the [`TRANSFER_SLOT`] slot.
#[must_use]
pub fn encode_payload(payload: &DragPayload) -> String {
    TransferEnvelope::new(
        payload.role,
        payload.id.clone(),
        payload.origin.clone(),
        payload.snapshot.label.clone(),
        payload.source_session.clone(),
    )
    .encode()
}

/// Build the payload for a drag entering this window.
///
/// `minted_id` is the identity a synthesized external entity will keep
/// through commit (and through any retry); the host mints it once per
/// native drag, at intake. Returns `None` when no slot carries anything
/// usable.
#[must_use]
pub fn payload_from_transfer(
    slots: &TransferSlots,
    minted_id: EntityId,
    local_session: &SessionId,
) -> Option<DragPayload> {
    match decode(slots) {
        TransferDecode::Envelope(envelope) => Some(DragPayload {
            role: envelope.role,
            id: envelope.id,
            origin: envelope.ancestry,
            snapshot: gridboard_core::payload::PayloadSnapshot::labeled(envelope.label_hint),
            source_session: envelope.source_session,
        }),
        TransferDecode::Native(NativeTransfer::Files(files)) => {
            let label = match files.as_slice() {
                [only] => only.name.clone(),
                [first, rest @ ..] => format!("{} (+{} more)", first.name, rest.len()),
                [] => return None,
            };
            Some(DragPayload::external(
                DragRole::File,
                minted_id,
                label,
                local_session.clone(),
            ))
        }
        TransferDecode::Native(NativeTransfer::Urls(urls)) => {
            let label = urls.first()?.clone();
            Some(DragPayload::external(
                DragRole::Url,
                minted_id,
                label,
                local_session.clone(),
            ))
        }
        TransferDecode::Native(NativeTransfer::Text(text)) => {
            let label: String = text.chars().take(TEXT_LABEL_MAX).collect();
            Some(DragPayload::external(
                DragRole::Text,
                minted_id,
                label,
                local_session.clone(),
            ))
        }
        TransferDecode::Empty => None,
    }
}

/// Convenience for hosts wiring `DataTransfer`: the slot name to write.
#[must_use]
pub const fn transfer_slot_name() -> &'static str {
    TRANSFER_SLOT
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridboard_core::payload::PayloadSnapshot;
    use gridboard_core::transfer::FileStub;

    fn local() -> SessionId {
        SessionId::new("tab-local")
    }

    #[test]
    fn round_trip_preserves_identity_and_origin() {
        let original = DragPayload::instance(
            EntityId::from("inst-4"),
            EntityId::from("panel-2"),
            EntityId::from("c7"),
            PayloadSnapshot::labeled("Orders"),
            SessionId::new("tab-remote"),
        );
        let slots = TransferSlots {
            custom: Some(encode_payload(&original)),
            ..TransferSlots::default()
        };

        let decoded = payload_from_transfer(&slots, EntityId::from("unused"), &local())
            .expect("envelope decodes");
        assert_eq!(decoded.id, original.id);
        assert_eq!(decoded.origin, original.origin);
        assert_eq!(decoded.source_session, SessionId::new("tab-remote"));
    }

    #[test]
    fn dropped_files_become_a_file_payload() {
        let slots = TransferSlots {
            files: vec![
                FileStub {
                    name: "q3.csv".to_owned(),
                    media_type: "text/csv".to_owned(),
                },
                FileStub {
                    name: "q4.csv".to_owned(),
                    media_type: "text/csv".to_owned(),
                },
            ],
            ..TransferSlots::default()
        };
        let payload = payload_from_transfer(&slots, EntityId::from("ext-1"), &local())
            .expect("file payload");
        assert_eq!(payload.role, DragRole::File);
        assert_eq!(payload.id, EntityId::from("ext-1"));
        assert_eq!(payload.snapshot.label, "q3.csv (+1 more)");
    }

    #[test]
    fn malformed_envelope_falls_back_to_url() {
        let slots = TransferSlots {
            custom: Some("][".to_owned()),
            urls: vec!["https://example.com/dash".to_owned()],
            ..TransferSlots::default()
        };
        let payload =
            payload_from_transfer(&slots, EntityId::from("ext-2"), &local()).expect("url payload");
        assert_eq!(payload.role, DragRole::Url);
        assert_eq!(payload.snapshot.label, "https://example.com/dash");
    }

    #[test]
    fn long_text_label_is_truncated() {
        let slots = TransferSlots {
            text: Some("x".repeat(500)),
            ..TransferSlots::default()
        };
        let payload =
            payload_from_transfer(&slots, EntityId::from("ext-3"), &local()).expect("text payload");
        assert_eq!(payload.snapshot.label.len(), TEXT_LABEL_MAX);
    }

    #[test]
    fn empty_slots_yield_no_payload() {
        assert!(
            payload_from_transfer(&TransferSlots::default(), EntityId::from("ext-4"), &local())
                .is_none()
        );
    }
}
