//! Signature checks for externally submitted records.

use grouplog_types::Event;
use secp256k1::{schnorr::Signature, Message, Secp256k1, XOnlyPublicKey};

use crate::error::SinkError;

/// Verifies the BIP-340 Schnorr signature of `event` over its id.
///
/// The id itself must already have been checked against the content.
pub(crate) fn verify_signature(event: &Event) -> Result<(), SinkError> {
    let sig_hex = event
        .sig()
        .ok_or_else(|| SinkError::Rejected(format!("event {} is not signed", event.id())))?;

    let sig_bytes = hex::decode(sig_hex)
        .map_err(|e| SinkError::Rejected(format!("malformed signature: {e}")))?;
    let sig = Signature::from_slice(&sig_bytes)
        .map_err(|e| SinkError::Rejected(format!("malformed signature: {e}")))?;

    let pk_bytes = hex::decode(event.pubkey())
        .map_err(|e| SinkError::Rejected(format!("malformed pubkey: {e}")))?;
    let pk = XOnlyPublicKey::from_slice(&pk_bytes)
        .map_err(|e| SinkError::Rejected(format!("malformed pubkey: {e}")))?;

    let msg = Message::from_digest(event.hash());
    Secp256k1::verification_only()
        .verify_schnorr(&sig, &msg, &pk)
        .map_err(|_| SinkError::Rejected(format!("bad signature on event {}", event.id())))
}
