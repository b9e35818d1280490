//! Bearer credential decoding.
//!
//! The backend issues signed three-segment tokens whose payload carries the
//! user profile under a `user` claim. The client never verifies the
//! signature; it only reads the payload to bootstrap the session. Anything
//! that does not decode is treated as "no identity".

use base64::Engine;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use serde::Deserialize;
use tracing::debug;

use crate::identity::Identity;

/// URL-safe alphabet, padding optional (issuers differ on trailing `=`).
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &base64::alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Deserialize)]
struct Payload {
    user: Option<Identity>,
}

/// Decode the identity from a credential, or `None` if it is malformed.
pub fn decode_identity(token: &str) -> Option<Identity> {
    match decode_payload(token) {
        Ok(identity) => Some(identity),
        Err(e) => {
            debug!(error = %e, "Credential does not carry an identity");
            None
        }
    }
}

fn decode_payload(token: &str) -> Result<Identity, DecodeError> {
    let segment = token.split('.').nth(1).ok_or(DecodeError::MissingSegment)?;
    let bytes = PAYLOAD_ENGINE
        .decode(segment)
        .map_err(DecodeError::Base64)?;
    let payload: Payload = serde_json::from_slice(&bytes).map_err(DecodeError::Json)?;
    payload.user.ok_or(DecodeError::MissingUser)
}

/// Reasons a credential fails to decode. Never surfaced past this module.
#[derive(Debug)]
pub enum DecodeError {
    /// No payload segment after the first `.`
    MissingSegment,
    /// Payload is not base64url
    Base64(base64::DecodeError),
    /// Payload is not the expected JSON object
    Json(serde_json::Error),
    /// Payload has no `user` claim
    MissingUser,
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::MissingSegment => write!(f, "Missing payload segment"),
            DecodeError::Base64(e) => write!(f, "Invalid payload encoding: {}", e),
            DecodeError::Json(e) => write!(f, "Invalid payload JSON: {}", e),
            DecodeError::MissingUser => write!(f, "Payload has no user claim"),
        }
    }
}

impl std::error::Error for DecodeError {}
