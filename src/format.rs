//! Encoding and decoding of the session cookie payload.
//!
//! Exposed mainly so tests and debugging tools can look inside a cookie
//! value.
//!
//! Note: the on-wire format is versioned, but it is still considered an
//! implementation detail and may evolve.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{session::Record, session_store};

const VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    v: u8,
    /// Unix seconds after which the payload is stale, present when the cookie
    /// was written with a max-age. Checked on load so an old cookie replayed
    /// past its lifetime is not honored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
    record: Record,
}

/// Encode a session [`Record`] and optional expiry stamp into the cookie
/// value.
pub fn encode_record(
    record: &Record,
    expires_at: Option<OffsetDateTime>,
) -> session_store::Result<String> {
    let envelope = Envelope {
        v: VERSION,
        exp: expires_at.map(OffsetDateTime::unix_timestamp),
        record: record.clone(),
    };

    let bytes = serde_json::to_vec(&envelope)
        .map_err(|err| session_store::Error::Encode(err.to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Decode a cookie value into a session [`Record`] and its expiry stamp.
pub fn decode_record(value: &str) -> session_store::Result<(Record, Option<OffsetDateTime>)> {
    let bytes = URL_SAFE_NO_PAD
        .decode(value.as_bytes())
        .map_err(|err| session_store::Error::Decode(err.to_string()))?;

    let envelope: Envelope = serde_json::from_slice(&bytes)
        .map_err(|err| session_store::Error::Decode(err.to_string()))?;

    if envelope.v != VERSION {
        return Err(session_store::Error::Decode(format!(
            "Unsupported cookie session version: {}",
            envelope.v
        )));
    }

    let expires_at = envelope
        .exp
        .map(OffsetDateTime::from_unix_timestamp)
        .transpose()
        .map_err(|err| session_store::Error::Decode(err.to_string()))?;

    Ok((envelope.record, expires_at))
}
