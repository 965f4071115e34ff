// Event-scoped QR payloads: `vl1.<event_id>.<hex hmac-sha256>`

use anyhow::anyhow;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use backend_domain::EventId;

use crate::AppError;

const PAYLOAD_VERSION: &str = "vl1";

type HmacSha256 = Hmac<Sha256>;

pub fn encode_event_qr(secret: &str, event_id: &EventId) -> Result<String, AppError> {
    let signed = signed_part(event_id.as_str());
    let mac = keyed_mac(secret, &signed)?;
    Ok(format!("{}.{}", signed, to_hex(&mac.finalize().into_bytes())))
}

/// Returns the event a payload was issued for. Malformed and forged payloads
/// are validation errors; the signature check is constant-time.
pub fn decode_event_qr(secret: &str, payload: &str) -> Result<EventId, AppError> {
    let payload = payload.trim();
    let (signed, signature) = payload
        .rsplit_once('.')
        .ok_or_else(|| invalid("missing signature"))?;
    let event_id = signed
        .strip_prefix(PAYLOAD_VERSION)
        .and_then(|rest| rest.strip_prefix('.'))
        .filter(|id| !id.is_empty())
        .ok_or_else(|| invalid("unsupported payload"))?;
    let signature = from_hex(signature).ok_or_else(|| invalid("signature is not hex"))?;

    keyed_mac(secret, signed)?
        .verify_slice(&signature)
        .map_err(|_| invalid("signature mismatch"))?;
    Ok(EventId::from(event_id))
}

fn signed_part(event_id: &str) -> String {
    format!("{}.{}", PAYLOAD_VERSION, event_id)
}

fn keyed_mac(secret: &str, message: &str) -> Result<HmacSha256, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| AppError::Internal(anyhow!("hmac init failed: {err}")))?;
    mac.update(message.as_bytes());
    Ok(mac)
}

fn invalid(reason: &str) -> AppError {
    AppError::Validation(format!("invalid qr payload: {}", reason))
}

fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn from_hex(raw: &str) -> Option<Vec<u8>> {
    if raw.len() % 2 != 0 || !raw.is_ascii() {
        return None;
    }
    (0..raw.len())
        .step_by(2)
        .map(|idx| u8::from_str_radix(&raw[idx..idx + 2], 16).ok())
        .collect()
}
