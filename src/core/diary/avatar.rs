//! Avatar payloads: base64 image bytes embedded in the account as a `data:` URL.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::core::store::{StoreError, StoreResult};

/// Image formats accepted as avatars, with their leading magic bytes.
const ACCEPTED_IMAGES: &[(&str, &[u8])] = &[
    ("image/png", b"\x89PNG\r\n\x1a\n" as &[u8]),
    ("image/jpeg", b"\xff\xd8\xff" as &[u8]),
    ("image/gif", b"GIF8" as &[u8]),
    ("image/webp", b"RIFF" as &[u8]),
];

/// Validate an uploaded avatar and render it as a `data:` URL.
///
/// The declared content type must be an accepted image type, the payload
/// must be valid base64 no larger than `max_bytes` once decoded, and the
/// decoded bytes must start with that type's signature.
pub fn encode_avatar(
    content_type: &str,
    base64_payload: &str,
    max_bytes: usize,
) -> StoreResult<String> {
    let mut content_type = content_type.trim().to_ascii_lowercase();
    if content_type == "image/jpg" {
        content_type = "image/jpeg".to_string();
    }

    let (_, magic) = ACCEPTED_IMAGES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .ok_or_else(|| {
            StoreError::validation(format!("unsupported avatar type '{content_type}'"))
        })?;

    let payload = strip_data_url_prefix(base64_payload.trim());
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| StoreError::validation(format!("avatar is not valid base64: {e}")))?;

    if bytes.is_empty() {
        return Err(StoreError::validation("avatar is empty"));
    }
    if bytes.len() > max_bytes {
        return Err(StoreError::validation(format!(
            "avatar is {} bytes, limit is {}",
            bytes.len(),
            max_bytes
        )));
    }
    if !bytes.starts_with(magic) || (content_type == "image/webp" && !is_webp(&bytes)) {
        return Err(StoreError::validation(format!(
            "avatar content does not match '{content_type}'"
        )));
    }

    Ok(format!("data:{};base64,{}", content_type, STANDARD.encode(&bytes)))
}

/// Accept either a bare base64 string or a full `data:...;base64,` URL.
fn strip_data_url_prefix(payload: &str) -> &str {
    if payload.starts_with("data:") {
        if let Some((_, data)) = payload.split_once(";base64,") {
            return data;
        }
    }
    payload
}

fn is_webp(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[8..12] == b"WEBP"
}
