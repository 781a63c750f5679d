//! services/api/src/extract/txt.rs

use super::ExtractError;

/// Decodes the upload as UTF-8, byte for byte.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    Ok(String::from_utf8(bytes.to_vec())?)
}
