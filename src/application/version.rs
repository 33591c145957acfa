//! Content-derived versions used as `ETag` values.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque version of a stored application, derived from its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationVersion {
    opaque: String,
}

impl ApplicationVersion {
    /// Hash the content; the first 8 bytes of SHA-256 keep headers short.
    pub fn from_content(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let hash = hasher.finalize();
        Self {
            opaque: BASE64.encode(&hash[..8]),
        }
    }

    /// Weak entity tag, e.g. `W/"abc123=="`.
    pub fn to_etag(&self) -> String {
        format!("W/\"{}\"", self.opaque)
    }

    pub fn as_str(&self) -> &str {
        &self.opaque
    }
}

impl fmt::Display for ApplicationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.opaque)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_version() {
        let a = ApplicationVersion::from_content(br#"{"name":"Pickup"}"#);
        let b = ApplicationVersion::from_content(br#"{"name":"Pickup"}"#);
        let c = ApplicationVersion::from_content(br#"{"name":"Dispatch"}"#);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn etag_is_weak_and_quoted() {
        let etag = ApplicationVersion::from_content(b"x").to_etag();
        assert!(etag.starts_with("W/\""));
        assert!(etag.ends_with('"'));
        // 8 bytes encode to 12 base64 characters
        assert_eq!(etag.len(), "W/\"\"".len() + 12);
    }
}
