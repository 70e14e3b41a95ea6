//! Catalog entries handed to the controller.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Stable track identity (MD5 of the audio file's bytes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity derived from the raw bytes of an audio file.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", md5::compute(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    /// Handle usable by the decoder and the transport.
    pub path: PathBuf,
    pub title: String,
    /// Seconds, when the container reports it.
    pub duration: Option<f64>,
}

impl Track {
    pub fn new(id: TrackId, path: PathBuf, title: impl Into<String>, duration: Option<f64>) -> Self {
        Self {
            id,
            path,
            title: title.into(),
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_content_hash() {
        let a = TrackId::from_bytes(b"RIFF....WAVE");
        let b = TrackId::from_bytes(b"RIFF....WAVE");
        let c = TrackId::from_bytes(b"ID3");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 32);
    }
}
