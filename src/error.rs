//! Error types shared by the analysis pipeline, the cache and the controller.

use thiserror::Error;

/// Session-level failures.
///
/// `Decode` and `Buffer` abort the current session back to track selection.
/// `CacheIo` never reaches the player: reads degrade to a miss and writes are
/// dropped. `Scheduling` is surfaced while the controller keeps its state.
#[derive(Debug, Error)]
pub enum GameError {
    /// Unreadable or unsupported source, or missing format information.
    #[error("cannot decode track: {0}")]
    Decode(String),

    /// The PCM buffer could not be allocated.
    #[error("cannot allocate a buffer of {requested} samples")]
    Buffer { requested: usize },

    #[error("beat map cache failure: {0}")]
    CacheIo(#[from] CacheError),

    /// Playback cannot be scheduled: the transport failed to start the track,
    /// or the worker that resolves its beat map could not be started.
    #[error("cannot schedule playback: {0}")]
    Scheduling(String),
}

impl GameError {
    /// Whether this error ends the session.
    pub fn aborts_session(&self) -> bool {
        matches!(self, GameError::Decode(_) | GameError::Buffer { .. })
    }
}

/// Failures of a beat map store.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Encode(String),

    #[error("deserialization error: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The cache worker is gone (shut down or panicked).
    #[error("cache worker unavailable")]
    Runtime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_decode_and_buffer_abort() {
        assert!(GameError::Decode("bad header".into()).aborts_session());
        assert!(GameError::Buffer { requested: 10 }.aborts_session());
        assert!(!GameError::Scheduling("no device".into()).aborts_session());
        assert!(!GameError::CacheIo(CacheError::Runtime).aborts_session());
    }

    #[test]
    fn cache_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: GameError = CacheError::from(io).into();
        assert!(matches!(err, GameError::CacheIo(CacheError::Io(_))));
        assert!(err.to_string().contains("gone"));
    }
}
