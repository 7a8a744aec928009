//! Engine-wide error kinds.
//!
//! Public functions return `anyhow::Result` so callers can freely add context;
//! these variants exist for the places the supervisor needs to match on *what
//! kind* of failure happened (fatal vs. per-utterance vs. recoverable).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("audio capture failed: {0}")]
    CaptureFailed(String),

    #[error("speech recognition failed: {0}")]
    RecognizerError(String),

    #[error("translation failed: {0}")]
    TranslatorError(String),

    #[error("speech synthesis failed: {0}")]
    SynthesizerError(String),

    #[error("could not parse provider response: {0}")]
    ParseError(String),

    #[error("interlock released without a matching acquire (owner={0})")]
    InterlockInconsistency(String),
}
