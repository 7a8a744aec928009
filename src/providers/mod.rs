//! Abstract provider contracts: `SpeechRecognizer`, `Translator`,
//! `SpeechSynthesizer`. The engine depends only on these traits; any vendor
//! satisfying the wire contract in the external-interfaces section is a
//! drop-in substitute for the reference adapters in [`groq`] and
//! [`elevenlabs`].

pub mod elevenlabs;
pub mod groq;

use std::future::Future;
use std::pin::Pin;

use crate::audio::PcmChunk;
use crate::lang::LangTag;

/// `{ text, sourceLang }`, produced by STT. May be empty (the caller filters).
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub source_lang: LangTag,
}

/// `{ text, targetLang }`, produced by MT.
#[derive(Debug, Clone)]
pub struct Translation {
    pub text: String,
    pub target_lang: LangTag,
}

/// Options accompanying a recognize call.
#[derive(Debug, Clone, Default)]
pub struct RecognizeOptions {
    pub tag_audio_events: bool,
    pub prompt: Option<String>,
}

/// A pull-based stream of PCM chunks. Boxed so different adapters (an HTTP
/// byte stream, a WebSocket frame stream, …) can share one call-site type.
/// Implementations MUST yield chunks as they arrive rather than buffering
/// the whole synthesis — buffering defeats the time-to-first-byte goal.
pub type PcmStream = Pin<Box<dyn futures_util::Stream<Item = anyhow::Result<PcmChunk>> + Send>>;

/// Converts a WAV-encoded utterance into text. Dyn-compatible (the future
/// is hand-boxed, same as [`SpeechSynthesizer`]) so adapters can be stored
/// behind `Arc<dyn SpeechRecognizer>`.
pub trait SpeechRecognizer: Send + Sync {
    fn recognize<'a>(
        &'a self,
        utterance_wav: &'a [u8],
        source_lang: &'a LangTag,
        options: &'a RecognizeOptions,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Transcript>> + Send + 'a>>;
}

/// Translates text into the target language, enforcing a structured
/// response contract so no wrapping text leaks into the translation.
/// Dyn-compatible for the same reason as [`SpeechRecognizer`].
pub trait Translator: Send + Sync {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        target_lang: &'a LangTag,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>>;
}

/// Synthesizes text to a streamed PCM response. Dyn-compatible (the stream
/// itself is boxed) so adapters can be stored as trait objects.
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize_stream(
        &self,
        text: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<PcmStream>> + Send + '_>>;
}
