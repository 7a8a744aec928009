//! One translation pipeline: capture → segment → process → play back.

pub mod pipeline;
pub mod supervisor;

use std::sync::Arc;

use crate::lang::LangTag;
use crate::providers::{SpeechRecognizer, SpeechSynthesizer, Translator};

pub use supervisor::{EngineSupervisor, SupervisorState};

/// Immutable configuration an [`EngineSupervisor`] is constructed from.
/// `engine_name` is `"SENDER"` or `"RECEIVER"` for logging and interlock
/// attribution; the two engines in a run share everything except this,
/// the device pair, and the (reversed) language pair.
pub struct EngineConfig {
    pub engine_name: String,
    pub input_device: Option<String>,
    pub output_device: Option<String>,
    pub source_lang: LangTag,
    pub target_lang: LangTag,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    /// Optional VU-meter hook: invoked with each captured frame's normalized
    /// `[0, 1]` RMS level. A GUI consumes this; the engine itself never
    /// reads it back.
    pub volume_callback: Option<Arc<dyn Fn(f32) + Send + Sync>>,
}
