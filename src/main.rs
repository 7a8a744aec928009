//! Duplex speech translator — binary entry point.
//!
//! Wires two [`EngineSupervisor`]s (`SENDER`, `RECEIVER`) with reversed
//! language polarity around one shared [`DuplexInterlock`], and forwards
//! the shared status sink to structured logs. This is the thin, non-GUI
//! consumer of the engine's status channel; a real GUI would subscribe to
//! the same channel shape instead.

mod audio;
mod config;
mod engine;
mod error;
mod interlock;
mod lang;
mod providers;
mod status;
mod vad;
mod wav;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::paths::get_data_dir;
use engine::{EngineConfig, EngineSupervisor};
use interlock::DuplexInterlock;
use lang::LangTag;
use providers::elevenlabs::{ElevenLabsRecognizer, ElevenLabsSynthesizer};
use providers::groq::GroqTranslator;

/// Default ElevenLabs voice, matching the reference implementation this
/// engine's wire contract is drawn from.
const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let data_dir = get_data_dir();
    let use_file = std::fs::create_dir_all(&data_dir).is_ok();

    let _guard: Option<tracing_appender::non_blocking::WorkerGuard>;
    if use_file {
        let file_appender = tracing_appender::rolling::never(&data_dir, "duplex-translator.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        _guard = Some(guard);
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(non_blocking)
            .with_ansi(false)
            .init();
    } else {
        _guard = None;
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let settings = config::read_config();
    info!("configuration loaded");

    let groq_key = settings.groq_api_key().ok_or_else(|| {
        anyhow::anyhow!("no Groq API key (set api_key_groq in config.json or GROQ_API_KEY)")
    })?;
    let elevenlabs_key = settings.elevenlabs_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "no ElevenLabs API key (set api_key_elevenlabs in config.json or ELEVENLABS_API_KEY)"
        )
    })?;

    let source_lang = settings
        .source_lang
        .as_deref()
        .and_then(LangTag::by_name)
        .unwrap_or_else(|| LangTag::by_name("English").unwrap());
    let target_lang = settings
        .target_lang
        .as_deref()
        .and_then(LangTag::by_name)
        .unwrap_or_else(|| LangTag::by_name("Urdu").unwrap());

    let live_inputs = audio::device::list_input_devices();
    let live_outputs = audio::device::list_output_devices();

    let resolve_input = |spec: &Option<String>| {
        spec.as_deref().and_then(|s| {
            let resolved = audio::device::resolve_device_name(s, &live_inputs);
            if resolved.is_none() {
                warn!(configured = %s, "configured input device no longer present, falling back to default");
            }
            resolved
        })
    };
    let resolve_output = |spec: &Option<String>| {
        spec.as_deref().and_then(|s| {
            let resolved = audio::device::resolve_device_name(s, &live_outputs);
            if resolved.is_none() {
                warn!(configured = %s, "configured output device no longer present, falling back to default");
            }
            resolved
        })
    };

    let sender_input = resolve_input(&settings.sender_input);
    let sender_output = resolve_output(&settings.sender_output);
    let receiver_input = resolve_input(&settings.receiver_input);
    let receiver_output = resolve_output(&settings.receiver_output);

    // One shared interlock and status sink for both engines — the dual
    // pipelines must never each construct their own.
    let interlock = DuplexInterlock::new();
    let (status_sink, status_rx) = status::StatusSink::new();
    tokio::spawn(status::forward_to_log(status_rx));

    let recognizer: Arc<dyn providers::SpeechRecognizer> =
        Arc::new(ElevenLabsRecognizer::new(elevenlabs_key.clone()));
    let translator: Arc<dyn providers::Translator> = Arc::new(GroqTranslator::new(groq_key));
    let synthesizer: Arc<dyn providers::SpeechSynthesizer> = Arc::new(ElevenLabsSynthesizer::new(
        elevenlabs_key,
        DEFAULT_VOICE_ID,
    ));

    let sender_config = EngineConfig {
        engine_name: "SENDER".to_string(),
        input_device: sender_input,
        output_device: sender_output,
        source_lang: source_lang.clone(),
        target_lang: target_lang.clone(),
        recognizer: Arc::clone(&recognizer),
        translator: Arc::clone(&translator),
        synthesizer: Arc::clone(&synthesizer),
        // A GUI would supply a VU-meter hook here; this binary has none.
        volume_callback: None,
    };

    // The receiver's languages are reversed: it hears the peer speaking
    // the target language and translates back into the source language.
    let receiver_config = EngineConfig {
        engine_name: "RECEIVER".to_string(),
        input_device: receiver_input,
        output_device: receiver_output,
        source_lang: target_lang,
        target_lang: source_lang,
        recognizer,
        translator,
        synthesizer,
        volume_callback: None,
    };

    let mut sender = EngineSupervisor::new(sender_config, interlock.clone(), status_sink.clone());
    let mut receiver = EngineSupervisor::new(receiver_config, interlock, status_sink);

    if let Err(e) = sender.start() {
        error!(error = %e, "SENDER failed to start");
    }
    if let Err(e) = receiver.start() {
        error!(error = %e, "RECEIVER failed to start");
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => warn!(error = %e, "failed to listen for shutdown signal"),
    }

    sender.stop().await;
    receiver.stop().await;

    Ok(())
}
