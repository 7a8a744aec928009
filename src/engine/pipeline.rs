//! UtteranceProcessor: the per-utterance STT → filter → MT → streaming-TTS
//! pipeline that drains one engine's utterance queue.

use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::audio::{Utterance, SAMPLE_RATE};
use crate::error::EngineError;
use crate::lang::LangTag;
use crate::providers::{RecognizeOptions, SpeechRecognizer, SpeechSynthesizer, Translator};
use crate::status::StatusSink;
use crate::wav;

/// Text the filter drops without ever reaching translation — captioning
/// artifacts and conversational filler that STT models commonly hallucinate
/// on near-silent audio.
pub const FILTERED_PHRASES: &[&str] = &[
    ".",
    "...",
    "?",
    "!",
    "you",
    "thank you",
    "subtitles",
    "watching",
    "video",
    "subscribe",
    "notification",
    "copyright",
];

/// Minimum trimmed length (in chars) for a transcript to survive the filter.
pub const MIN_TRANSCRIPT_LEN: usize = 2;

/// True if `text` should be dropped before it ever reaches translation.
pub fn should_filter(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() < MIN_TRANSCRIPT_LEN {
        return true;
    }
    if trimmed.starts_with('(') {
        return true;
    }
    FILTERED_PHRASES.contains(&trimmed.to_lowercase().as_str())
}

pub struct UtteranceProcessor {
    pub engine_name: String,
    pub source_lang: LangTag,
    pub target_lang: LangTag,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub status: StatusSink,
}

impl UtteranceProcessor {
    /// Drain `utterance_rx` until it closes, pushing synthesized PCM onto
    /// `playback_tx`. Never terminates on its own — every error is caught,
    /// logged, and followed by a bounded backoff.
    pub async fn run(
        &self,
        mut utterance_rx: mpsc::UnboundedReceiver<Utterance>,
        playback_tx: mpsc::UnboundedSender<Vec<u8>>,
    ) {
        while let Some(utterance) = utterance_rx.recv().await {
            if let Err(e) = self.process(utterance, &playback_tx).await {
                let is_per_utterance = e.downcast_ref::<EngineError>().is_some();
                self.status.publish(format!(
                    "⚠️ Connection Glitch: {e}. Retrying..."
                ));
                warn!(engine = %self.engine_name, error = %e, "utterance processing failed");
                let backoff = if is_per_utterance { 2 } else { 5 };
                sleep(Duration::from_secs(backoff)).await;
            }
        }
    }

    async fn process(
        &self,
        utterance: Utterance,
        playback_tx: &mpsc::UnboundedSender<Vec<u8>>,
    ) -> anyhow::Result<()> {
        let total_start = Instant::now();
        let samples = utterance.samples();
        let wav_bytes = wav::encode_wav(&samples, SAMPLE_RATE);

        let stt_start = Instant::now();
        let transcript = self
            .recognizer
            .recognize(&wav_bytes, &self.source_lang, &RecognizeOptions::default())
            .await
            .map_err(|e| EngineError::RecognizerError(e.to_string()))?;
        let stt_ms = stt_start.elapsed().as_millis();

        if should_filter(&transcript.text) {
            debug!(engine = %self.engine_name, text = %transcript.text, "utterance filtered");
            return Ok(());
        }

        let mt_start = Instant::now();
        let translated = self
            .translator
            .translate(&transcript.text, &self.target_lang)
            .await
            .map_err(|e| EngineError::TranslatorError(e.to_string()))?;
        let mt_ms = mt_start.elapsed().as_millis();

        if translated.trim().is_empty() {
            debug!(engine = %self.engine_name, "translation empty, dropping utterance");
            return Ok(());
        }

        self.status.publish(format!(
            "[{}] Original: {} -> Translated: {}",
            self.engine_name, transcript.text, translated
        ));

        let tts_start = Instant::now();
        let mut stream = self
            .synthesizer
            .synthesize_stream(&translated)
            .await
            .map_err(|e| EngineError::SynthesizerError(e.to_string()))?;

        let mut ttfb_ms = None;
        let mut chunk_count = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| EngineError::SynthesizerError(e.to_string()))?;
            if ttfb_ms.is_none() {
                ttfb_ms = Some(tts_start.elapsed().as_millis());
            }
            chunk_count += 1;
            if playback_tx.send(chunk).is_err() {
                // Playback side has shut down; truncate rather than retry mid-utterance.
                break;
            }
        }

        info!(
            engine = %self.engine_name,
            stt_ms,
            mt_ms,
            tts_ttfb_ms = ttfb_ms.unwrap_or(0),
            total_ms = total_start.elapsed().as_millis(),
            chunks = chunk_count,
            "utterance processed"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_bare_punctuation() {
        assert!(should_filter("."));
        assert!(should_filter("..."));
        assert!(should_filter("?"));
    }

    #[test]
    fn filters_known_filler_phrases_case_insensitively() {
        assert!(should_filter("Thank You"));
        assert!(should_filter("SUBSCRIBE"));
    }

    #[test]
    fn filters_bracketed_events() {
        assert!(should_filter("(applause)"));
        assert!(should_filter("(music)"));
    }

    #[test]
    fn filters_short_transcripts() {
        assert!(should_filter("a"));
        assert!(should_filter(""));
        assert!(should_filter("   "));
    }

    #[test]
    fn keeps_real_speech() {
        assert!(!should_filter("hello, how are you doing today"));
    }

    use crate::audio::{AudioFrame, FRAME_SAMPLES};
    use crate::providers::{PcmStream, RecognizeOptions, Transcript};
    use futures_util::stream;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;
    use tokio::sync::mpsc;

    struct MockRecognizer {
        text: String,
    }

    impl SpeechRecognizer for MockRecognizer {
        fn recognize<'a>(
            &'a self,
            _utterance_wav: &'a [u8],
            source_lang: &'a LangTag,
            _options: &'a RecognizeOptions,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<Transcript>> + Send + 'a>> {
            Box::pin(async move {
                Ok(Transcript {
                    text: self.text.clone(),
                    source_lang: source_lang.clone(),
                })
            })
        }
    }

    struct FailingRecognizer;

    impl SpeechRecognizer for FailingRecognizer {
        fn recognize<'a>(
            &'a self,
            _utterance_wav: &'a [u8],
            _source_lang: &'a LangTag,
            _options: &'a RecognizeOptions,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<Transcript>> + Send + 'a>> {
            Box::pin(async move { anyhow::bail!("simulated STT outage") })
        }
    }

    struct EchoTranslator;

    impl Translator for EchoTranslator {
        fn translate<'a>(
            &'a self,
            text: &'a str,
            target_lang: &'a LangTag,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
            Box::pin(async move { Ok(format!("[{}] {}", target_lang.code, text)) })
        }
    }

    struct ChunkSynthesizer {
        chunks: Vec<Vec<u8>>,
    }

    impl SpeechSynthesizer for ChunkSynthesizer {
        fn synthesize_stream(
            &self,
            _text: &str,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<PcmStream>> + Send + '_>> {
            let chunks = self.chunks.clone();
            Box::pin(async move {
                let items: Vec<anyhow::Result<Vec<u8>>> =
                    chunks.into_iter().map(Ok).collect();
                Ok(Box::pin(stream::iter(items)) as PcmStream)
            })
        }
    }

    fn test_utterance() -> Utterance {
        let now = Instant::now();
        Utterance {
            frames: vec![AudioFrame {
                samples: vec![1000i16; FRAME_SAMPLES],
                captured_at: now,
            }],
            start: now,
            end: now,
        }
    }

    fn processor(
        recognizer: Arc<dyn SpeechRecognizer>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> UtteranceProcessor {
        let (status, _rx) = StatusSink::new();
        UtteranceProcessor {
            engine_name: "TEST".to_string(),
            source_lang: LangTag::by_name("English").unwrap(),
            target_lang: LangTag::by_name("Urdu").unwrap(),
            recognizer,
            translator,
            synthesizer,
            status,
        }
    }

    #[tokio::test]
    async fn processes_utterance_and_streams_translated_audio() {
        let proc = processor(
            Arc::new(MockRecognizer {
                text: "hello there".to_string(),
            }),
            Arc::new(EchoTranslator),
            Arc::new(ChunkSynthesizer {
                chunks: vec![vec![1, 2, 3], vec![4, 5, 6]],
            }),
        );
        let (playback_tx, mut playback_rx) = mpsc::unbounded_channel();

        proc.process(test_utterance(), &playback_tx).await.unwrap();

        let first = playback_rx.recv().await.unwrap();
        let second = playback_rx.recv().await.unwrap();
        assert_eq!(first, vec![1, 2, 3]);
        assert_eq!(second, vec![4, 5, 6]);
    }

    #[tokio::test]
    async fn filtered_transcript_never_reaches_translator_or_playback() {
        let translate_calls = Arc::new(AtomicUsize::new(0));

        struct CountingTranslator(Arc<AtomicUsize>);
        impl Translator for CountingTranslator {
            fn translate<'a>(
                &'a self,
                text: &'a str,
                _target_lang: &'a LangTag,
            ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
                Box::pin(async move {
                    self.0.fetch_add(1, Ordering::SeqCst);
                    Ok(text.to_string())
                })
            }
        }

        let proc = processor(
            Arc::new(MockRecognizer {
                text: "thank you".to_string(),
            }),
            Arc::new(CountingTranslator(Arc::clone(&translate_calls))),
            Arc::new(ChunkSynthesizer { chunks: vec![] }),
        );
        let (playback_tx, mut playback_rx) = mpsc::unbounded_channel();

        proc.process(test_utterance(), &playback_tx).await.unwrap();

        assert_eq!(translate_calls.load(Ordering::SeqCst), 0);
        assert!(playback_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn recognizer_failure_surfaces_as_engine_error() {
        let proc = processor(
            Arc::new(FailingRecognizer),
            Arc::new(EchoTranslator),
            Arc::new(ChunkSynthesizer { chunks: vec![] }),
        );
        let (playback_tx, _playback_rx) = mpsc::unbounded_channel();

        let err = proc.process(test_utterance(), &playback_tx).await.unwrap_err();
        assert!(err.downcast_ref::<EngineError>().is_some());
    }

    #[tokio::test]
    async fn translator_failure_surfaces_as_engine_error() {
        struct FailingTranslator;
        impl Translator for FailingTranslator {
            fn translate<'a>(
                &'a self,
                _text: &'a str,
                _target_lang: &'a LangTag,
            ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
                Box::pin(async move { anyhow::bail!("simulated MT outage") })
            }
        }

        let proc = processor(
            Arc::new(MockRecognizer {
                text: "good morning everyone".to_string(),
            }),
            Arc::new(FailingTranslator),
            Arc::new(ChunkSynthesizer { chunks: vec![] }),
        );
        let (playback_tx, _playback_rx) = mpsc::unbounded_channel();

        let err = proc.process(test_utterance(), &playback_tx).await.unwrap_err();
        assert!(err.downcast_ref::<EngineError>().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn run_backs_off_two_seconds_after_a_failed_utterance_then_recovers() {
        struct FlakyRecognizer(AtomicUsize);
        impl SpeechRecognizer for FlakyRecognizer {
            fn recognize<'a>(
                &'a self,
                _utterance_wav: &'a [u8],
                source_lang: &'a LangTag,
                _options: &'a RecognizeOptions,
            ) -> Pin<Box<dyn Future<Output = anyhow::Result<Transcript>> + Send + 'a>> {
                Box::pin(async move {
                    if self.0.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("simulated transient STT outage")
                    }
                    Ok(Transcript {
                        text: "good morning everyone".to_string(),
                        source_lang: source_lang.clone(),
                    })
                })
            }
        }

        let proc = Arc::new(processor(
            Arc::new(FlakyRecognizer(AtomicUsize::new(0))),
            Arc::new(EchoTranslator),
            Arc::new(ChunkSynthesizer {
                chunks: vec![vec![7]],
            }),
        ));
        let (utterance_tx, utterance_rx) = mpsc::unbounded_channel();
        let (playback_tx, mut playback_rx) = mpsc::unbounded_channel();

        utterance_tx.send(test_utterance()).unwrap();
        utterance_tx.send(test_utterance()).unwrap();
        drop(utterance_tx);

        let run = tokio::spawn({
            let proc = Arc::clone(&proc);
            async move { proc.run(utterance_rx, playback_tx).await }
        });

        let chunk = tokio::time::timeout(Duration::from_secs(10), playback_rx.recv())
            .await
            .expect("run should have advanced past the 2s backoff under a paused clock")
            .expect("second utterance should have produced a playback chunk");
        assert_eq!(chunk, vec![7]);

        run.await.unwrap();
    }

    #[tokio::test]
    async fn run_drains_queue_and_exits_once_channel_closes() {
        let proc = processor(
            Arc::new(MockRecognizer {
                text: "good morning everyone".to_string(),
            }),
            Arc::new(EchoTranslator),
            Arc::new(ChunkSynthesizer {
                chunks: vec![vec![9, 9]],
            }),
        );
        let (utterance_tx, utterance_rx) = mpsc::unbounded_channel();
        let (playback_tx, mut playback_rx) = mpsc::unbounded_channel();

        utterance_tx.send(test_utterance()).unwrap();
        drop(utterance_tx);

        proc.run(utterance_rx, playback_tx).await;

        assert_eq!(playback_rx.recv().await.unwrap(), vec![9, 9]);
    }
}
