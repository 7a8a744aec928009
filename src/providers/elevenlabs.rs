//! ElevenLabs-style recognizer and streaming synthesizer adapters.
//!
//! STT: multipart upload to a speech-to-text endpoint, `model_id=scribe_v1`.
//! TTS: a streaming POST returning raw `pcm_16000` chunks as the response
//! body arrives — never buffered whole, so the first chunk reaches the
//! playback queue as soon as it's read off the socket.

use futures_util::StreamExt;
use reqwest::multipart;
use tracing::{debug, info};

use super::{PcmStream, RecognizeOptions, SpeechRecognizer, SpeechSynthesizer, Transcript};
use crate::lang::LangTag;
use crate::wav;

const STT_ENDPOINT: &str = "https://api.elevenlabs.io/v1/speech-to-text";
const STT_MODEL: &str = "scribe_v1";
const TTS_MODEL: &str = "eleven_turbo_v2_5";

pub struct ElevenLabsRecognizer {
    api_key: String,
    client: reqwest::Client,
}

impl ElevenLabsRecognizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl SpeechRecognizer for ElevenLabsRecognizer {
    fn recognize<'a>(
        &'a self,
        utterance_wav: &'a [u8],
        source_lang: &'a LangTag,
        options: &'a RecognizeOptions,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<Transcript>> + Send + 'a>>
    {
        Box::pin(async move {
            debug!(bytes = utterance_wav.len(), lang = %source_lang.code, "sending utterance to ElevenLabs STT");

            let file_part = multipart::Part::bytes(utterance_wav.to_vec())
                .file_name("utterance.wav")
                .mime_str("audio/wav")?;

            let mut form = multipart::Form::new()
                .text("model_id", STT_MODEL)
                .text("language_code", source_lang.code.clone())
                .text("tag_audio_events", options.tag_audio_events.to_string())
                .part("file", file_part);

            if let Some(prompt) = &options.prompt {
                form = form.text("prompt", prompt.clone());
            }

            let resp = self
                .client
                .post(STT_ENDPOINT)
                .header("xi-api-key", &self.api_key)
                .multipart(form)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("ElevenLabs STT request failed: {e}"))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("ElevenLabs STT API error {status}: {body}");
            }

            let json: serde_json::Value = resp
                .json()
                .await
                .map_err(|e| anyhow::anyhow!("ElevenLabs STT response was not JSON: {e}"))?;

            let text = json["text"].as_str().unwrap_or("").trim().to_string();

            Ok(Transcript {
                text,
                source_lang: source_lang.clone(),
            })
        })
    }
}

pub struct ElevenLabsSynthesizer {
    api_key: String,
    voice_id: String,
    client: reqwest::Client,
}

impl ElevenLabsSynthesizer {
    pub fn new(api_key: impl Into<String>, voice_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            voice_id: voice_id.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl SpeechSynthesizer for ElevenLabsSynthesizer {
    fn synthesize_stream(
        &self,
        text: &str,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = anyhow::Result<PcmStream>> + Send + '_>>
    {
        let text = text.to_string();
        Box::pin(async move {
            info!(voice = %self.voice_id, text_len = text.len(), "ElevenLabs TTS streaming request");

            let url = format!(
                "https://api.elevenlabs.io/v1/text-to-speech/{}/stream",
                self.voice_id
            );

            let body = serde_json::json!({
                "text": text,
                "model_id": TTS_MODEL,
            });

            let resp = self
                .client
                .post(&url)
                .query(&[("output_format", "pcm_16000")])
                .header("xi-api-key", &self.api_key)
                .json(&body)
                .send()
                .await
                .map_err(|e| anyhow::anyhow!("ElevenLabs TTS request failed: {e}"))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                anyhow::bail!("ElevenLabs TTS API error {status}: {body}");
            }

            let stream = resp.bytes_stream().map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| anyhow::anyhow!("ElevenLabs TTS stream read failed: {e}"))
            });

            Ok(Box::pin(stream) as PcmStream)
        })
    }
}

/// Encode an utterance's samples into the WAV buffer this recognizer expects.
pub fn encode_utterance(samples: &[i16]) -> Vec<u8> {
    wav::encode_wav(samples, crate::audio::SAMPLE_RATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_utterance_to_valid_wav_header() {
        let samples = vec![0i16; 480];
        let wav = encode_utterance(&samples);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
    }
}
