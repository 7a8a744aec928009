//! Voice activity segmentation.
//!
//! Turns a continuous frame stream into discrete [`Utterance`]s using a
//! mode-3 (aggressive) WebRTC-VAD decision per frame, with hysteresis on the
//! trailing silence and an RMS floor applied after segmentation.

use webrtc_vad::{SampleRate, Vad, VadMode};

use crate::audio::frame::{AudioFrame, Utterance};
use crate::interlock::DuplexInterlock;

/// Trailing silence frames required to close an utterance: ~1000 ms at 30 ms/frame.
pub const END_SILENCE_FRAMES: usize = 33;

/// Utterances whose RMS amplitude falls below this (full-scale fraction)
/// are dropped after segmentation, even if VAD flagged speech.
pub const SILENCE_RMS: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Speaking,
}

/// Per-engine segmenter. Not `Sync` — one instance is owned by the capture
/// side of a single engine and driven frame-by-frame.
pub struct VoiceActivitySegmenter {
    vad: Vad,
    state: State,
    buffer: Vec<AudioFrame>,
    silence_run: usize,
}

impl VoiceActivitySegmenter {
    pub fn new() -> Self {
        let vad = Vad::new_with_rate_and_mode(SampleRate::Rate16kHz, VadMode::Aggressive);
        Self {
            vad,
            state: State::Idle,
            buffer: Vec::new(),
            silence_run: 0,
        }
    }

    /// Feed one frame. `is_playing` is this engine's own playback flag;
    /// combined with the shared interlock, either one silences capture.
    ///
    /// Returns `Some(Utterance)` when a trailing silence run closes out a
    /// buffered utterance and it survives the RMS floor.
    pub fn process_frame(
        &mut self,
        frame: AudioFrame,
        interlock: &DuplexInterlock,
        is_playing: bool,
    ) -> Option<Utterance> {
        if interlock.held() || is_playing {
            self.reset();
            return None;
        }

        let is_speech = self.vad.is_voice_segment(&frame.samples).unwrap_or_else(|_| {
            tracing::debug!("VAD classification failed on frame; treating as silence");
            false
        });

        match self.state {
            State::Idle => {
                if is_speech {
                    self.state = State::Speaking;
                    self.silence_run = 0;
                    self.buffer.push(frame);
                }
                None
            }
            State::Speaking => {
                self.buffer.push(frame);
                if is_speech {
                    self.silence_run = 0;
                } else {
                    self.silence_run += 1;
                }

                if self.silence_run >= END_SILENCE_FRAMES {
                    self.close_utterance()
                } else {
                    None
                }
            }
        }
    }

    /// Discard any in-progress buffer without emitting it. Called on
    /// interlock override and on `close()` while still `Speaking` — a
    /// partial utterance must never be flushed later.
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.buffer.clear();
        self.silence_run = 0;
    }

    /// Stop the segmenter. Any buffered frames are discarded, not flushed.
    pub fn close(&mut self) {
        self.reset();
    }

    fn close_utterance(&mut self) -> Option<Utterance> {
        let frames = std::mem::take(&mut self.buffer);
        self.state = State::Idle;
        self.silence_run = 0;

        let start = frames.first()?.captured_at;
        let end = frames.last().map(|f| f.captured_at).unwrap_or(start);
        let utterance = Utterance { frames, start, end };

        if utterance.rms() < SILENCE_RMS {
            tracing::debug!("utterance dropped below SILENCE_RMS floor");
            None
        } else {
            Some(utterance)
        }
    }
}

impl Default for VoiceActivitySegmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silence_frame() -> AudioFrame {
        AudioFrame::new(vec![0i16; crate::audio::frame::FRAME_SAMPLES])
    }

    fn loud_frame() -> AudioFrame {
        AudioFrame::new(vec![20_000i16; crate::audio::frame::FRAME_SAMPLES])
    }

    #[test]
    fn pure_silence_produces_zero_utterances() {
        let mut seg = VoiceActivitySegmenter::new();
        let interlock = DuplexInterlock::new();
        for _ in 0..100 {
            assert!(seg.process_frame(silence_frame(), &interlock, false).is_none());
        }
    }

    #[test]
    fn interlock_held_resets_and_discards() {
        let mut seg = VoiceActivitySegmenter::new();
        let interlock = DuplexInterlock::new();
        interlock.acquire("SENDER");
        // Feed loud frames while held; the segmenter must stay IDLE and
        // never accumulate a partial buffer.
        for _ in 0..10 {
            assert!(seg.process_frame(loud_frame(), &interlock, false).is_none());
        }
        assert_eq!(seg.state, State::Idle);
        assert!(seg.buffer.is_empty());
    }

    #[test]
    fn close_while_speaking_discards_buffer() {
        let mut seg = VoiceActivitySegmenter::new();
        let interlock = DuplexInterlock::new();
        seg.process_frame(loud_frame(), &interlock, false);
        assert_eq!(seg.state, State::Speaking);
        seg.close();
        assert_eq!(seg.state, State::Idle);
        assert!(seg.buffer.is_empty());
    }
}
