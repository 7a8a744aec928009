//! PlaybackStreamer: a persistent rodio output stream that drains PCM
//! chunks from the utterance processor, acquiring the duplex interlock for
//! the duration of each draining burst.
//!
//! The output stream is opened once for the engine's lifetime — closing it
//! between utterances would reintroduce startup jitter, which is exactly
//! what a persistent stream is for.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::interlock::DuplexInterlock;

/// Playback sample rate, matching the synthesizer's `pcm_16000` contract.
const PLAYBACK_SAMPLE_RATE: u32 = 16_000;

/// A chunk of raw signed-16-bit little-endian PCM, as delivered by a
/// synthesizer stream.
pub type PcmChunk = Vec<u8>;

/// Releases the interlock on drop, so a panic or early return mid-burst
/// can't leave the engine's own `isPlaying` flag or the shared latch stuck.
struct InterlockGuard<'a> {
    interlock: &'a DuplexInterlock,
    owner: &'a str,
    is_playing: &'a AtomicBool,
}

impl<'a> Drop for InterlockGuard<'a> {
    fn drop(&mut self) {
        self.is_playing.store(false, Ordering::SeqCst);
        self.interlock.release(self.owner);
    }
}

pub struct PlaybackStreamer {
    _stream: OutputStream,
    _stream_handle: OutputStreamHandle,
    sink: Arc<Sink>,
    is_playing: Arc<AtomicBool>,
    engine_name: String,
    interlock: DuplexInterlock,
}

// SAFETY: OutputStream/OutputStreamHandle are marked !Send/!Sync due to a
// PhantomData<*mut ()> in cpal's platform abstraction (the same rationale as
// the teacher's `AudioPlayer`). On Windows (WASAPI) the underlying COM
// handles are apartment-threaded, but we never call into the stream from two
// threads at once: `run` is the only method that touches `_stream`/
// `_stream_handle` (through `sink`), and it owns `&self` for its whole loop.
// `is_playing` is only ever read concurrently, via an atomic. Sharing the
// struct behind `Arc` across the playback and segmenter tasks is therefore
// safe even though cpal's own handle isn't thread-safe by construction.
unsafe impl Send for PlaybackStreamer {}
unsafe impl Sync for PlaybackStreamer {}

impl PlaybackStreamer {
    /// Open the named (or default) output device and build a persistent sink.
    pub fn new(
        device_name: Option<&str>,
        engine_name: impl Into<String>,
        interlock: DuplexInterlock,
    ) -> anyhow::Result<Self> {
        let (stream, stream_handle) = if let Some(name) = device_name {
            let host = cpal::default_host();
            let device = host
                .output_devices()
                .map_err(|e| anyhow::anyhow!("failed to enumerate output devices: {e}"))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false));

            match device {
                Some(dev) => {
                    info!(device = %name, "selected output device");
                    OutputStream::try_from_device(&dev)
                        .map_err(|e| anyhow::anyhow!("failed to open output device '{name}': {e}"))?
                }
                None => {
                    info!(requested = %name, "output device not found, falling back to default");
                    OutputStream::try_default()
                        .map_err(|e| anyhow::anyhow!("failed to open default audio output: {e}"))?
                }
            }
        } else {
            OutputStream::try_default()
                .map_err(|e| anyhow::anyhow!("failed to open audio output: {e}"))?
        };

        let sink = Sink::try_new(&stream_handle)
            .map_err(|e| anyhow::anyhow!("failed to create audio sink: {e}"))?;

        Ok(Self {
            _stream: stream,
            _stream_handle: stream_handle,
            sink: Arc::new(sink),
            is_playing: Arc::new(AtomicBool::new(false)),
            engine_name: engine_name.into(),
            interlock,
        })
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing.load(Ordering::SeqCst)
    }

    fn write_chunk(&self, chunk: &PcmChunk) {
        let samples: Vec<f32> = chunk
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
            .collect();
        self.sink.append(SamplesBuffer::new(1, PLAYBACK_SAMPLE_RATE, samples));
    }

    /// Drain `rx` until it closes (the engine's `Stop()`). Each contiguous
    /// burst of chunks is preceded by an interlock acquire and followed by
    /// a short settle sleep and release, per the draining contract.
    pub async fn run(&self, mut rx: mpsc::UnboundedReceiver<PcmChunk>) {
        loop {
            let first = match rx.recv().await {
                Some(chunk) => chunk,
                None => {
                    self.sink.stop();
                    return;
                }
            };

            self.interlock.acquire(&self.engine_name);
            self.is_playing.store(true, Ordering::SeqCst);
            let _guard = InterlockGuard {
                interlock: &self.interlock,
                owner: &self.engine_name,
                is_playing: &self.is_playing,
            };

            self.write_chunk(&first);

            // Drain whatever is already queued before settling; new chunks
            // keep arriving mid-utterance as the synthesizer streams.
            loop {
                match rx.try_recv() {
                    Ok(chunk) => self.write_chunk(&chunk),
                    Err(mpsc::error::TryRecvError::Empty) => {
                        sleep(Duration::from_millis(50)).await;
                        if self.sink.empty() {
                            break;
                        }
                    }
                    Err(mpsc::error::TryRecvError::Disconnected) => break,
                }
            }

            sleep(Duration::from_millis(100)).await;
            // _guard drops here: clears isPlaying and releases the interlock.
        }
    }
}
