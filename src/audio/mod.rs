//! Audio capture, playback, framing, and device resolution.

pub mod capture;
pub mod device;
pub mod frame;
pub mod playback;
pub mod ring_buffer;

pub use capture::start_capture;
pub use frame::{AudioFrame, Utterance, FRAME_SAMPLES, SAMPLE_RATE};
pub use playback::{PcmChunk, PlaybackStreamer};
pub use ring_buffer::{audio_ring_buffer, AudioConsumer, AudioProducer};
