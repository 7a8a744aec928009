//! Audio capture via cpal.
//!
//! Opens the named (or default) input device, captures audio at its native
//! sample rate, resamples to 16 kHz mono if needed, and delivers fixed
//! 480-sample (30 ms) [`AudioFrame`]s to a ring buffer for the segmenter to
//! poll. The callback itself never blocks and never touches the ring
//! buffer's consumer half.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{error, info};

use super::frame::{FRAME_SAMPLES, SAMPLE_RATE};
use super::ring_buffer::AudioProducer;
use crate::error::EngineError;

/// Resolved info about the audio input we will use.
struct CaptureConfig {
    device: cpal::Device,
    stream_config: StreamConfig,
    native_rate: u32,
}

/// Find and configure the input device. `device_name` of `None` uses the
/// host's default input.
fn resolve_device(device_name: Option<&str>) -> Result<CaptureConfig, EngineError> {
    let host = cpal::default_host();

    let device = if let Some(name) = device_name {
        host.input_devices()
            .map_err(|e| EngineError::DeviceUnavailable(format!("enumerate input devices: {e}")))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| EngineError::DeviceUnavailable(format!("input device not found: {name}")))?
    } else {
        host.default_input_device()
            .ok_or_else(|| EngineError::DeviceUnavailable("no default input device available".into()))?
    };

    let dev_name = device.name().unwrap_or_else(|_| "unknown".into());
    info!(device = %dev_name, "selected input device");

    let default_config = device.default_input_config().map_err(|e| {
        EngineError::DeviceUnavailable(format!("default input config: {e}"))
    })?;

    let native_rate = default_config.sample_rate().0;
    let channels = default_config.channels();

    let stream_config = StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(native_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    info!(native_rate, channels, target = SAMPLE_RATE, "input device config resolved");

    Ok(CaptureConfig {
        device,
        stream_config,
        native_rate,
    })
}

/// Simple linear resampler from `from_rate` to `to_rate`. Operates on mono
/// f32 samples.
fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return input.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).floor() as usize;
    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src_idx = i as f64 * ratio;
        let idx0 = src_idx.floor() as usize;
        let frac = (src_idx - idx0 as f64) as f32;
        let s0 = input.get(idx0).copied().unwrap_or(0.0);
        let s1 = input.get(idx0 + 1).copied().unwrap_or(s0);
        output.push(s0 + frac * (s1 - s0));
    }
    output
}

/// Down-mix multi-channel audio to mono by averaging channels.
fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Start audio capture. Returns the cpal `Stream` (must be kept alive for
/// capture to continue; dropping it stops the stream, which is this
/// module's `close()`).
///
/// Samples are resampled to 16 kHz mono, accumulated into exact
/// `FRAME_SAMPLES`-sample (30 ms) frames, and pushed into the ring buffer
/// producer — the segmenter's hysteresis counters assume this exact cadence.
///
/// `device_failed` is set if the stream's own error callback fires after a
/// successful open — e.g. the device disappearing mid-run (unplugged, OS
/// reclaimed it). That case can't surface as a `Result::Err` here since the
/// stream already opened; the supervisor's segmenter loop polls the flag
/// instead and transitions to `Stopped` with `CaptureFailed`.
pub fn start_capture(
    mut producer: AudioProducer,
    device_name: Option<&str>,
    device_failed: Arc<AtomicBool>,
) -> Result<Stream, EngineError> {
    let cfg = resolve_device(device_name)?;
    let native_rate = cfg.native_rate;
    let channels = cfg.stream_config.channels;
    let needs_resample = native_rate != SAMPLE_RATE;
    let needs_downmix = channels > 1;

    let mut chunk_buf: Vec<i16> = Vec::with_capacity(FRAME_SAMPLES * 2);

    let stream = cfg
        .device
        .build_input_stream(
            &cfg.stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let mono = if needs_downmix { to_mono(data, channels) } else { data.to_vec() };
                let resampled = if needs_resample {
                    resample_linear(&mono, native_rate, SAMPLE_RATE)
                } else {
                    mono
                };

                chunk_buf.extend_from_slice(&to_i16(&resampled));
                while chunk_buf.len() >= FRAME_SAMPLES {
                    let chunk: Vec<i16> = chunk_buf.drain(..FRAME_SAMPLES).collect();
                    let written = producer.push_frame(chunk);
                    if !written {
                        // Ring buffer full: oldest audio is lost, consumer will catch up.
                    }
                }
            },
            move |err| {
                error!("audio input stream error: {err}");
                device_failed.store(true, Ordering::Release);
            },
            None,
        )
        .map_err(|e| EngineError::CaptureFailed(format!("build input stream: {e}")))?;

    stream
        .play()
        .map_err(|e| EngineError::CaptureFailed(format!("start input stream: {e}")))?;

    info!("audio capture started");

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resample_identity_when_rates_match() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&input, 16_000, 16_000), input);
    }

    #[test]
    fn resample_halves_length_at_half_rate() {
        let input: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let out = resample_linear(&input, 32_000, 16_000);
        assert_eq!(out.len(), 50);
    }

    #[test]
    fn to_mono_averages_stereo_channels() {
        let stereo = vec![1.0, -1.0, 0.5, 0.5];
        let mono = to_mono(&stereo, 2);
        assert_eq!(mono, vec![0.0, 0.5]);
    }

    #[test]
    fn to_mono_passes_through_single_channel() {
        let mono_in = vec![0.1, 0.2, 0.3];
        assert_eq!(to_mono(&mono_in, 1), mono_in);
    }

    #[test]
    fn to_i16_clamps_and_scales_full_scale() {
        let samples = vec![1.0, -1.0, 0.0, 2.0];
        let out = to_i16(&samples);
        assert_eq!(out[0], i16::MAX);
        assert_eq!(out[2], 0);
        assert_eq!(out[3], i16::MAX);
    }
}
