//! Minimal WAV encode/decode for mono 16-bit PCM.
//!
//! The only container format the engine needs: wrapping a captured
//! utterance's samples for upload to a speech recognizer.

/// Encode i16 PCM samples as a 44-byte-header RIFF/WAVE file.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let num_samples = samples.len() as u32;
    let bytes_per_sample: u16 = 2;
    let num_channels: u16 = 1;
    let data_size = num_samples * bytes_per_sample as u32;
    let file_size = 36 + data_size;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate * num_channels as u32 * bytes_per_sample as u32;
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    let block_align = num_channels * bytes_per_sample;
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&(bytes_per_sample * 8).to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

/// Decode a WAV file produced by [`encode_wav`] back into i16 samples.
/// Only supports the exact shape we produce (PCM, 16-bit, mono); anything
/// else is a caller bug, not a runtime condition to recover from.
pub fn decode_wav(bytes: &[u8]) -> anyhow::Result<Vec<i16>> {
    anyhow::ensure!(bytes.len() >= 44, "WAV buffer shorter than a header");
    anyhow::ensure!(&bytes[0..4] == b"RIFF", "missing RIFF tag");
    anyhow::ensure!(&bytes[8..12] == b"WAVE", "missing WAVE tag");
    anyhow::ensure!(&bytes[12..16] == b"fmt ", "missing fmt chunk");
    anyhow::ensure!(&bytes[36..40] == b"data", "missing data chunk");

    let data_size = u32::from_le_bytes(bytes[40..44].try_into().unwrap()) as usize;
    let data = &bytes[44..44 + data_size];
    Ok(data
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect())
}
