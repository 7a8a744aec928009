//! Lock-free SPSC queue of whole [`AudioFrame`]s.
//!
//! Uses the `ringbuf` crate so the cpal callback thread can hand frames to
//! the segmenter without a lock. Frames (not raw samples) are the unit
//! here: capture already assembles exact 30 ms chunks, so the queue never
//! needs to worry about partial frames.

use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapRb,
};

use super::frame::AudioFrame;

/// Default capacity: ~10 seconds of 30 ms frames.
const DEFAULT_CAPACITY: usize = 333;

/// Producer half — lives in the cpal audio callback thread.
pub struct AudioProducer {
    inner: ringbuf::HeapProd<AudioFrame>,
}

/// Consumer half — lives in the segmenter's task.
pub struct AudioConsumer {
    inner: ringbuf::HeapCons<AudioFrame>,
}

/// Create a matched producer/consumer pair backed by a lock-free ring buffer.
pub fn audio_ring_buffer(capacity: Option<usize>) -> (AudioProducer, AudioConsumer) {
    let cap = capacity.unwrap_or(DEFAULT_CAPACITY);
    let rb = HeapRb::<AudioFrame>::new(cap);
    let (prod, cons) = rb.split();
    (AudioProducer { inner: prod }, AudioConsumer { inner: cons })
}

impl AudioProducer {
    /// Push one frame. Returns `false` (frame dropped) if the buffer is full.
    pub fn push_frame(&mut self, samples: Vec<i16>) -> bool {
        self.inner.try_push(AudioFrame::new(samples)).is_ok()
    }
}

// Safety: the ringbuf producer is designed to be used from a single thread.
// cpal callbacks run on a dedicated audio thread, so this is fine.
unsafe impl Send for AudioProducer {}

impl AudioConsumer {
    /// Pop the next available frame, if any.
    pub fn pop_frame(&mut self) -> Option<AudioFrame> {
        self.inner.try_pop()
    }

    /// Number of frames currently queued.
    pub fn available(&self) -> usize {
        self.inner.occupied_len()
    }
}

unsafe impl Send for AudioConsumer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pushed_frames_pop_in_order() {
        let (mut producer, mut consumer) = audio_ring_buffer(Some(4));
        assert!(producer.push_frame(vec![1, 2, 3]));
        assert!(producer.push_frame(vec![4, 5, 6]));
        assert_eq!(consumer.available(), 2);
        assert_eq!(consumer.pop_frame().unwrap().samples, vec![1, 2, 3]);
        assert_eq!(consumer.pop_frame().unwrap().samples, vec![4, 5, 6]);
        assert!(consumer.pop_frame().is_none());
    }

    #[test]
    fn full_buffer_drops_frame_and_reports_false() {
        let (mut producer, consumer) = audio_ring_buffer(Some(2));
        assert!(producer.push_frame(vec![1]));
        assert!(producer.push_frame(vec![2]));
        assert!(!producer.push_frame(vec![3]));
        assert_eq!(consumer.available(), 2);
    }
}
