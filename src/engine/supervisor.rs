//! EngineSupervisor: owns one pipeline's capture, processing, and playback
//! activities, and their `CONSTRUCTED → RUNNING → STOPPING → STOPPED`
//! lifecycle.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::audio::{audio_ring_buffer, start_capture, PlaybackStreamer, Utterance};
use crate::interlock::DuplexInterlock;
use crate::status::StatusSink;
use crate::vad::VoiceActivitySegmenter;

use super::pipeline::UtteranceProcessor;
use super::EngineConfig;

/// Lifecycle states. No restart: a `Stopped` supervisor is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SupervisorState {
    Constructed = 0,
    Running = 1,
    Stopping = 2,
    Stopped = 3,
}

impl SupervisorState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Running,
            2 => Self::Stopping,
            3 => Self::Stopped,
            _ => Self::Constructed,
        }
    }
}

struct RunningTasks {
    capture_thread: std::thread::JoinHandle<()>,
    segmenter_task: JoinHandle<()>,
    processor_task: JoinHandle<()>,
    playback_task: JoinHandle<()>,
}

pub struct EngineSupervisor {
    config: EngineConfig,
    interlock: DuplexInterlock,
    status: StatusSink,
    state: Arc<AtomicU8>,
    shutdown: Arc<AtomicBool>,
    device_failed: Arc<AtomicBool>,
    running: Option<RunningTasks>,
}

impl EngineSupervisor {
    pub fn new(config: EngineConfig, interlock: DuplexInterlock, status: StatusSink) -> Self {
        Self {
            config,
            interlock,
            status,
            state: Arc::new(AtomicU8::new(SupervisorState::Constructed as u8)),
            shutdown: Arc::new(AtomicBool::new(false)),
            device_failed: Arc::new(AtomicBool::new(false)),
            running: None,
        }
    }

    pub fn state(&self) -> SupervisorState {
        SupervisorState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Spin up capture, processing, and playback. Idempotent: calling
    /// `start` on an already-running supervisor is a no-op.
    pub fn start(&mut self) -> anyhow::Result<()> {
        if self
            .state
            .compare_exchange(
                SupervisorState::Constructed as u8,
                SupervisorState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Ok(());
        }

        let (producer, mut consumer) = audio_ring_buffer(None);
        let (utterance_tx, utterance_rx) = mpsc::unbounded_channel::<Utterance>();
        let (playback_tx, playback_rx) = mpsc::unbounded_channel::<Vec<u8>>();

        let device_failed = Arc::clone(&self.device_failed);
        let status_for_capture = self.status.clone();
        let engine_name = self.config.engine_name.clone();
        let input_device = self.config.input_device.clone();
        let capture_shutdown = Arc::clone(&self.shutdown);

        let capture_thread = std::thread::spawn(move || {
            match start_capture(producer, input_device.as_deref(), Arc::clone(&device_failed)) {
                Ok(stream) => {
                    while !capture_shutdown.load(Ordering::Acquire)
                        && !device_failed.load(Ordering::Acquire)
                    {
                        std::thread::sleep(Duration::from_millis(50));
                    }
                    drop(stream);
                }
                Err(e) => {
                    error!(engine = %engine_name, error = %e, "capture device unavailable");
                    status_for_capture.publish(format!("[{engine_name}] Device unavailable: {e}"));
                    device_failed.store(true, Ordering::Release);
                }
            }
        });

        let playback = Arc::new(PlaybackStreamer::new(
            self.config.output_device.as_deref(),
            self.config.engine_name.clone(),
            self.interlock.clone(),
        )?);

        let playback_task = {
            let playback = Arc::clone(&playback);
            tokio::spawn(async move {
                playback.run(playback_rx).await;
            })
        };

        let segmenter_task = {
            let shutdown = Arc::clone(&self.shutdown);
            let device_failed = Arc::clone(&self.device_failed);
            let state = Arc::clone(&self.state);
            let interlock = self.interlock.clone();
            let playback = Arc::clone(&playback);
            let engine_name = self.config.engine_name.clone();
            let status = self.status.clone();
            let volume_callback = self.config.volume_callback.clone();
            tokio::spawn(async move {
                let mut segmenter = VoiceActivitySegmenter::new();
                loop {
                    if shutdown.load(Ordering::Acquire) {
                        segmenter.close();
                        break;
                    }
                    if device_failed.load(Ordering::Acquire) {
                        segmenter.close();
                        status.publish(format!("[{engine_name}] stopped: device unavailable"));
                        state.store(SupervisorState::Stopped as u8, Ordering::Release);
                        break;
                    }
                    match consumer.pop_frame() {
                        Some(frame) => {
                            if let Some(cb) = &volume_callback {
                                cb(frame.rms());
                            }
                            if let Some(utterance) =
                                segmenter.process_frame(frame, &interlock, playback.is_playing())
                            {
                                if utterance_tx.send(utterance).is_err() {
                                    break;
                                }
                            }
                        }
                        None => {
                            tokio::time::sleep(Duration::from_millis(5)).await;
                        }
                    }
                }
            })
        };

        let processor = UtteranceProcessor {
            engine_name: self.config.engine_name.clone(),
            source_lang: self.config.source_lang.clone(),
            target_lang: self.config.target_lang.clone(),
            recognizer: Arc::clone(&self.config.recognizer),
            translator: Arc::clone(&self.config.translator),
            synthesizer: Arc::clone(&self.config.synthesizer),
            status: self.status.clone(),
        };

        let processor_task = tokio::spawn(async move {
            processor.run(utterance_rx, playback_tx).await;
        });

        info!(engine = %self.config.engine_name, "engine started");

        self.running = Some(RunningTasks {
            capture_thread,
            segmenter_task,
            processor_task,
            playback_task,
        });

        Ok(())
    }

    /// Stop the engine: capture ceases first, the processor drains its
    /// queue once, then playback drains. Best-effort: in-flight provider
    /// calls are abandoned, not awaited to completion.
    pub async fn stop(&mut self) {
        if self
            .state
            .compare_exchange(
                SupervisorState::Running as u8,
                SupervisorState::Stopping as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            // Either never started, already stopping/stopped (e.g. the
            // device-failure path above already set Stopped), or the
            // device-failure path raced us here: either way there is
            // nothing more for a well-behaved stop to do but tear down
            // whatever tasks exist.
        }

        self.shutdown.store(true, Ordering::Release);

        if let Some(running) = self.running.take() {
            let RunningTasks {
                capture_thread,
                segmenter_task,
                processor_task,
                playback_task,
            } = running;

            let _ = tokio::task::spawn_blocking(move || capture_thread.join()).await;
            let _ = segmenter_task.await;
            // Processor and playback tasks end once their channels close,
            // which happens as soon as the segmenter task (utterance_tx
            // owner) and processor task (playback_tx owner) above exit.
            let _ = processor_task.await;
            let _ = playback_task.await;
        }

        self.state
            .store(SupervisorState::Stopped as u8, Ordering::Release);
        info!(engine = %self.config.engine_name, "engine stopped");
    }
}
