//! Reply playback to system speakers via cpal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, error, info};

use crate::audio::resample::resample_linear;
use crate::audio::{ActivePlayback, AudioSink, DecodedClip};
use crate::config::AudioConfig;
use crate::error::{MoodError, Result};

/// Speaker output backed by the default cpal host.
#[derive(Debug, Clone)]
pub struct CpalSink {
    device_name: Option<String>,
    output_sample_rate: u32,
}

impl CpalSink {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            device_name: config.output_device.clone(),
            output_sample_rate: config.output_sample_rate,
        }
    }

    /// List available output devices.
    ///
    /// # Errors
    ///
    /// Returns an error if devices cannot be enumerated.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| MoodError::Audio(format!("cannot enumerate devices: {e}")))?;

        let mut names = Vec::new();
        for device in devices {
            if let Ok(desc) = device.description() {
                names.push(desc.name().to_owned());
            }
        }
        Ok(names)
    }
}

impl AudioSink for CpalSink {
    fn start(&self, clip: DecodedClip) -> Result<Box<dyn ActivePlayback>> {
        let samples = resample_linear(&clip.samples, clip.sample_rate, self.output_sample_rate);
        let buffer = Arc::new(Mutex::new(PlaybackBuffer {
            samples,
            position: 0,
            finished: false,
        }));
        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std_mpsc::channel();

        let device_name = self.device_name.clone();
        let rate = self.output_sample_rate;
        let thread_stop = Arc::clone(&stop);
        let thread_finished = Arc::clone(&finished);
        let thread = std::thread::Builder::new()
            .name("moodnest-playback".into())
            .spawn(move || {
                playback_thread(
                    device_name,
                    rate,
                    buffer,
                    ready_tx,
                    thread_stop,
                    thread_finished,
                )
            })
            .map_err(|e| MoodError::Audio(format!("cannot spawn playback thread: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Box::new(CpalPlayback {
                stop,
                finished,
                thread: Some(thread),
            })),
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                let _ = thread.join();
                Err(MoodError::Audio(
                    "playback thread exited before the stream started".into(),
                ))
            }
        }
    }
}

fn playback_thread(
    device_name: Option<String>,
    sample_rate: u32,
    buffer: Arc<Mutex<PlaybackBuffer>>,
    ready_tx: std_mpsc::Sender<Result<()>>,
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
) {
    let stream = match open_output_stream(device_name.as_deref(), sample_rate, Arc::clone(&buffer))
    {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));
            stream
        }
        Err(e) => {
            finished.store(true, Ordering::SeqCst);
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    loop {
        std::thread::sleep(Duration::from_millis(10));
        if stop.load(Ordering::SeqCst) {
            debug!("playback preempted");
            break;
        }
        match buffer.lock() {
            Ok(buf) if buf.finished => break,
            Ok(_) => {}
            Err(e) => {
                error!("playback buffer lock poisoned: {e}");
                break;
            }
        }
    }

    drop(stream);
    finished.store(true, Ordering::SeqCst);
}

fn open_output_stream(
    device_name: Option<&str>,
    sample_rate: u32,
    buffer: Arc<Mutex<PlaybackBuffer>>,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = if let Some(name) = device_name {
        host.output_devices()
            .map_err(|e| MoodError::Audio(format!("cannot enumerate devices: {e}")))?
            .find(|d| {
                d.description()
                    .ok()
                    .map(|desc| desc.name() == name)
                    .unwrap_or(false)
            })
            .ok_or_else(|| MoodError::Audio(format!("output device '{name}' not found")))?
    } else {
        host.default_output_device()
            .ok_or_else(|| MoodError::Audio("no default output device".into()))?
    };

    let stream_config = StreamConfig {
        channels: 1,
        sample_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                let mut buf = match buffer.lock() {
                    Ok(b) => b,
                    Err(_) => return,
                };

                for sample in data.iter_mut() {
                    if buf.position < buf.samples.len() {
                        *sample = buf.samples[buf.position];
                        buf.position += 1;
                    } else {
                        *sample = 0.0;
                        buf.finished = true;
                    }
                }
            },
            move |err| {
                error!("audio output stream error: {err}");
            },
            None,
        )
        .map_err(|e| MoodError::Audio(format!("failed to build output stream: {e}")))?;

    stream
        .play()
        .map_err(|e| MoodError::Audio(format!("failed to start output stream: {e}")))?;
    info!("reply playback started at {sample_rate}Hz");
    Ok(stream)
}

/// Internal buffer for tracking playback progress.
struct PlaybackBuffer {
    samples: Vec<f32>,
    position: usize,
    finished: bool,
}

struct CpalPlayback {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl CpalPlayback {
    fn halt(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("playback thread panicked");
        }
    }
}

impl ActivePlayback for CpalPlayback {
    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    fn stop(mut self: Box<Self>) {
        self.halt();
    }
}

impl Drop for CpalPlayback {
    fn drop(&mut self) {
        self.halt();
    }
}
