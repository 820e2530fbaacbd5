//! Microphone capture using cpal.
//!
//! Each acquisition opens the device on a dedicated thread that owns the
//! cpal stream for the lifetime of the recording. Captured audio is
//! downmixed to mono in the callback and resampled to the configured input
//! rate when the recording is finished.

use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::StreamConfig;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tokio::sync::oneshot;
use tracing::{debug, error, info};

use crate::audio::resample::{resample_linear, to_mono};
use crate::audio::{CaptureHandle, CapturedAudio, Microphone};
use crate::config::AudioConfig;
use crate::error::{MoodError, Result};

/// Microphone backed by the default cpal host.
#[derive(Debug, Clone)]
pub struct CpalMicrophone {
    device_name: Option<String>,
    target_sample_rate: u32,
}

impl CpalMicrophone {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            device_name: config.input_device.clone(),
            target_sample_rate: config.input_sample_rate,
        }
    }

    /// List available input devices.
    ///
    /// # Errors
    ///
    /// Returns an error if devices cannot be enumerated.
    pub fn list_input_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
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

#[async_trait]
impl Microphone for CpalMicrophone {
    async fn acquire(&self) -> Result<Box<dyn CaptureHandle>> {
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();
        let buffer = Arc::new(Mutex::new(Vec::new()));

        let device_name = self.device_name.clone();
        let thread_buffer = Arc::clone(&buffer);
        let thread = std::thread::Builder::new()
            .name("moodnest-capture".into())
            .spawn(move || capture_thread(device_name, thread_buffer, ready_tx, stop_rx))
            .map_err(|e| MoodError::PermissionDenied(format!("cannot spawn capture thread: {e}")))?;

        let native_rate = match ready_rx.await {
            Ok(Ok(rate)) => rate,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(MoodError::PermissionDenied(
                    "capture thread exited before the stream started".into(),
                ));
            }
        };

        Ok(Box::new(CpalCaptureHandle {
            stop_tx: Some(stop_tx),
            thread: Some(thread),
            buffer,
            native_rate,
            target_rate: self.target_sample_rate,
        }))
    }
}

/// Opens the device, reports readiness (or the failure) and holds the
/// stream until the handle signals stop or is dropped.
fn capture_thread(
    device_name: Option<String>,
    buffer: Arc<Mutex<Vec<f32>>>,
    ready_tx: oneshot::Sender<Result<u32>>,
    stop_rx: std_mpsc::Receiver<()>,
) {
    let stream = match open_input_stream(device_name.as_deref(), buffer) {
        Ok((stream, rate)) => {
            let _ = ready_tx.send(Ok(rate));
            stream
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    // Either an explicit stop or the sender being dropped ends the recording.
    let _ = stop_rx.recv();
    drop(stream);
    debug!("input stream released");
}

fn open_input_stream(
    device_name: Option<&str>,
    buffer: Arc<Mutex<Vec<f32>>>,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = if let Some(name) = device_name {
        host.input_devices()
            .map_err(|e| MoodError::PermissionDenied(format!("cannot enumerate devices: {e}")))?
            .find(|d| {
                d.description()
                    .ok()
                    .map(|desc| desc.name() == name)
                    .unwrap_or(false)
            })
            .ok_or_else(|| MoodError::PermissionDenied(format!("input device '{name}' not found")))?
    } else {
        host.default_input_device()
            .ok_or_else(|| MoodError::PermissionDenied("no default input device".into()))?
    };

    let default_config = device
        .default_input_config()
        .map_err(|e| MoodError::PermissionDenied(format!("no default input config: {e}")))?;
    let native_rate = default_config.sample_rate();
    let native_channels = default_config.channels();
    let stream_config = StreamConfig {
        channels: native_channels,
        sample_rate: native_rate,
        buffer_size: cpal::BufferSize::Default,
    };

    let stream = device
        .build_input_stream(
            &stream_config,
            move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                let mono = to_mono(data, native_channels);
                if let Ok(mut buf) = buffer.lock() {
                    buf.extend_from_slice(&mono);
                }
            },
            move |err| {
                error!("audio input stream error: {err}");
            },
            None,
        )
        .map_err(|e| MoodError::PermissionDenied(format!("failed to build input stream: {e}")))?;

    stream
        .play()
        .map_err(|e| MoodError::PermissionDenied(format!("failed to start input stream: {e}")))?;

    info!(
        "recording started: {}Hz, {} channels",
        native_rate, native_channels
    );
    Ok((stream, native_rate))
}

struct CpalCaptureHandle {
    stop_tx: Option<std_mpsc::Sender<()>>,
    thread: Option<JoinHandle<()>>,
    buffer: Arc<Mutex<Vec<f32>>>,
    native_rate: u32,
    target_rate: u32,
}

impl CpalCaptureHandle {
    fn release(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            error!("capture thread panicked");
        }
    }
}

impl CaptureHandle for CpalCaptureHandle {
    fn finish(mut self: Box<Self>) -> Result<CapturedAudio> {
        self.release();
        let samples = {
            let mut buf = self
                .buffer
                .lock()
                .map_err(|e| MoodError::Audio(format!("capture buffer lock poisoned: {e}")))?;
            std::mem::take(&mut *buf)
        };
        let samples = resample_linear(&samples, self.native_rate, self.target_rate);
        info!(
            seconds = samples.len() as f32 / self.target_rate.max(1) as f32,
            "recording finished"
        );
        Ok(CapturedAudio {
            samples,
            sample_rate: self.target_rate,
        })
    }
}

impl Drop for CpalCaptureHandle {
    fn drop(&mut self) {
        self.release();
    }
}
