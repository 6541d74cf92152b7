// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio output via cpal.
//!
//! `AudioOutput` wraps a running cpal stream. `CpalDevice` keeps that stream
//! on its own thread, since cpal streams cannot move between threads, and
//! feeds it from a shared [`Mixer`].

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use tracing::{error, info, warn};

use super::{AudioDevice, AudioError, Mixer, SampleBuffer, SliceRequest, SoundAsset};
use super::sampler::CLICK_SAMPLE_RATE;

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Buffer size in frames; the device default when `None`
    pub buffer_size: Option<u32>,
    /// Number of output channels
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            buffer_size: None,
            channels: 2,
        }
    }
}

impl AudioConfig {
    /// Calculate buffer latency in milliseconds, if the buffer size is fixed
    pub fn latency_ms(&self) -> Option<f64> {
        self.buffer_size
            .map(|frames| (frames as f64 / self.sample_rate as f64) * 1000.0)
    }
}

/// Audio output stream
pub struct AudioOutput {
    /// cpal stream
    _stream: Stream,
    /// Output device
    _device: Device,
    /// Negotiated configuration
    config: AudioConfig,
}

impl AudioOutput {
    /// Open the default output device at its native rate and channel count.
    ///
    /// `callback` receives a zeroed interleaved buffer and the channel count.
    pub fn new<F>(buffer_size: Option<u32>, mut callback: F) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let host = cpal::default_host();

        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::InitFailed(format!("Failed to get default config: {}", e)))?;

        let config = AudioConfig {
            sample_rate: supported.sample_rate().0,
            buffer_size,
            channels: supported.channels(),
        };

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: match buffer_size {
                Some(frames) => cpal::BufferSize::Fixed(frames),
                None => cpal::BufferSize::Default,
            },
        };

        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    data.fill(0.0);
                    callback(data, channels);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::StreamFailed(format!("Failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("Failed to start stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            _device: device,
            config,
        })
    }

    /// Get negotiated configuration
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }
}

/// List available audio output devices
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.output_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}

/// Get default device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

struct AudioWorker {
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

/// The system output device behind the `AudioDevice` seam
pub struct CpalDevice {
    mixer: Arc<Mutex<Mixer>>,
    buffer_size: Option<u32>,
    worker: Option<AudioWorker>,
}

impl CpalDevice {
    pub fn new(buffer_size: Option<u32>) -> Self {
        Self {
            mixer: Arc::new(Mutex::new(Mixer::new(CLICK_SAMPLE_RATE, Instant::now()))),
            buffer_size,
            worker: None,
        }
    }

    fn with_mixer<T>(&self, f: impl FnOnce(&mut Mixer) -> T) -> Result<T, AudioError> {
        let mut mixer = self.mixer.lock().map_err(|_| AudioError::LockFailed)?;
        Ok(f(&mut mixer))
    }
}

impl Default for CpalDevice {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioDevice for CpalDevice {
    fn start(&mut self) -> Result<(), AudioError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let mixer = Arc::clone(&self.mixer);
        let buffer_size = self.buffer_size;

        let handle = thread::Builder::new()
            .name("jamm-audio".to_string())
            .spawn(move || {
                let render_mixer = Arc::clone(&mixer);
                let opened = AudioOutput::new(buffer_size, move |buffer, channels| {
                    if let Ok(mut mixer) = render_mixer.lock() {
                        mixer.render(buffer, channels);
                    }
                });
                let output = match opened {
                    Ok(output) => output,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if let Ok(mut mixer) = mixer.lock() {
                    mixer.reset_clock(output.sample_rate(), Instant::now());
                }
                let _ = ready_tx.send(Ok(output.config().clone()));
                // Hold the stream open until released
                let _ = shutdown_rx.recv();
                drop(output);
            })
            .map_err(|e| AudioError::InitFailed(e.to_string()))?;

        let config = ready_rx
            .recv()
            .map_err(|_| AudioError::InitFailed("audio thread exited".to_string()))
            .and_then(|r| r);

        match config {
            Ok(config) => {
                info!(
                    sample_rate = config.sample_rate,
                    channels = config.channels,
                    latency_ms = ?config.latency_ms(),
                    "audio output started on {}",
                    default_device_name().unwrap_or_else(|| "default device".to_string())
                );
                self.worker = Some(AudioWorker {
                    shutdown: shutdown_tx,
                    handle,
                });
                Ok(())
            }
            Err(e) => {
                let _ = handle.join();
                Err(e)
            }
        }
    }

    fn load_sound(&mut self, asset: &SoundAsset) -> Result<(), AudioError> {
        let buffer = match &asset.path {
            Some(path) => SampleBuffer::from_wav(&asset.name, path)?,
            None => SampleBuffer::click_loop(asset.reference_bpm, asset.slice_count),
        };
        info!(
            "loaded sound {:?} ({:.2}s)",
            asset.name,
            buffer.duration().as_secs_f64()
        );
        self.with_mixer(|m| m.insert_sound(asset.name.clone(), buffer))
    }

    fn buffer_duration(&self, name: &str) -> Option<Duration> {
        self.with_mixer(|m| m.sound_duration(name)).ok().flatten()
    }

    fn play_slice(&mut self, name: &str, request: SliceRequest) -> Result<(), AudioError> {
        self.with_mixer(|m| m.schedule(name, request))?
    }

    fn cancel_pending(&mut self) {
        if self.with_mixer(Mixer::cancel_pending).is_err() {
            warn!("could not cancel pending slices: mixer lock poisoned");
        }
    }

    fn release(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.shutdown.send(());
            if worker.handle.join().is_err() {
                error!("audio thread panicked");
            }
            info!("audio output released");
        }
        let _ = self.with_mixer(Mixer::clear_sounds);
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        self.release();
    }
}
