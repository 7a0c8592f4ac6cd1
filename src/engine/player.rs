//! Real-time audio playback using cpal

use anyhow::{anyhow, bail, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use super::Engine;

/// Real-time audio player bound to one output device
pub struct Player {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    /// Open an output device by (partial) name, or the default device
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .output_devices()
                .context("failed to enumerate output devices")?
                .find(|d| d.name().map(|n| n.contains(name)).unwrap_or(false))
                .ok_or_else(|| anyhow!("output device '{}' not found", name))?,
            None => host
                .default_output_device()
                .ok_or_else(|| anyhow!("No output device available"))?,
        };

        let supported = device
            .default_output_config()
            .context("output device has no usable configuration")?;
        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.into();

        info!(
            device = device.name().unwrap_or_default().as_str(),
            sample_rate = config.sample_rate.0,
            channels = config.channels,
            "opened output device"
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Sample rate the engine must render at
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start playing audio from the engine
    pub fn start(&mut self, engine: Arc<Mutex<Engine>>) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(engine, running)?,
            SampleFormat::I16 => self.build_stream::<i16>(engine, running)?,
            SampleFormat::U16 => self.build_stream::<u16>(engine, running)?,
            other => bail!("Unsupported sample format: {:?}", other),
        };

        stream.play()?;
        self.stream = Some(stream);

        Ok(())
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
        &self,
        engine: Arc<Mutex<Engine>>,
        running: Arc<AtomicBool>,
    ) -> Result<Stream> {
        let channels = self.config.channels as usize;

        let stream = self.device.build_output_stream(
            &self.config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let guard = if running.load(Ordering::SeqCst) {
                    engine.try_lock().ok()
                } else {
                    None
                };

                match guard {
                    Some(mut eng) => {
                        for frame in data.chunks_mut(channels) {
                            let sample = T::from_sample(eng.process() as f32);
                            for channel_sample in frame.iter_mut() {
                                *channel_sample = sample;
                            }
                        }
                    }
                    // Stopped or contended: silence
                    None => {
                        for sample in data.iter_mut() {
                            *sample = T::from_sample(0.0f32);
                        }
                    }
                }
            },
            |err| {
                error!("Audio stream error: {}", err);
            },
            None,
        )?;

        Ok(stream)
    }
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device()
        .and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
