//! WAV file recorder
//!
//! Renders an engine offline to a mono 32-bit float WAV file.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{info, warn};

use super::Engine;

/// Hard stop for offline rendering, in seconds
const MAX_RENDER_SECONDS: f64 = 3600.0;

/// WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    samples_written: u64,
    peak: f32,
}

impl Recorder {
    /// Create a new recorder
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;

        Ok(Self {
            writer,
            sample_rate,
            samples_written: 0,
            peak: 0.0,
        })
    }

    /// Get the number of samples written
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    /// Get the duration recorded in seconds
    pub fn duration_secs(&self) -> f64 {
        self.samples_written as f64 / self.sample_rate as f64
    }

    /// Largest absolute sample written so far
    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Write a buffer of samples
    pub fn write_buffer(&mut self, buffer: &[f32]) -> Result<()> {
        for &sample in buffer {
            self.writer
                .write_sample(sample)
                .context("failed to write sample")?;
            self.peak = self.peak.max(sample.abs());
        }
        self.samples_written += buffer.len() as u64;
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize().context("failed to finalize WAV file")
    }
}

/// What an offline render produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSummary {
    pub samples: u64,
    pub seconds: f64,
    pub peak: f32,
}

/// Render the engine in blocks until it is idle, then `tail` more seconds
pub fn render_to_wav(
    engine: &mut Engine,
    path: &Path,
    tail: f64,
    block_size: usize,
) -> Result<RenderSummary> {
    let sample_rate = engine.sample_rate();
    let block_size = block_size.max(1);
    let mut recorder = Recorder::new(path, sample_rate.round() as u32)?;
    let mut buffer = vec![0.0f32; block_size];
    let limit = (MAX_RENDER_SECONDS * sample_rate) as u64;

    while !engine.is_idle() {
        if recorder.samples_written() >= limit {
            warn!("render stopped after {} seconds", MAX_RENDER_SECONDS);
            break;
        }
        engine.fill_buffer(&mut buffer);
        recorder.write_buffer(&buffer)?;
    }

    let mut tail_samples = (tail.max(0.0) * sample_rate).round() as usize;
    while tail_samples > 0 {
        let block = tail_samples.min(block_size);
        engine.fill_buffer(&mut buffer[..block]);
        recorder.write_buffer(&buffer[..block])?;
        tail_samples -= block;
    }

    let summary = RenderSummary {
        samples: recorder.samples_written(),
        seconds: recorder.duration_secs(),
        peak: recorder.peak(),
    };
    recorder.finalize()?;

    info!(
        seconds = summary.seconds,
        peak = summary.peak,
        "rendered {:?}",
        path
    );
    Ok(summary)
}
