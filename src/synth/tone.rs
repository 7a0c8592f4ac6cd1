//! Harmonic tone voice
//!
//! A soft, slightly bright tone: a triangle fundamental plus sine partials
//! at two and three times the frequency, under a single note envelope.

use super::{Envelope, EnvelopeShape, Oscillator, Voice, Waveform};

/// Partials as (waveform, frequency multiple, gain)
const PARTIALS: [(Waveform, f64, f64); 3] = [
    (Waveform::Triangle, 1.0, 0.5),
    (Waveform::Sine, 2.0, 0.15),
    (Waveform::Sine, 3.0, 0.05),
];

/// One scheduled note rendered with fixed partials
pub struct ToneVoice {
    partials: Vec<(Oscillator, f64)>,
    envelope: Envelope,
}

impl ToneVoice {
    pub fn new(
        frequency: f64,
        volume: f64,
        duration: f64,
        shape: EnvelopeShape,
        sample_rate: f64,
    ) -> Self {
        let partials = PARTIALS
            .iter()
            .map(|&(waveform, multiple, gain)| {
                (Oscillator::new(waveform, frequency * multiple, sample_rate), gain)
            })
            .collect();

        Self {
            partials,
            envelope: Envelope::new(shape, volume, duration, sample_rate),
        }
    }

    /// Fundamental frequency in Hz
    pub fn frequency(&self) -> f64 {
        self.partials
            .first()
            .map(|(osc, _)| osc.frequency())
            .unwrap_or(0.0)
    }
}

impl Voice for ToneVoice {
    fn process(&mut self) -> f64 {
        let mix: f64 = self
            .partials
            .iter_mut()
            .map(|(osc, gain)| osc.generate() * *gain)
            .sum();
        mix * self.envelope.process()
    }

    fn is_active(&self) -> bool {
        self.envelope.is_active()
    }
}
