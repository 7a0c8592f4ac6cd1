//! Note envelope
//!
//! Fixed-length amplitude envelope for a scheduled note: a linear attack up
//! to the note volume, a hold, then an exponential fade to a floor level.
//! Release points are fractions of the note duration so that short chords
//! in fast progressions still fade out before the next one starts.

/// Envelope stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Attack,
    Hold,
    Release,
    /// Holding the floor gain until the note ends
    Tail,
    Finished,
}

/// Timing and level parameters shared by all notes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    /// Attack time in seconds
    pub attack: f64,
    /// Fraction of the duration where the fade begins
    pub release_start: f64,
    /// Fraction of the duration where the fade reaches `min_gain`
    pub release_end: f64,
    /// Floor of the exponential fade
    pub min_gain: f64,
}

impl Default for EnvelopeShape {
    fn default() -> Self {
        Self {
            attack: 0.01,
            release_start: 0.85,
            release_end: 0.98,
            min_gain: 0.001,
        }
    }
}

/// Envelope for one note of known volume and duration
#[derive(Debug, Clone)]
pub struct Envelope {
    shape: EnvelopeShape,
    peak: f64,
    duration: f64,
    sample_rate: f64,
    elapsed: u64,
}

impl Envelope {
    pub fn new(shape: EnvelopeShape, peak: f64, duration: f64, sample_rate: f64) -> Self {
        Self {
            shape,
            peak,
            duration,
            sample_rate,
            elapsed: 0,
        }
    }

    fn hold_end(&self) -> f64 {
        self.duration * self.shape.release_start
    }

    fn release_end(&self) -> f64 {
        self.duration * self.shape.release_end
    }

    /// Stage at `t` seconds after the note start
    pub fn stage_at(&self, t: f64) -> EnvelopeStage {
        if t >= self.duration {
            EnvelopeStage::Finished
        } else if t >= self.release_end() {
            EnvelopeStage::Tail
        } else if t >= self.hold_end() {
            EnvelopeStage::Release
        } else if t < self.shape.attack {
            EnvelopeStage::Attack
        } else {
            EnvelopeStage::Hold
        }
    }

    /// Gain at `t` seconds after the note start
    pub fn gain_at(&self, t: f64) -> f64 {
        match self.stage_at(t) {
            EnvelopeStage::Attack => self.peak * t.max(0.0) / self.shape.attack,
            EnvelopeStage::Hold => self.peak,
            EnvelopeStage::Release => {
                // A note shorter than the attack fades from wherever the ramp got to
                let from = self.peak * (self.hold_end() / self.shape.attack).min(1.0);
                let to = self.shape.min_gain;
                if from <= to {
                    return from;
                }
                let fade = self.release_end() - self.hold_end();
                let progress = (t - self.hold_end()) / fade;
                from * (to / from).powf(progress)
            }
            EnvelopeStage::Tail => self.shape.min_gain.min(self.peak),
            EnvelopeStage::Finished => 0.0,
        }
    }

    /// Current stage
    pub fn stage(&self) -> EnvelopeStage {
        self.stage_at(self.time())
    }

    /// Seconds since the note start
    pub fn time(&self) -> f64 {
        self.elapsed as f64 / self.sample_rate
    }

    pub fn is_active(&self) -> bool {
        self.stage() != EnvelopeStage::Finished
    }

    /// Generate the next envelope sample
    pub fn process(&mut self) -> f64 {
        let gain = self.gain_at(self.time());
        self.elapsed += 1;
        gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_attack_is_linear() {
        let env = Envelope::new(EnvelopeShape::default(), 0.25, 1.0, 44100.0);
        assert_eq!(env.gain_at(0.0), 0.0);
        assert!(close(env.gain_at(0.005), 0.125));
        assert_eq!(env.stage_at(0.005), EnvelopeStage::Attack);
    }

    #[test]
    fn test_hold_until_release_start() {
        let env = Envelope::new(EnvelopeShape::default(), 0.25, 1.0, 44100.0);
        assert_eq!(env.gain_at(0.01), 0.25);
        assert_eq!(env.gain_at(0.5), 0.25);
        assert_eq!(env.gain_at(0.849), 0.25);
        assert_eq!(env.stage_at(0.5), EnvelopeStage::Hold);
    }

    #[test]
    fn test_exponential_release() {
        let env = Envelope::new(EnvelopeShape::default(), 0.25, 1.0, 44100.0);
        assert!(close(env.gain_at(0.85), 0.25));

        // Halfway through the fade is the geometric mean of the endpoints
        let midpoint = env.gain_at(0.915);
        assert!(close(midpoint, (0.25f64 * 0.001).sqrt()), "{}", midpoint);

        assert_eq!(env.stage_at(0.99), EnvelopeStage::Tail);
        assert_eq!(env.gain_at(0.99), 0.001);
        assert_eq!(env.gain_at(1.0), 0.0);
    }

    #[test]
    fn test_short_note_releases_from_partial_attack() {
        // 10 ms note: release starts at 8.5 ms, before the attack completes
        let env = Envelope::new(EnvelopeShape::default(), 0.2, 0.01, 44100.0);
        assert_eq!(env.stage_at(0.009), EnvelopeStage::Release);
        assert!(close(env.gain_at(0.0085), 0.2 * 0.85));
        assert!(env.gain_at(0.0095) < 0.2 * 0.85);
    }

    #[test]
    fn test_process_runs_to_completion() {
        let sample_rate = 1000.0;
        let mut env = Envelope::new(EnvelopeShape::default(), 0.5, 0.1, sample_rate);
        let mut samples = 0;
        let mut peak: f64 = 0.0;
        while env.is_active() {
            peak = peak.max(env.process());
            samples += 1;
            assert!(samples <= 100);
        }
        assert_eq!(samples, 100);
        assert!(close(peak, 0.5));
        assert_eq!(env.stage(), EnvelopeStage::Finished);
    }
}
