//! Voice leading
//!
//! Picks an octave for every chord tone so that consecutive chords move as
//! little as possible.

mod movement;
mod search;

pub use movement::{semitones_between, voice_movement};
pub use search::{
    candidate_count, candidate_voicings, closest_voicing, reference_voicing, span, MAX_CANDIDATES,
};

use crate::theory::PitchClass;

/// Absolute frequencies in Hz, one per chord tone
pub type Voicing = Vec<f64>;

/// Octave window and playability limit for voicings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoicingRange {
    /// Lowest octave; also the reference octave for unled chords
    pub min_octave: i32,
    pub max_octave: i32,
    /// Largest allowed ratio between the top and bottom frequency
    pub max_span: f64,
}

impl VoicingRange {
    /// Number of octaves each tone can be placed in
    pub fn octave_count(&self) -> usize {
        (self.max_octave - self.min_octave + 1).max(0) as usize
    }
}

impl Default for VoicingRange {
    fn default() -> Self {
        Self {
            min_octave: 4,
            max_octave: 5,
            max_span: 4.0,
        }
    }
}

/// Voice-leading state for one pass through a progression
#[derive(Debug, Clone)]
pub struct VoiceLeader {
    range: VoicingRange,
    previous: Option<Voicing>,
}

impl VoiceLeader {
    pub fn new(range: VoicingRange) -> Self {
        Self { range, previous: None }
    }

    /// Voice the next chord relative to the last one and remember it
    pub fn next(&mut self, tones: &[PitchClass]) -> Voicing {
        let voicing = closest_voicing(tones, self.previous.as_deref(), &self.range);
        self.previous = Some(voicing.clone());
        voicing
    }

    /// The most recent voicing, if any
    pub fn previous(&self) -> Option<&[f64]> {
        self.previous.as_deref()
    }

    pub fn range(&self) -> &VoicingRange {
        &self.range
    }

    /// Forget the previous chord; the next one starts from the reference octave
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
