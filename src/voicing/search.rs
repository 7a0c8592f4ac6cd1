//! Closest-voicing search
//!
//! Every tone may sit in any octave of the voicing range, so an N-tone chord
//! has `octaves^N` candidates (2^N with the default two-octave window). That
//! is a few dozen for real chords; the search refuses to run past
//! [`MAX_CANDIDATES`] and falls back to the reference voicing instead.

use tracing::{debug, warn};

use super::movement::voice_movement;
use super::{Voicing, VoicingRange};
use crate::theory::PitchClass;

/// Upper bound on enumerated candidates
pub const MAX_CANDIDATES: usize = 4096;

/// Every tone in the reference (lowest) octave of the range
pub fn reference_voicing(tones: &[PitchClass], range: &VoicingRange) -> Voicing {
    tones.iter().map(|tone| tone.frequency(range.min_octave)).collect()
}

/// Ratio between the highest and lowest frequency of a voicing
pub fn span(voicing: &[f64]) -> f64 {
    let min = voicing.iter().copied().fold(f64::INFINITY, f64::min);
    let max = voicing.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if voicing.is_empty() {
        1.0
    } else {
        max / min
    }
}

/// Number of octave assignments for a chord of `tone_count` tones
pub fn candidate_count(tone_count: usize, range: &VoicingRange) -> Option<usize> {
    let octaves = range.octave_count();
    u32::try_from(tone_count)
        .ok()
        .and_then(|n| octaves.checked_pow(n))
}

/// All octave assignments within the range whose span is playable.
///
/// Candidates come out in lexicographic order: the first tone varies
/// slowest and octaves ascend.
pub fn candidate_voicings(tones: &[PitchClass], range: &VoicingRange) -> Vec<Voicing> {
    let mut candidates = Vec::new();
    let mut current = Vec::with_capacity(tones.len());
    collect_candidates(tones, range, &mut current, &mut candidates);
    candidates
}

fn collect_candidates(
    tones: &[PitchClass],
    range: &VoicingRange,
    current: &mut Voicing,
    out: &mut Vec<Voicing>,
) {
    let Some((&tone, rest)) = tones.split_first() else {
        if span(current) <= range.max_span {
            out.push(current.clone());
        }
        return;
    };

    for octave in range.min_octave..=range.max_octave {
        current.push(tone.frequency(octave));
        collect_candidates(rest, range, current, out);
        current.pop();
    }
}

/// Voice a chord as close as possible to the previous voicing.
///
/// Without a previous voicing every tone goes to the reference octave.
/// Otherwise the playable candidate with the least greedy voice movement
/// wins; on ties the earliest candidate is kept. If no candidate is
/// playable the reference voicing is used.
pub fn closest_voicing(
    tones: &[PitchClass],
    previous: Option<&[f64]>,
    range: &VoicingRange,
) -> Voicing {
    let previous = match previous {
        Some(previous) if !previous.is_empty() => previous,
        _ => return reference_voicing(tones, range),
    };

    match candidate_count(tones.len(), range) {
        Some(count) if count <= MAX_CANDIDATES => {}
        _ => {
            warn!(
                tones = tones.len(),
                "voicing search too large, using reference octave"
            );
            return reference_voicing(tones, range);
        }
    }

    let mut best: Option<(Voicing, f64)> = None;
    for candidate in candidate_voicings(tones, range) {
        let movement = voice_movement(previous, &candidate);
        if best.as_ref().map_or(true, |(_, least)| movement < *least) {
            best = Some((candidate, movement));
        }
    }

    match best {
        Some((voicing, movement)) => {
            debug!(movement, "voiced chord");
            voicing
        }
        None => {
            debug!("no playable voicing, using reference octave");
            reference_voicing(tones, range)
        }
    }
}
