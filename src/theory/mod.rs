//! Music theory primitives
//!
//! Degree notation, diatonic parents, chord qualities and chord tones.
//! Everything here is pure and total: unrecognised input falls back to
//! the input itself or to a sensible default instead of failing.

mod degree;
mod parent;
mod pitch;
mod quality;
mod tones;

pub use degree::{
    bass_note, degree_prefix, degree_to_note, degree_to_note_in, split_slash, Accidental,
    DegreeToken,
};
pub use parent::{diatonic_parent, is_substitution};
pub use pitch::{split_note_name, Key, PitchClass, KEY_NAMES, MAJOR_SCALE, NOTE_NAMES};
pub use quality::{Alteration, ChordQuality, ChordSpec};
pub use tones::{chord_tone_names, chord_tones};
