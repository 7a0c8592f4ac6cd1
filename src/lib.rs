//! chordgen - Chord progression generator
//!
//! Picks progressions written in scale-degree notation, swaps chords for
//! others of the same harmonic function, voices them with smooth voice
//! leading and renders them to audio or MIDI.

pub mod config;
pub mod engine;
pub mod progression;
pub mod synth;
pub mod theory;
pub mod voicing;

pub use config::ChordGenConfig;
pub use engine::Engine;
pub use progression::{ProgressionLibrary, Session, SubstitutionTable};
