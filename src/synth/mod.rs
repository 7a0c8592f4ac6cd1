//! Synthesis for rendered notes
//!
//! Contains oscillators, the note envelope, and voice implementations.

mod envelope;
mod oscillator;
mod tone;
mod voice;

pub use envelope::{Envelope, EnvelopeShape, EnvelopeStage};
pub use oscillator::{Oscillator, Waveform};
pub use tone::ToneVoice;
pub use voice::Voice;
