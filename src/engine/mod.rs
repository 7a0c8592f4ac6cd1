//! Audio engine for chordgen
//!
//! Scheduled notes are handed to an [`AudioSink`]. The [`Engine`] sink
//! synthesizes them sample by sample; it is driven either by the real-time
//! [`Player`] or offline by the [`Recorder`]. [`MidiSink`] sends the same
//! notes to an external instrument instead.

mod midi;
mod player;
mod recorder;
mod transport;

pub use midi::{frequency_to_midi, list_midi_ports, MidiMessage, MidiSink};
pub use player::{default_device_name, list_output_devices, Player};
pub use recorder::{render_to_wav, Recorder, RenderSummary};
pub use transport::{ScheduledChord, Transport, TransportSettings};

use crate::synth::{EnvelopeShape, ToneVoice, Voice};
use tracing::debug;

/// A note to be sounded at an absolute time on the sink's clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteEvent {
    /// Frequency in Hz
    pub frequency: f64,
    /// Start time in seconds
    pub start: f64,
    /// Duration in seconds
    pub duration: f64,
    /// Peak gain, 0.0-1.0
    pub volume: f64,
}

/// Destination for scheduled notes
pub trait AudioSink {
    /// Current time on the sink's clock, in seconds
    fn now(&self) -> f64;

    /// Queue a note. Notes starting in the past start immediately.
    fn schedule(&mut self, event: NoteEvent);

    /// Drop every queued note that has not started yet
    fn cancel_pending(&mut self);
}

/// Sample-accurate synthesis sink
pub struct Engine {
    sample_rate: f64,
    volume: f64,
    shape: EnvelopeShape,
    clock: u64,
    /// Queued notes with their start sample, sorted by start
    pending: Vec<(u64, NoteEvent)>,
    voices: Vec<Box<dyn Voice>>,
}

impl Engine {
    /// Create a new engine
    pub fn new(sample_rate: f64, volume: f64, shape: EnvelopeShape) -> Self {
        Self {
            sample_rate,
            volume,
            shape,
            clock: 0,
            pending: Vec::new(),
            voices: Vec::new(),
        }
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Samples rendered so far
    pub fn samples_rendered(&self) -> u64 {
        self.clock
    }

    /// Number of notes waiting to start
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of notes currently sounding
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// True when nothing is sounding and nothing is queued
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.voices.is_empty()
    }

    fn start_due_notes(&mut self) {
        let due = self.pending.partition_point(|(start, _)| *start <= self.clock);
        for (_, event) in self.pending.drain(..due) {
            self.voices.push(Box::new(ToneVoice::new(
                event.frequency,
                event.volume,
                event.duration,
                self.shape,
                self.sample_rate,
            )));
        }
    }

    /// Generate the next sample (mix of all voices)
    pub fn process(&mut self) -> f64 {
        self.start_due_notes();

        let mut output = 0.0;
        for voice in &mut self.voices {
            output += voice.process();
        }
        self.voices.retain(|voice| voice.is_active());
        self.clock += 1;

        output * self.volume
    }

    /// Fill a buffer with samples
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process() as f32;
        }
    }
}

impl AudioSink for Engine {
    fn now(&self) -> f64 {
        self.clock as f64 / self.sample_rate
    }

    fn schedule(&mut self, event: NoteEvent) {
        if event.duration <= 0.0 {
            return;
        }
        let start = ((event.start * self.sample_rate).round().max(0.0) as u64).max(self.clock);
        let at = self.pending.partition_point(|(s, _)| *s <= start);
        self.pending.insert(at, (start, event));
    }

    fn cancel_pending(&mut self) {
        if !self.pending.is_empty() {
            debug!(dropped = self.pending.len(), "cancelled pending notes");
        }
        self.pending.clear();
    }
}
