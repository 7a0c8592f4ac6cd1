//! Progression playback scheduling
//!
//! Turns the bars of a session into timed bass and chord notes on a sink.
//! Bars are in 4/4 and every chord in a bar gets an equal share of it.

use tracing::{debug, info};

use super::{AudioSink, NoteEvent};
use crate::progression::Session;
use crate::theory::{bass_note, chord_tones, degree_to_note_in, split_slash};
use crate::voicing::{VoiceLeader, Voicing, VoicingRange};

/// Bass register and note levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportSettings {
    pub bass_octave: i32,
    pub bass_volume: f64,
    pub chord_volume: f64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            bass_octave: 3,
            bass_volume: 0.28,
            chord_volume: 0.25,
        }
    }
}

/// A chord as it was scheduled
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledChord {
    /// Degree notation from the session
    pub degree: String,
    /// Chord symbol in the session key
    pub symbol: String,
    pub start: f64,
    pub duration: f64,
    /// Bass frequency in Hz
    pub bass: f64,
    pub voicing: Voicing,
}

/// Schedules sessions onto a sink with voice leading across chords
#[derive(Debug, Clone)]
pub struct Transport {
    leader: VoiceLeader,
    settings: TransportSettings,
}

impl Transport {
    pub fn new(range: VoicingRange, settings: TransportSettings) -> Self {
        Self {
            leader: VoiceLeader::new(range),
            settings,
        }
    }

    /// Length of one 4/4 bar in seconds
    pub fn bar_duration(bpm: u32) -> f64 {
        60.0 / bpm.max(1) as f64 * 4.0
    }

    /// Schedule every bar of the session, starting at the sink's current time.
    ///
    /// Anything still queued from an earlier call is cancelled first, so two
    /// playbacks never overlap.
    pub fn schedule<S: AudioSink + ?Sized>(
        &mut self,
        session: &Session,
        sink: &mut S,
    ) -> Vec<ScheduledChord> {
        sink.cancel_pending();
        self.leader.reset();

        let key = session.key();
        let bar_duration = Self::bar_duration(session.bpm());
        let mut bar_start = sink.now();
        let mut scheduled = Vec::new();

        for bar in session.bars() {
            let chord_duration = bar_duration / bar.len().max(1) as f64;
            let mut start = bar_start;

            for degree in bar {
                let (upper, _) = split_slash(degree);
                let symbol = degree_to_note_in(key, degree);
                let bass = bass_note(key, degree).frequency(self.settings.bass_octave);
                let voicing = self.leader.next(&chord_tones(&degree_to_note_in(key, upper)));

                sink.schedule(NoteEvent {
                    frequency: bass,
                    start,
                    duration: chord_duration,
                    volume: self.settings.bass_volume,
                });
                for &frequency in &voicing {
                    sink.schedule(NoteEvent {
                        frequency,
                        start,
                        duration: chord_duration,
                        volume: self.settings.chord_volume,
                    });
                }

                debug!(degree = degree.as_str(), symbol = symbol.as_str(), start, ?voicing, "scheduled chord");
                scheduled.push(ScheduledChord {
                    degree: degree.clone(),
                    symbol,
                    start,
                    duration: chord_duration,
                    bass,
                    voicing,
                });
                start += chord_duration;
            }
            bar_start += bar_duration;
        }

        info!(
            chords = scheduled.len(),
            seconds = bar_duration * session.bars().len() as f64,
            "scheduled progression"
        );
        scheduled
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(VoicingRange::default(), TransportSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::{parse_bars, ProgressionLibrary};
    use crate::theory::{Key, PitchClass};

    /// Sink that only records what it was given
    #[derive(Default)]
    struct RecordingSink {
        now: f64,
        events: Vec<NoteEvent>,
        cancels: usize,
    }

    impl AudioSink for RecordingSink {
        fn now(&self) -> f64 {
            self.now
        }

        fn schedule(&mut self, event: NoteEvent) {
            self.events.push(event);
        }

        fn cancel_pending(&mut self) {
            self.cancels += 1;
            self.events.clear();
        }
    }

    fn session(text: &str, key: &str, bpm: u32) -> Session {
        let mut session = Session::new(Key::from_name(key).unwrap(), bpm);
        session.load_bars(parse_bars(text), &ProgressionLibrary::new(vec![]));
        session
    }

    #[test]
    fn test_bar_duration() {
        assert_eq!(Transport::bar_duration(120), 2.0);
        assert_eq!(Transport::bar_duration(60), 4.0);
        assert_eq!(Transport::bar_duration(200), 1.2);
    }

    #[test]
    fn test_chords_share_the_bar() {
        let mut sink = RecordingSink { now: 1.0, ..Default::default() };
        let chords = Transport::default().schedule(&session("1 4 | 5", "C", 120), &mut sink);

        let timing: Vec<(f64, f64)> = chords.iter().map(|c| (c.start, c.duration)).collect();
        assert_eq!(timing, vec![(1.0, 1.0), (2.0, 1.0), (3.0, 2.0)]);
        assert_eq!(chords[1].symbol, "F");
    }

    #[test]
    fn test_bass_and_voicing_events() {
        let mut sink = RecordingSink::default();
        let chords = Transport::default().schedule(&session("1", "C", 120), &mut sink);

        // Bass C3 plus C, E, G in the reference octave
        assert_eq!(sink.events.len(), 4);
        assert_eq!(sink.events[0].frequency, PitchClass::C.frequency(3));
        assert_eq!(sink.events[0].volume, 0.28);
        assert!(sink.events[1..].iter().all(|e| e.volume == 0.25 && e.duration == 2.0));
        assert_eq!(chords[0].voicing.len(), 3);
        assert_eq!(chords[0].bass, sink.events[0].frequency);
    }

    #[test]
    fn test_slash_bass() {
        let mut sink = RecordingSink::default();
        let chords = Transport::default().schedule(&session("5/7", "C", 120), &mut sink);

        let b = PitchClass::parse("B").unwrap();
        assert_eq!(chords[0].bass, b.frequency(3));
        assert_eq!(chords[0].symbol, "G/7");
        // Upper structure is a plain G triad
        assert_eq!(chords[0].voicing.len(), 3);
    }

    #[test]
    fn test_voice_leading_restarts_each_playback() {
        let session = session("1 | 5 | 6m | 4", "C", 200);
        let mut transport = Transport::default();
        let mut sink = RecordingSink::default();

        let first = transport.schedule(&session, &mut sink);
        let second = transport.schedule(&session, &mut sink);
        assert_eq!(first, second);
    }

    #[test]
    fn test_new_playback_cancels_pending() {
        let session = session("1 | 5", "C", 200);
        let mut transport = Transport::default();
        let mut sink = RecordingSink::default();

        transport.schedule(&session, &mut sink);
        transport.schedule(&session, &mut sink);
        assert_eq!(sink.cancels, 2);
        assert_eq!(sink.events.len(), 8);
    }

    #[test]
    fn test_custom_settings() {
        let settings = TransportSettings {
            bass_octave: 2,
            bass_volume: 0.5,
            chord_volume: 0.1,
        };
        let mut transport = Transport::new(VoicingRange::default(), settings);
        let mut sink = RecordingSink::default();
        transport.schedule(&session("6m", "C", 120), &mut sink);

        let a = PitchClass::parse("A").unwrap();
        assert_eq!(sink.events[0].frequency, a.frequency(2));
        assert_eq!(sink.events[0].volume, 0.5);
        assert_eq!(sink.events[1].volume, 0.1);
    }
}
