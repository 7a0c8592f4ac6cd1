//! Editable progression session
//!
//! Holds the progression being worked on together with the settings that
//! affect how it is shown and played. Every chord keeps the diatonic parent
//! it was generated for, so repeated substitutions stay within one function.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use super::library::{Bar, MusicReference, Progression, ProgressionLibrary};
use super::substitution::{substitute, SubstitutionError, SubstitutionTable};
use crate::theory::{degree_to_note_in, diatonic_parent, Key};

pub const MIN_BPM: u32 = 60;
pub const MAX_BPM: u32 = 200;

/// Chord inserted by [`Session::add_chord`]
const NEW_CHORD: &str = "1";

/// Errors from editing a session
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no bar at index {0}")]
    NoBar(usize),

    #[error("no chord at index {chord} in bar {bar}")]
    NoChord { bar: usize, chord: usize },

    #[error("cannot remove the last chord of bar {0}")]
    LastChord(usize),

    #[error("progression library is empty")]
    EmptyLibrary,

    #[error("no progression at index {0}")]
    NoProgression(usize),

    #[error(transparent)]
    Substitution(#[from] SubstitutionError),
}

/// The progression being edited and its display/playback settings
#[derive(Debug, Clone)]
pub struct Session {
    key: Key,
    show_degrees: bool,
    bpm: u32,
    bars: Vec<Bar>,
    parents: Vec<Vec<String>>,
    substituted: Vec<Vec<bool>>,
    last_index: Option<usize>,
    music: Vec<MusicReference>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Key::default(), MAX_BPM)
    }
}

impl Session {
    pub fn new(key: Key, bpm: u32) -> Self {
        Self {
            key,
            show_degrees: true,
            bpm: bpm.clamp(MIN_BPM, MAX_BPM),
            bars: Vec::new(),
            parents: Vec::new(),
            substituted: Vec::new(),
            last_index: None,
            music: Vec::new(),
        }
    }

    /// Replace the progression with a random one from the library,
    /// never the same one twice in a row
    pub fn refresh<R: Rng + ?Sized>(
        &mut self,
        library: &ProgressionLibrary,
        rng: &mut R,
    ) -> Result<(), SessionError> {
        let index = library
            .pick(rng, self.last_index)
            .ok_or(SessionError::EmptyLibrary)?;
        self.load(library, index)
    }

    /// Load a specific progression from the library
    pub fn load(&mut self, library: &ProgressionLibrary, index: usize) -> Result<(), SessionError> {
        let progression = library.get(index).ok_or(SessionError::NoProgression(index))?;
        self.set_progression(progression);
        self.last_index = Some(index);
        info!(index, bars = self.bars.len(), "loaded progression");
        Ok(())
    }

    /// Load bars that did not come from the library, e.g. typed by the user
    pub fn load_bars(&mut self, bars: Vec<Bar>, library: &ProgressionLibrary) {
        self.set_progression(&Progression::from_bars(bars));
        self.match_music(library);
    }

    fn set_progression(&mut self, progression: &Progression) {
        self.bars = progression.bars().cloned().collect();
        self.parents = self
            .bars
            .iter()
            .map(|bar| bar.iter().map(|chord| diatonic_parent(chord)).collect())
            .collect();
        self.substituted = self
            .bars
            .iter()
            .zip(&self.parents)
            .map(|(bar, parents)| bar.iter().zip(parents).map(|(c, p)| c != p).collect())
            .collect();
        self.music = progression.music.clone();
    }

    fn match_music(&mut self, library: &ProgressionLibrary) {
        self.music = library.find_music(&self.flattened_chords()).to_vec();
        if !self.music.is_empty() {
            debug!(count = self.music.len(), "progression matches known music");
        }
    }

    pub fn key(&self) -> Key {
        self.key
    }

    pub fn set_key(&mut self, key: Key) {
        self.key = key;
    }

    pub fn show_degrees(&self) -> bool {
        self.show_degrees
    }

    /// Switch between degree and note-name display
    pub fn toggle_display(&mut self) {
        self.show_degrees = !self.show_degrees;
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    /// Set the tempo, clamped to 60..=200
    pub fn set_bpm(&mut self, bpm: u32) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn parents(&self) -> &[Vec<String>] {
        &self.parents
    }

    pub fn music(&self) -> &[MusicReference] {
        &self.music
    }

    pub fn is_substituted(&self, bar: usize, chord: usize) -> bool {
        self.substituted
            .get(bar)
            .and_then(|flags| flags.get(chord))
            .copied()
            .unwrap_or(false)
    }

    /// A bar as it should be shown: degrees, or note symbols in the session key
    pub fn display_bar(&self, bar: usize) -> Option<Vec<String>> {
        let chords = self.bars.get(bar)?;
        Some(
            chords
                .iter()
                .map(|chord| {
                    if self.show_degrees {
                        chord.clone()
                    } else {
                        degree_to_note_in(self.key, chord)
                    }
                })
                .collect(),
        )
    }

    /// All chords in playing order
    pub fn flattened_chords(&self) -> Vec<String> {
        self.bars.iter().flatten().cloned().collect()
    }

    /// Insert a tonic chord at `position`, or at the end of the bar
    pub fn add_chord(
        &mut self,
        bar: usize,
        position: Option<usize>,
        library: &ProgressionLibrary,
    ) -> Result<(), SessionError> {
        let chords = self.bars.get_mut(bar).ok_or(SessionError::NoBar(bar))?;
        let at = position.unwrap_or(chords.len()).min(chords.len());

        chords.insert(at, NEW_CHORD.to_string());
        self.parents[bar].insert(at, NEW_CHORD.to_string());
        self.substituted[bar].insert(at, false);

        self.match_music(library);
        Ok(())
    }

    /// Remove a chord; a bar always keeps at least one chord
    pub fn remove_chord(
        &mut self,
        bar: usize,
        chord: usize,
        library: &ProgressionLibrary,
    ) -> Result<(), SessionError> {
        let chords = self.bars.get_mut(bar).ok_or(SessionError::NoBar(bar))?;
        if chord >= chords.len() {
            return Err(SessionError::NoChord { bar, chord });
        }
        if chords.len() == 1 {
            return Err(SessionError::LastChord(bar));
        }

        chords.remove(chord);
        self.parents[bar].remove(chord);
        self.substituted[bar].remove(chord);

        self.match_music(library);
        Ok(())
    }

    /// Put a chosen chord in place; its parent is recomputed
    pub fn select_chord(
        &mut self,
        bar: usize,
        chord: usize,
        degree: &str,
        library: &ProgressionLibrary,
    ) -> Result<(), SessionError> {
        let slot = self.chord_mut(bar, chord)?;
        *slot = degree.to_string();

        let parent = diatonic_parent(degree);
        self.substituted[bar][chord] = degree != parent;
        self.parents[bar][chord] = parent;

        self.match_music(library);
        Ok(())
    }

    /// Swap a chord for another that serves the same parent
    pub fn substitute<R: Rng + ?Sized>(
        &mut self,
        bar: usize,
        chord: usize,
        table: &SubstitutionTable,
        library: &ProgressionLibrary,
        rng: &mut R,
    ) -> Result<String, SessionError> {
        let current = self.chord_mut(bar, chord)?.clone();
        let parent = self.parents[bar][chord].clone();

        let replacement = substitute(&current, &parent, table, rng)?;
        self.bars[bar][chord] = replacement.clone();
        self.substituted[bar][chord] = replacement != parent;

        self.match_music(library);
        Ok(replacement)
    }

    fn chord_mut(&mut self, bar: usize, chord: usize) -> Result<&mut String, SessionError> {
        self.bars
            .get_mut(bar)
            .ok_or(SessionError::NoBar(bar))?
            .get_mut(chord)
            .ok_or(SessionError::NoChord { bar, chord })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::SubstitutionGroup;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn bars(text: &str) -> Vec<Bar> {
        crate::progression::parse_bars(text)
    }

    fn library() -> ProgressionLibrary {
        let json = r#"[{ "progressions": [
            { "chords": ["1", "5", "6m", "4"],
              "music": [{ "title": "Let It Be", "artist": "The Beatles" }] },
            { "chords": [["2m", "5"], ["1"]] }
        ] }]"#;
        ProgressionLibrary::from_json_str(json).unwrap()
    }

    fn session_with(text: &str) -> Session {
        let mut session = Session::default();
        session.load_bars(bars(text), &library());
        session
    }

    #[test]
    fn test_refresh_alternates_between_progressions() {
        let library = library();
        let mut session = Session::default();
        let mut rng = StdRng::seed_from_u64(3);

        session.refresh(&library, &mut rng).unwrap();
        let first = session.flattened_chords();
        session.refresh(&library, &mut rng).unwrap();
        assert_ne!(session.flattened_chords(), first);
    }

    #[test]
    fn test_refresh_empty_library() {
        let mut session = Session::default();
        let mut rng = StdRng::seed_from_u64(3);
        let empty = ProgressionLibrary::new(vec![]);
        assert_eq!(session.refresh(&empty, &mut rng), Err(SessionError::EmptyLibrary));
    }

    #[test]
    fn test_load_out_of_range() {
        let mut session = Session::default();
        assert_eq!(session.load(&library(), 99), Err(SessionError::NoProgression(99)));
        assert_eq!(
            SessionError::NoProgression(99).to_string(),
            "no progression at index 99"
        );
    }

    #[test]
    fn test_load_annotates_parents() {
        let mut session = Session::default();
        session.load_bars(bars("1 b6 | 5"), &library());

        assert_eq!(session.parents(), &[vec!["1", "6m"], vec!["5"]]);
        assert!(!session.is_substituted(0, 0));
        assert!(session.is_substituted(0, 1));
        assert!(!session.is_substituted(1, 0));
        assert!(!session.is_substituted(9, 9));
    }

    #[test]
    fn test_load_takes_music_from_progression() {
        let mut session = Session::default();
        session.load(&library(), 0).unwrap();
        assert_eq!(session.music()[0].title, "Let It Be");

        session.load(&library(), 1).unwrap();
        assert!(session.music().is_empty());
    }

    #[test]
    fn test_display_bar() {
        let mut session = session_with("1 6m7 | 5/7");
        session.set_key(Key::from_name("D").unwrap());

        assert!(session.show_degrees());
        assert_eq!(session.display_bar(0).unwrap(), vec!["1", "6m7"]);
        assert!(session.display_bar(2).is_none());

        session.toggle_display();
        assert!(!session.show_degrees());
        assert_eq!(session.display_bar(0).unwrap(), vec!["D", "Bm7"]);
        assert_eq!(session.display_bar(1).unwrap(), vec!["A/7"]);
    }

    #[test]
    fn test_bpm_is_clamped() {
        let mut session = Session::default();
        assert_eq!(session.bpm(), 200);
        session.set_bpm(30);
        assert_eq!(session.bpm(), 60);
        session.set_bpm(500);
        assert_eq!(session.bpm(), 200);
        session.set_bpm(120);
        assert_eq!(session.bpm(), 120);
    }

    #[test]
    fn test_add_chord() {
        let library = library();
        let mut session = session_with("2m | 5");

        session.add_chord(0, None, &library).unwrap();
        session.add_chord(1, Some(0), &library).unwrap();
        assert_eq!(session.bars(), &[vec!["2m", "1"], vec!["1", "5"]]);
        assert_eq!(session.parents()[1], vec!["1", "5"]);
        assert!(!session.is_substituted(1, 0));

        session.add_chord(1, Some(99), &library).unwrap();
        assert_eq!(session.bars()[1], vec!["1", "5", "1"]);
        assert_eq!(session.add_chord(5, None, &library), Err(SessionError::NoBar(5)));
    }

    #[test]
    fn test_add_chord_rematches_music() {
        let library = library();
        let mut session = session_with("1 | 5 | 6m");
        assert!(session.music().is_empty());

        session.add_chord(2, None, &library).unwrap();
        session.select_chord(2, 1, "4", &library).unwrap();
        assert_eq!(session.music()[0].title, "Let It Be");
    }

    #[test]
    fn test_remove_chord() {
        let library = library();
        let mut session = session_with("2m 5 | 1");

        assert_eq!(session.remove_chord(1, 0, &library), Err(SessionError::LastChord(1)));
        assert_eq!(
            session.remove_chord(0, 4, &library),
            Err(SessionError::NoChord { bar: 0, chord: 4 })
        );

        session.remove_chord(0, 0, &library).unwrap();
        assert_eq!(session.bars(), &[vec!["5"], vec!["1"]]);
        assert_eq!(session.parents()[0], vec!["5"]);
    }

    #[test]
    fn test_select_chord_recomputes_parent() {
        let library = library();
        let mut session = session_with("1 | 4");

        session.select_chord(1, 0, "b7", &library).unwrap();
        assert_eq!(session.bars()[1], vec!["b7"]);
        assert_eq!(session.parents()[1], vec!["7o"]);
        assert!(session.is_substituted(1, 0));

        session.select_chord(1, 0, "2m", &library).unwrap();
        assert!(!session.is_substituted(1, 0));
    }

    #[test]
    fn test_substitute_keeps_parent() {
        let library = library();
        let table = SubstitutionTable::new().with(
            "5",
            SubstitutionGroup {
                function: vec!["7o".into()],
                modal: vec![],
                tritone: vec!["b2".into()],
            },
        );
        let mut session = session_with("5");
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..10 {
            let chord = session.substitute(0, 0, &table, &library, &mut rng).unwrap();
            assert_eq!(session.bars()[0][0], chord);
            assert_eq!(session.parents()[0][0], "5");
            assert_eq!(session.is_substituted(0, 0), chord != "5");
        }
    }

    #[test]
    fn test_substitute_errors() {
        let library = library();
        let table = SubstitutionTable::new();
        let mut session = session_with("1");
        let mut rng = StdRng::seed_from_u64(11);

        assert_eq!(
            session.substitute(0, 0, &table, &library, &mut rng),
            Err(SessionError::Substitution(SubstitutionError::NoEntry("1".into())))
        );
        assert_eq!(
            session.substitute(0, 1, &table, &library, &mut rng),
            Err(SessionError::NoChord { bar: 0, chord: 1 })
        );
    }
}
