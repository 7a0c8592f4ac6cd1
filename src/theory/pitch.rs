//! Pitch classes, keys and reference frequencies

use std::fmt;

/// Sharp-spelled pitch names, indexed by semitone above C
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Major scale intervals for degrees 1-7
pub const MAJOR_SCALE: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Frequencies of octave 0, indexed by pitch class
const OCTAVE_ZERO_HZ: [f64; 12] = [
    16.35, 17.32, 18.35, 19.45, 20.60, 21.83, 23.12, 24.50, 25.96, 27.50, 29.14, 30.87,
];

/// One of the twelve pitch classes (0 = C ... 11 = B)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);

    /// Create a pitch class from any semitone offset, reduced mod 12
    pub fn new(semitones: i32) -> Self {
        Self(semitones.rem_euclid(12) as u8)
    }

    /// Semitones above C (0-11)
    pub fn semitone(self) -> u8 {
        self.0
    }

    /// Sharp-spelled name
    pub fn name(self) -> &'static str {
        NOTE_NAMES[self.0 as usize]
    }

    /// Transpose by a number of semitones
    pub fn transpose(self, semitones: i32) -> Self {
        Self::new(self.0 as i32 + semitones)
    }

    /// Parse a note name such as `C`, `F#` or `Bb`
    pub fn parse(name: &str) -> Option<Self> {
        let (pitch, rest) = split_note_name(name)?;
        if rest.is_empty() {
            Some(pitch)
        } else {
            None
        }
    }

    /// Frequency in Hz of this pitch class in the given octave (A4 = 440 Hz)
    pub fn frequency(self, octave: i32) -> f64 {
        OCTAVE_ZERO_HZ[self.0 as usize] * 2.0_f64.powi(octave)
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split a leading note name (`[A-G][#b]?`) from the rest of a symbol
pub fn split_note_name(symbol: &str) -> Option<(PitchClass, &str)> {
    let mut chars = symbol.chars();
    let natural = match chars.next()? {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = &symbol[1..];
    let (offset, rest) = match rest.chars().next() {
        Some('#') => (1, &rest[1..]),
        Some('b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    Some((PitchClass::new(natural + offset), rest))
}

/// Recognised key names, in chromatic order from C
pub const KEY_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

/// A musical key: one of the twelve recognised key names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    root: PitchClass,
}

impl Key {
    /// Look up a key by name. Only the names in [`KEY_NAMES`] are recognised.
    pub fn from_name(name: &str) -> Option<Self> {
        KEY_NAMES
            .iter()
            .position(|&k| k == name)
            .map(|i| Self { root: PitchClass::new(i as i32) })
    }

    /// All twelve keys in chromatic order
    pub fn all() -> impl Iterator<Item = Key> {
        (0..12).map(|i| Self { root: PitchClass::new(i) })
    }

    /// Root pitch class of the key
    pub fn root(self) -> PitchClass {
        self.root
    }

    /// Canonical key name
    pub fn name(self) -> &'static str {
        KEY_NAMES[self.root.semitone() as usize]
    }
}

impl Default for Key {
    fn default() -> Self {
        Self { root: PitchClass::C }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
