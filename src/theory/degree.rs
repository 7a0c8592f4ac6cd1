//! Scale-degree notation
//!
//! Degree chords are written relative to the key: an optional accidental,
//! a scale degree 1-7 and a free-form quality suffix (`"5"`, `"6m7"`,
//! `"b7"`, `"5/7"`). Converting to a chord symbol only resolves the root;
//! the suffix is carried over untouched.

use super::pitch::{split_note_name, Key, PitchClass, MAJOR_SCALE};

/// Accidental in front of a scale degree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accidental {
    Natural,
    Flat,
    Sharp,
    DoubleFlat,
    DoubleSharp,
}

impl Accidental {
    /// Semitone adjustment applied to the degree's scale interval
    pub fn offset(self) -> i32 {
        match self {
            Accidental::Natural => 0,
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
            Accidental::DoubleFlat => -2,
            Accidental::DoubleSharp => 2,
        }
    }
}

/// A parsed degree token: `[accidental][1-7][suffix]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DegreeToken<'a> {
    pub accidental: Accidental,
    /// Scale degree, 1-7
    pub degree: u8,
    pub suffix: &'a str,
}

impl<'a> DegreeToken<'a> {
    /// Parse degree notation. Returns `None` when there is no degree 1-7.
    pub fn parse(notation: &'a str) -> Option<Self> {
        let (accidental, rest) = if let Some(rest) = notation.strip_prefix("bb") {
            (Accidental::DoubleFlat, rest)
        } else if let Some(rest) = notation.strip_prefix("##") {
            (Accidental::DoubleSharp, rest)
        } else if let Some(rest) = notation.strip_prefix('b') {
            (Accidental::Flat, rest)
        } else if let Some(rest) = notation.strip_prefix('#') {
            (Accidental::Sharp, rest)
        } else {
            (Accidental::Natural, notation)
        };

        let digit = rest.chars().next()?.to_digit(10)?;
        if !(1..=7).contains(&digit) {
            return None;
        }

        Some(Self {
            accidental,
            degree: digit as u8,
            suffix: &rest[1..],
        })
    }

    /// Semitones above the key root
    pub fn interval(&self) -> i32 {
        MAJOR_SCALE[(self.degree - 1) as usize] + self.accidental.offset()
    }

    /// Root pitch class of this degree in the given key
    pub fn root_in(&self, key: Key) -> PitchClass {
        key.root().transpose(self.interval())
    }
}

/// Split a chord at its slash bass: `"5/7"` -> `("5", Some("7"))`
pub fn split_slash(chord: &str) -> (&str, Option<&str>) {
    match chord.split_once('/') {
        Some((upper, bass)) => (upper, Some(bass)),
        None => (chord, None),
    }
}

/// The leading `[b#]?[1-7]` part of a degree chord, if any
pub fn degree_prefix(chord: &str) -> Option<&str> {
    let accidental_len = match chord.chars().next()? {
        'b' | '#' => 1,
        _ => 0,
    };
    let digit = chord[accidental_len..].chars().next()?;
    if ('1'..='7').contains(&digit) {
        Some(&chord[..accidental_len + 1])
    } else {
        None
    }
}

/// Convert degree notation to a chord symbol in the named key.
///
/// Unrecognised keys and unparseable notation return the input unchanged.
///
/// ```
/// use chordgen::theory::degree_to_note;
///
/// assert_eq!(degree_to_note("C", "5"), "G");
/// assert_eq!(degree_to_note("C", "6m7"), "Am7");
/// assert_eq!(degree_to_note("D", "b7"), "C");
/// assert_eq!(degree_to_note("H", "5"), "5");
/// ```
pub fn degree_to_note(key: &str, notation: &str) -> String {
    match Key::from_name(key) {
        Some(key) => degree_to_note_in(key, notation),
        None => notation.to_string(),
    }
}

/// Convert degree notation to a chord symbol in an already-resolved key
pub fn degree_to_note_in(key: Key, notation: &str) -> String {
    match DegreeToken::parse(notation) {
        Some(token) => format!("{}{}", token.root_in(key).name(), token.suffix),
        None => notation.to_string(),
    }
}

/// Bass note of a degree chord: the slash bass if one is given, otherwise the root
pub fn bass_note(key: Key, notation: &str) -> PitchClass {
    let (upper, bass) = split_slash(notation);

    if let Some(bass) = bass {
        if let Some(token) = degree_prefix(bass).and_then(DegreeToken::parse) {
            return token.root_in(key);
        }
        if let Some((pitch, _)) = split_note_name(bass) {
            return pitch;
        }
    }

    let symbol = degree_to_note_in(key, upper);
    split_note_name(&symbol)
        .map(|(pitch, _)| pitch)
        .unwrap_or(PitchClass::C)
}
