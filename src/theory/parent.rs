//! Diatonic parent resolution
//!
//! Borrowed and chromatic chords stand in for a chord of the major scale.
//! The parent drives both the "substituted" highlight and the substitution
//! table lookup.

use super::degree::{degree_prefix, split_slash};

/// Chromatic degrees and the diatonic chord they substitute for
const CHROMATIC_PARENTS: [(&str, &str); 10] = [
    ("b2", "2m"),
    ("#1", "2m"),
    ("b3", "3m"),
    ("#2", "3m"),
    ("#4", "4"),
    ("b5", "5"),
    ("b6", "6m"),
    ("#5", "6m"),
    ("b7", "7o"),
    ("#6", "7o"),
];

/// Resolve the diatonic parent of a degree chord.
///
/// Slash chords inherit the parent of their upper structure. Chords that are
/// already diatonic, or not recognised at all, are their own parent.
///
/// ```
/// use chordgen::theory::diatonic_parent;
///
/// assert_eq!(diatonic_parent("b6"), "6m");
/// assert_eq!(diatonic_parent("b7m7/4"), "7o");
/// assert_eq!(diatonic_parent("1"), "1");
/// ```
pub fn diatonic_parent(chord: &str) -> String {
    let (base, _) = split_slash(chord);

    degree_prefix(base)
        .and_then(|degree| {
            CHROMATIC_PARENTS
                .iter()
                .find(|(chromatic, _)| *chromatic == degree)
                .map(|(_, parent)| parent.to_string())
        })
        .unwrap_or_else(|| base.to_string())
}

/// Whether a chord differs from its own diatonic parent
pub fn is_substitution(chord: &str) -> bool {
    diatonic_parent(chord) != chord
}
