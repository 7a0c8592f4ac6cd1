//! Chord tone extraction

use super::degree::split_slash;
use super::pitch::{split_note_name, PitchClass};
use super::quality::ChordSpec;

/// Pitch classes of a chord symbol's upper structure.
///
/// The slash bass is ignored. An unrecognised root is read as C and an
/// unrecognised quality as a major triad, so the result is never empty.
///
/// ```
/// use chordgen::theory::chord_tones;
///
/// let names: Vec<_> = chord_tones("Cm7").iter().map(|p| p.name()).collect();
/// assert_eq!(names, ["C", "D#", "G", "A#"]);
/// ```
pub fn chord_tones(symbol: &str) -> Vec<PitchClass> {
    let (upper, _) = split_slash(symbol);
    let (root, suffix) = split_note_name(upper).unwrap_or((PitchClass::C, upper));

    ChordSpec::parse(suffix)
        .intervals()
        .into_iter()
        .map(|interval| root.transpose(interval as i32))
        .collect()
}

/// Chord tones as sharp-spelled names
pub fn chord_tone_names(symbol: &str) -> Vec<&'static str> {
    chord_tones(symbol).into_iter().map(PitchClass::name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seventh_chords() {
        assert_eq!(chord_tone_names("Cm7"), vec!["C", "D#", "G", "A#"]);
        assert_eq!(chord_tone_names("G7"), vec!["G", "B", "D", "F"]);
        assert_eq!(chord_tone_names("Fmaj7"), vec!["F", "A", "C", "E"]);
        assert_eq!(chord_tone_names("AmM7"), vec!["A", "C", "E", "G#"]);
    }

    #[test]
    fn test_triads() {
        assert_eq!(chord_tone_names("C"), vec!["C", "E", "G"]);
        assert_eq!(chord_tone_names("Am"), vec!["A", "C", "E"]);
        assert_eq!(chord_tone_names("Bo"), vec!["B", "D", "F"]);
        assert_eq!(chord_tone_names("C+"), vec!["C", "E", "G#"]);
        assert_eq!(chord_tone_names("Dsus4"), vec!["D", "G", "A"]);
        assert_eq!(chord_tone_names("Dsus2"), vec!["D", "E", "A"]);
    }

    #[test]
    fn test_flat_roots() {
        assert_eq!(chord_tone_names("Bb"), vec!["A#", "D", "F"]);
        assert_eq!(chord_tone_names("Dbm"), vec!["C#", "E", "G#"]);
    }

    #[test]
    fn test_slash_bass_is_dropped() {
        assert_eq!(chord_tone_names("G/7"), vec!["G", "B", "D"]);
        assert_eq!(chord_tone_names("C/E"), vec!["C", "E", "G"]);
    }

    #[test]
    fn test_unknown_quality_is_major_triad() {
        for root in ["C", "F#", "Ab"] {
            let tones = chord_tones(&format!("{}xyz", root));
            let root = PitchClass::parse(root).unwrap();
            assert_eq!(tones, vec![root, root.transpose(4), root.transpose(7)]);
        }
    }

    #[test]
    fn test_unknown_root_is_c() {
        assert_eq!(chord_tone_names("m7"), vec!["C", "D#", "G", "A#"]);
        assert_eq!(chord_tone_names(""), vec!["C", "E", "G"]);
    }

    #[test]
    fn test_never_empty() {
        for symbol in ["C(no3, no5)", "Xno3no5", "G7no3no5", "/"] {
            assert!(!chord_tones(symbol).is_empty(), "{}", symbol);
        }
    }

    #[test]
    fn test_omissions_apply_after_quality() {
        assert_eq!(chord_tone_names("Cno3"), vec!["C", "F#"]);
        assert_eq!(chord_tone_names("Cno5"), vec!["C", "D#", "F#"]);
        assert_eq!(chord_tone_names("Cm7no5"), vec!["C", "D#", "A#"]);
    }
}
