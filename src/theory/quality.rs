//! Chord quality parsing
//!
//! The quality suffix of a chord symbol is free text (`"m7"`, `"sus4"`,
//! `"add9"`, `"7b9"`, `"(6, no3)"`). It is matched against the known
//! qualities most specific first, as written; anything unrecognised is a
//! major triad. Omission markers and altered extensions are then applied on
//! top of the quality's intervals whichever quality matched, so `"no5"` on
//! its own still reads as diminished because of its `o`.

/// Recognised chord qualities
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordQuality {
    /// Major triad, also the fallback for unrecognised suffixes
    Major,
    Minor,
    Diminished,
    Augmented,
    /// Suspended fourth (`sus4` and bare `sus`)
    Sus4,
    Sus2,
    DominantSeventh,
    MajorSeventh,
    MinorSeventh,
    MinorMajorSeventh,
    MajorSixth,
    MinorSixth,
    SixNine,
    /// Major triad with added tones (intervals above the root)
    Added(Vec<u8>),
}

impl ChordQuality {
    /// Match a suffix (omission markers already removed) to a quality
    pub fn parse(suffix: &str) -> Self {
        let q = suffix;

        if q.contains("mM7") {
            ChordQuality::MinorMajorSeventh
        } else if q.contains("m7") {
            ChordQuality::MinorSeventh
        } else if q.contains("maj7") || q.contains("M7") || q.contains("Δ7") {
            ChordQuality::MajorSeventh
        } else if q.contains('7') {
            ChordQuality::DominantSeventh
        } else if q.contains('6') {
            if q.contains("m6") {
                ChordQuality::MinorSixth
            } else if q.contains("69") {
                ChordQuality::SixNine
            } else {
                ChordQuality::MajorSixth
            }
        } else if q.contains("dim") || q.contains('o') {
            ChordQuality::Diminished
        } else if q.contains('m') {
            ChordQuality::Minor
        } else if q.contains("aug") || q.contains('+') {
            ChordQuality::Augmented
        } else if q.contains("sus4") {
            ChordQuality::Sus4
        } else if q.contains("sus2") {
            ChordQuality::Sus2
        } else if q.contains("sus") {
            ChordQuality::Sus4
        } else if q.contains("add") || q.contains('(') {
            ChordQuality::Added(added_intervals(q))
        } else {
            ChordQuality::Major
        }
    }

    /// Intervals above the root, in semitones
    pub fn intervals(&self) -> Vec<u8> {
        match self {
            ChordQuality::Major => vec![0, 4, 7],
            ChordQuality::Minor => vec![0, 3, 7],
            ChordQuality::Diminished => vec![0, 3, 6],
            ChordQuality::Augmented => vec![0, 4, 8],
            ChordQuality::Sus4 => vec![0, 5, 7],
            ChordQuality::Sus2 => vec![0, 2, 7],
            ChordQuality::DominantSeventh => vec![0, 4, 7, 10],
            ChordQuality::MajorSeventh => vec![0, 4, 7, 11],
            ChordQuality::MinorSeventh => vec![0, 3, 7, 10],
            ChordQuality::MinorMajorSeventh => vec![0, 3, 7, 11],
            ChordQuality::MajorSixth => vec![0, 4, 7, 9],
            ChordQuality::MinorSixth => vec![0, 3, 7, 9],
            ChordQuality::SixNine => vec![0, 4, 7, 9, 2],
            ChordQuality::Added(extra) => {
                let mut intervals = vec![0, 4, 7];
                for &interval in extra {
                    if !intervals.contains(&interval) {
                        intervals.push(interval);
                    }
                }
                intervals.sort_unstable();
                intervals
            }
        }
    }
}

/// An altered extension such as `b5` or `#9`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alteration {
    /// Unaltered interval above the root (reduced to one octave)
    pub base: u8,
    /// Altered interval above the root
    pub target: u8,
}

/// A fully parsed quality suffix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordSpec {
    pub quality: ChordQuality,
    /// `no3`: drop both the major and the minor third
    pub omit_third: bool,
    /// `no5`: drop the perfect fifth
    pub omit_fifth: bool,
    pub alterations: Vec<Alteration>,
}

impl ChordSpec {
    /// Parse a quality suffix
    pub fn parse(suffix: &str) -> Self {
        let quality = ChordQuality::parse(suffix);
        // Parenthesised numbers are additions only when they built the quality
        let skip_parentheses = matches!(quality, ChordQuality::Added(_));

        Self {
            alterations: parse_alterations(suffix, skip_parentheses),
            omit_third: suffix.contains("no3"),
            omit_fifth: suffix.contains("no5"),
            quality,
        }
    }

    /// Final interval set: quality, then omissions, then alterations.
    /// The root (0) is never removed, so the result is never empty.
    pub fn intervals(&self) -> Vec<u8> {
        let mut intervals = self.quality.intervals();

        if self.omit_third {
            intervals.retain(|&i| i != 3 && i != 4);
        }
        if self.omit_fifth {
            intervals.retain(|&i| i != 7);
        }

        for alteration in &self.alterations {
            match intervals.iter().position(|&i| i == alteration.base) {
                Some(index) => intervals[index] = alteration.target,
                None => intervals.push(alteration.target),
            }
        }

        let mut seen = Vec::with_capacity(intervals.len());
        intervals.retain(|i| {
            if seen.contains(i) {
                false
            } else {
                seen.push(*i);
                true
            }
        });
        intervals
    }
}

/// Unaltered interval of a chord extension number (9 -> 2, 11 -> 5, 13 -> 9)
fn extension_interval(number: u32) -> Option<i32> {
    match number {
        2 | 9 => Some(2),
        3 => Some(4),
        4 | 11 => Some(5),
        5 => Some(7),
        6 | 13 => Some(9),
        7 => Some(11),
        _ => None,
    }
}

/// Split a leading accidental off an extension token: `"#11"` -> `(1, "11")`
fn split_accidental(token: &str) -> (i32, &str) {
    if let Some(rest) = token.strip_prefix("bb") {
        (-2, rest)
    } else if let Some(rest) = token.strip_prefix("##") {
        (2, rest)
    } else if let Some(rest) = token.strip_prefix('b') {
        (-1, rest)
    } else if let Some(rest) = token.strip_prefix('#') {
        (1, rest)
    } else {
        (0, token)
    }
}

/// Tones added on top of the major triad by `add` or `(...)` notation
fn added_intervals(q: &str) -> Vec<u8> {
    if let Some(open) = q.find('(') {
        let inner = &q[open + 1..];
        let inner = inner.split(')').next().unwrap_or(inner);

        return inner
            .split(',')
            .map(str::trim)
            .filter_map(|part| {
                let (offset, digits) = split_accidental(part);
                if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                let number = digits.parse().ok()?;
                extension_interval(number).map(|base| (base + offset).rem_euclid(12) as u8)
            })
            .collect();
    }

    let added = if q.contains("add2") || q.contains("add9") {
        Some(2)
    } else if q.contains("add#4") {
        Some(6)
    } else if q.contains("add4") {
        Some(5)
    } else if q.contains("add6") {
        Some(9)
    } else if q.contains("add#5") {
        Some(8)
    } else {
        None
    };

    added.into_iter().collect()
}

/// Altered extensions written outside `add` tokens (and parentheses, if asked)
fn parse_alterations(q: &str, skip_parentheses: bool) -> Vec<Alteration> {
    let mut alterations = Vec::new();
    let mut depth = 0usize;
    let mut i = 0;

    while i < q.len() {
        let rest = &q[i..];
        let Some(c) = rest.chars().next() else { break };

        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            'b' | '#' if (depth == 0 || !skip_parentheses) && !q[..i].ends_with("add") => {
                let (offset, tail) = split_accidental(rest);
                let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).take(2).collect();
                if let Some(base) = digits.parse().ok().and_then(extension_interval) {
                    alterations.push(Alteration {
                        base: base as u8,
                        target: (base + offset).rem_euclid(12) as u8,
                    });
                    i += (rest.len() - tail.len()) + digits.len();
                    continue;
                }
            }
            _ => {}
        }

        i += c.len_utf8();
    }

    alterations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_order() {
        assert_eq!(ChordQuality::parse("mM7"), ChordQuality::MinorMajorSeventh);
        assert_eq!(ChordQuality::parse("m7"), ChordQuality::MinorSeventh);
        assert_eq!(ChordQuality::parse("maj7"), ChordQuality::MajorSeventh);
        assert_eq!(ChordQuality::parse("M7"), ChordQuality::MajorSeventh);
        assert_eq!(ChordQuality::parse("Δ7"), ChordQuality::MajorSeventh);
        assert_eq!(ChordQuality::parse("7"), ChordQuality::DominantSeventh);
        assert_eq!(ChordQuality::parse("o"), ChordQuality::Diminished);
        assert_eq!(ChordQuality::parse("dim"), ChordQuality::Diminished);
        assert_eq!(ChordQuality::parse("m"), ChordQuality::Minor);
        assert_eq!(ChordQuality::parse("aug"), ChordQuality::Augmented);
        assert_eq!(ChordQuality::parse("+"), ChordQuality::Augmented);
        assert_eq!(ChordQuality::parse("sus4"), ChordQuality::Sus4);
        assert_eq!(ChordQuality::parse("sus2"), ChordQuality::Sus2);
        assert_eq!(ChordQuality::parse("sus"), ChordQuality::Sus4);
        assert_eq!(ChordQuality::parse(""), ChordQuality::Major);
        assert_eq!(ChordQuality::parse("xyz"), ChordQuality::Major);
    }

    #[test]
    fn test_sixth_chords() {
        assert_eq!(ChordQuality::parse("6"), ChordQuality::MajorSixth);
        assert_eq!(ChordQuality::parse("m6"), ChordQuality::MinorSixth);
        assert_eq!(ChordQuality::parse("69"), ChordQuality::SixNine);
        assert_eq!(ChordQuality::SixNine.intervals(), vec![0, 4, 7, 9, 2]);
    }

    #[test]
    fn test_add_chords() {
        assert_eq!(ChordQuality::parse("add9").intervals(), vec![0, 2, 4, 7]);
        assert_eq!(ChordQuality::parse("add2").intervals(), vec![0, 2, 4, 7]);
        assert_eq!(ChordQuality::parse("add#4").intervals(), vec![0, 4, 6, 7]);
        assert_eq!(ChordQuality::parse("add4").intervals(), vec![0, 4, 5, 7]);
        assert_eq!(ChordQuality::parse("add#5").intervals(), vec![0, 4, 7, 8]);
        assert_eq!(ChordQuality::parse("add").intervals(), vec![0, 4, 7]);
    }

    #[test]
    fn test_parenthesised_additions() {
        assert_eq!(ChordQuality::parse("(9)").intervals(), vec![0, 2, 4, 7]);
        assert_eq!(ChordQuality::parse("(#11)").intervals(), vec![0, 4, 6, 7]);
        assert_eq!(ChordQuality::parse("(9, 11)").intervals(), vec![0, 2, 4, 5, 7]);
    }

    #[test]
    fn test_omissions() {
        assert_eq!(ChordSpec::parse("7no5").intervals(), vec![0, 4, 10]);
        assert_eq!(ChordSpec::parse("m7no3").intervals(), vec![0, 7, 10]);
        assert_eq!(ChordSpec::parse("maj7(no3)").intervals(), vec![0, 7, 11]);
        assert_eq!(ChordSpec::parse("(6, no3)").intervals(), vec![0, 7, 9]);
    }

    #[test]
    fn test_omission_marker_matches_as_written() {
        // the 'o' of "no5" reads as diminished, then the omission applies
        assert_eq!(ChordSpec::parse("no5").quality, ChordQuality::Diminished);
        assert_eq!(ChordSpec::parse("no5").intervals(), vec![0, 3, 6]);
        assert_eq!(ChordSpec::parse("no3").intervals(), vec![0, 6]);
        assert_eq!(ChordSpec::parse("sus2(no5)").quality, ChordQuality::Diminished);
        assert_eq!(ChordSpec::parse("(no3, no5)").intervals(), vec![0, 6]);
    }

    #[test]
    fn test_alterations() {
        assert_eq!(ChordSpec::parse("m7b5").intervals(), vec![0, 3, 6, 10]);
        assert_eq!(ChordSpec::parse("7#5").intervals(), vec![0, 4, 8, 10]);
        assert_eq!(ChordSpec::parse("7b9").intervals(), vec![0, 4, 7, 10, 1]);
        assert_eq!(ChordSpec::parse("7#11").intervals(), vec![0, 4, 7, 10, 6]);
        assert_eq!(ChordSpec::parse("7b13").intervals(), vec![0, 4, 7, 10, 8]);
    }

    #[test]
    fn test_parenthesised_alterations() {
        assert_eq!(ChordSpec::parse("7(b9)").intervals(), vec![0, 4, 7, 10, 1]);
        assert_eq!(ChordSpec::parse("7(#9)").intervals(), vec![0, 4, 7, 10, 3]);
        assert_eq!(ChordSpec::parse("m7(b5)").intervals(), vec![0, 3, 6, 10]);
        assert_eq!(ChordSpec::parse("7(b9, #11)").alterations.len(), 2);
    }

    #[test]
    fn test_add_tokens_are_not_alterations() {
        assert!(ChordSpec::parse("add#5").alterations.is_empty());
        assert!(ChordSpec::parse("(#11)").alterations.is_empty());
        assert_eq!(ChordSpec::parse("add#5").intervals(), vec![0, 4, 7, 8]);
    }
}
