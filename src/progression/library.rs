//! Progression library
//!
//! Progressions are read-only reference data, grouped and stored as JSON.
//! A progression's `chords` may be written three ways:
//!
//! - a flat list, one chord per bar: `["1", "4", "5"]`
//! - a list of bars: `[["1", "5/7"], "6m", ["4", "5"]]`
//! - a list of phrases: `[[["1"], ["4"]], [["5"], ["1"]]]`

use anyhow::{Context, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Degree chords sounding in one measure, sharing it equally
pub type Bar = Vec<String>;

/// An ordered run of bars
pub type Phrase = Vec<Bar>;

/// A piece of music that uses a progression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicReference {
    pub title: String,
    pub artist: String,
    /// Section of the piece, e.g. "Chorus"
    #[serde(default)]
    pub part: Option<String>,
}

/// A progression with its citations
#[derive(Debug, Clone, PartialEq)]
pub struct Progression {
    pub phrases: Vec<Phrase>,
    pub music: Vec<MusicReference>,
}

impl Progression {
    /// Build a single-phrase progression from bars
    pub fn from_bars(bars: Vec<Bar>) -> Self {
        Self {
            phrases: vec![bars],
            music: Vec::new(),
        }
    }

    /// All bars, phrase boundaries removed
    pub fn bars(&self) -> impl Iterator<Item = &Bar> {
        self.phrases.iter().flatten()
    }

    /// All chords in playing order
    pub fn chords(&self) -> impl Iterator<Item = &str> {
        self.bars().flatten().map(String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    progressions: Vec<ProgressionEntry>,
}

#[derive(Debug, Deserialize)]
struct ProgressionEntry {
    chords: ChordLayout,
    #[serde(default)]
    music: Vec<MusicReference>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChordLayout {
    Phrases(Vec<Vec<Vec<String>>>),
    Bars(Vec<BarEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BarEntry {
    Single(String),
    Chords(Vec<String>),
}

impl From<ProgressionEntry> for Progression {
    fn from(entry: ProgressionEntry) -> Self {
        let phrases = match entry.chords {
            ChordLayout::Phrases(phrases) => phrases,
            ChordLayout::Bars(bars) => vec![bars
                .into_iter()
                .map(|bar| match bar {
                    BarEntry::Single(chord) => vec![chord],
                    BarEntry::Chords(chords) => chords,
                })
                .collect()],
        };

        Self {
            phrases,
            music: entry.music,
        }
    }
}

const BUILTIN_PROGRESSIONS: &str = include_str!("../../data/progressions.json");

/// All known progressions
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressionLibrary {
    progressions: Vec<Progression>,
}

impl ProgressionLibrary {
    pub fn new(progressions: Vec<Progression>) -> Self {
        Self { progressions }
    }

    /// Parse the grouped JSON format
    pub fn from_json_str(json: &str) -> Result<Self> {
        let groups: Vec<GroupEntry> =
            serde_json::from_str(json).context("invalid progression data")?;

        let mut progressions = Vec::new();
        for group in groups {
            let name = group.name.as_deref().unwrap_or("unnamed");
            let before = progressions.len();
            progressions.extend(
                group
                    .progressions
                    .into_iter()
                    .map(Progression::from)
                    .filter(|p| p.chords().next().is_some()),
            );
            tracing::debug!(group = name, count = progressions.len() - before, "loaded group");
        }

        Ok(Self { progressions })
    }

    /// Load progressions from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read progressions: {:?}", path))?;
        let library = Self::from_json_str(&contents)?.or_fallback();
        info!(count = library.len(), "loaded progressions from {:?}", path);
        Ok(library)
    }

    /// The progressions shipped with the crate
    pub fn builtin() -> Self {
        match Self::from_json_str(BUILTIN_PROGRESSIONS) {
            Ok(library) => library.or_fallback(),
            Err(e) => {
                warn!("built-in progression data unreadable: {:#}", e);
                Self::fallback()
            }
        }
    }

    /// Two plain progressions used when no data is available
    pub fn fallback() -> Self {
        let bars = |chords: &[&str]| chords.iter().map(|c| vec![c.to_string()]).collect();
        Self::new(vec![
            Progression::from_bars(bars(&["1", "4", "5", "1"])),
            Progression::from_bars(bars(&["6m", "2m", "5", "1"])),
        ])
    }

    fn or_fallback(self) -> Self {
        if self.is_empty() {
            warn!("no progressions found, using fallback progressions");
            Self::fallback()
        } else {
            self
        }
    }

    pub fn len(&self) -> usize {
        self.progressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progressions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Progression> {
        self.progressions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Progression> {
        self.progressions.iter()
    }

    /// Pick a random progression index, avoiding `last` when there is a choice
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R, last: Option<usize>) -> Option<usize> {
        match self.progressions.len() {
            0 => None,
            1 => Some(0),
            n => loop {
                let index = rng.gen_range(0..n);
                if Some(index) != last {
                    break Some(index);
                }
            },
        }
    }

    /// Citations of the first progression that matches `chords` exactly
    /// and has any citations
    pub fn find_music<S: AsRef<str>>(&self, chords: &[S]) -> &[MusicReference] {
        self.progressions
            .iter()
            .find(|p| {
                !p.music.is_empty()
                    && p.chords().count() == chords.len()
                    && p.chords().zip(chords).all(|(a, b)| a == b.as_ref())
            })
            .map(|p| p.music.as_slice())
            .unwrap_or(&[])
    }
}

/// Parse bars written as text: bars separated by `|`, chords by whitespace.
///
/// ```
/// use chordgen::progression::parse_bars;
///
/// let bars = parse_bars("1 5/7 | 6m | 4 5");
/// assert_eq!(bars, vec![vec!["1", "5/7"], vec!["6m"], vec!["4", "5"]]);
/// ```
pub fn parse_bars(text: &str) -> Vec<Bar> {
    text.split('|')
        .map(|bar| bar.split_whitespace().map(str::to_string).collect::<Bar>())
        .filter(|bar| !bar.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
[
  {
    "name": "pop",
    "progressions": [
      {
        "chords": ["1", "5", "6m", "4"],
        "music": [{ "title": "Let It Be", "artist": "The Beatles", "part": "Verse" }]
      },
      { "chords": [["1", "5/7"], "6m", ["4", "5"]] },
      { "chords": [[["2m"], ["5"]], [["1"], ["1"]]] },
      { "chords": [] }
    ]
  },
  { "name": "empty" }
]
"#;

    #[test]
    fn test_chord_layouts() {
        let library = ProgressionLibrary::from_json_str(SAMPLE).unwrap();
        assert_eq!(library.len(), 3);

        let flat = library.get(0).unwrap();
        assert_eq!(flat.phrases.len(), 1);
        assert_eq!(flat.phrases[0], vec![vec!["1"], vec!["5"], vec!["6m"], vec!["4"]]);
        assert_eq!(flat.music[0].part.as_deref(), Some("Verse"));

        let bars = library.get(1).unwrap();
        assert_eq!(bars.phrases[0], vec![vec!["1", "5/7"], vec!["6m"], vec!["4", "5"]]);
        assert!(bars.music.is_empty());

        let phrased = library.get(2).unwrap();
        assert_eq!(phrased.phrases.len(), 2);
        assert_eq!(phrased.chords().collect::<Vec<_>>(), vec!["2m", "5", "1", "1"]);
    }

    #[test]
    fn test_invalid_json() {
        assert!(ProgressionLibrary::from_json_str("{ not json").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let library = ProgressionLibrary::load(file.path()).unwrap();
        assert_eq!(library.len(), 3);
    }

    #[test]
    fn test_empty_file_uses_fallback() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[]").unwrap();

        let library = ProgressionLibrary::load(file.path()).unwrap();
        assert_eq!(library, ProgressionLibrary::fallback());
    }

    #[test]
    fn test_builtin_library() {
        let library = ProgressionLibrary::builtin();
        assert!(library.len() > 2);
        assert!(library.iter().any(|p| !p.music.is_empty()));
    }

    #[test]
    fn test_pick_avoids_last() {
        let library = ProgressionLibrary::fallback();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert_eq!(library.pick(&mut rng, Some(0)), Some(1));
            assert_eq!(library.pick(&mut rng, Some(1)), Some(0));
        }
    }

    #[test]
    fn test_pick_single_and_empty() {
        let mut rng = StdRng::seed_from_u64(7);
        let single = ProgressionLibrary::new(vec![Progression::from_bars(vec![vec!["1".into()]])]);
        assert_eq!(single.pick(&mut rng, Some(0)), Some(0));
        assert_eq!(ProgressionLibrary::new(vec![]).pick(&mut rng, None), None);
    }

    #[test]
    fn test_find_music() {
        let library = ProgressionLibrary::from_json_str(SAMPLE).unwrap();

        let music = library.find_music(&["1", "5", "6m", "4"]);
        assert_eq!(music.len(), 1);
        assert_eq!(music[0].title, "Let It Be");

        assert!(library.find_music(&["1", "5", "6m"]).is_empty());
        assert!(library.find_music(&["1", "5/7", "6m", "4", "5"]).is_empty());
    }

    #[test]
    fn test_parse_bars() {
        assert_eq!(parse_bars("1 | 4 | 5"), vec![vec!["1"], vec!["4"], vec!["5"]]);
        assert_eq!(parse_bars("  1   4 ||  "), vec![vec!["1", "4"]]);
        assert!(parse_bars("").is_empty());
    }
}
