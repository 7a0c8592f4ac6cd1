//! Diatonic substitution
//!
//! Each diatonic parent degree lists alternatives grouped by how they relate
//! to it: functional equivalents, modal borrowings and tritone substitutes.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::theory::degree_prefix;

/// Alternatives for one diatonic parent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstitutionGroup {
    #[serde(default)]
    pub function: Vec<String>,
    #[serde(default)]
    pub modal: Vec<String>,
    #[serde(default)]
    pub tritone: Vec<String>,
}

/// Errors from substitution selection
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubstitutionError {
    #[error("no other substitutions available for {0}")]
    NoAlternative(String),
    #[error("no substitutions listed for parent {0}")]
    NoEntry(String),
}

#[derive(Debug, Deserialize)]
struct SubstitutionFile {
    substitutions: BTreeMap<String, SubstitutionGroup>,
}

const BUILTIN_SUBSTITUTIONS: &str = include_str!("../../data/substitutions.json");

/// Substitution groups keyed by diatonic parent degree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTable {
    groups: BTreeMap<String, SubstitutionGroup>,
}

impl SubstitutionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the group for a parent (builder pattern)
    pub fn with(mut self, parent: &str, group: SubstitutionGroup) -> Self {
        self.groups.insert(parent.to_string(), group);
        self
    }

    /// Parse `{"substitutions": {parent: {function, modal, tritone}}}`
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: SubstitutionFile =
            serde_json::from_str(json).context("invalid substitution data")?;
        Ok(Self { groups: file.substitutions })
    }

    /// Load a substitution table from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read substitutions: {:?}", path))?;
        let table = Self::from_json_str(&contents)?;
        info!(parents = table.groups.len(), "loaded substitutions from {:?}", path);
        Ok(table)
    }

    /// The substitution table shipped with the crate
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_SUBSTITUTIONS).unwrap_or_else(|e| {
            warn!("built-in substitution data unreadable: {:#}", e);
            Self::default()
        })
    }

    pub fn get(&self, parent: &str) -> Option<&SubstitutionGroup> {
        self.groups.get(parent)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SubstitutionGroup)> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// The pool a substitution is drawn from: the parent and all of its
/// alternatives, without duplicates and without the current chord.
/// A parent missing from the table has no pool.
pub fn substitution_candidates(
    current: &str,
    parent: &str,
    table: &SubstitutionTable,
) -> Vec<String> {
    let Some(group) = table.get(parent) else {
        return Vec::new();
    };

    let mut pool: Vec<String> = vec![parent.to_string()];
    let alternatives = group.function.iter().chain(&group.modal).chain(&group.tritone);
    for chord in alternatives {
        if !pool.contains(chord) {
            pool.push(chord.clone());
        }
    }

    pool.retain(|chord| chord != current);
    pool
}

/// Replace `current` with a random chord that serves the same parent.
///
/// ```
/// use chordgen::progression::{substitute, SubstitutionGroup, SubstitutionTable};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let table = SubstitutionTable::new().with("5", SubstitutionGroup {
///     function: vec!["7o".into()],
///     modal: vec![],
///     tritone: vec!["b2".into()],
/// });
/// let mut rng = StdRng::seed_from_u64(1);
/// let chord = substitute("5", "5", &table, &mut rng).unwrap();
/// assert!(chord == "7o" || chord == "b2");
/// ```
pub fn substitute<R: Rng + ?Sized>(
    current: &str,
    parent: &str,
    table: &SubstitutionTable,
    rng: &mut R,
) -> Result<String, SubstitutionError> {
    if table.get(parent).is_none() {
        return Err(SubstitutionError::NoEntry(parent.to_string()));
    }

    let pool = substitution_candidates(current, parent, table);
    let chosen = pool
        .choose(rng)
        .cloned()
        .ok_or_else(|| SubstitutionError::NoAlternative(current.to_string()))?;

    debug!(current, parent, chosen = chosen.as_str(), pool = pool.len(), "substituted");
    Ok(chosen)
}

/// One entry of the chord picker: a degree and the chords offered for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordChoices {
    pub degree: String,
    pub chords: Vec<String>,
}

/// Chromatic order of degrees in the chord picker
const DEGREE_ORDER: [&str; 12] = ["1", "b2", "2", "b3", "3", "4", "#4", "5", "b6", "6", "b7", "7"];

/// Chord picker groups: every degree that appears in the table (as a parent
/// or as a modal/tritone alternative) offering its major, minor and
/// diminished chords. `4` offers no diminished chord.
pub fn selector_groups(table: &SubstitutionTable) -> Vec<ChordChoices> {
    if table.is_empty() {
        return default_selector_groups();
    }

    let mut degrees: Vec<&str> = Vec::new();
    for (parent, group) in table.iter() {
        let chords = std::iter::once(parent)
            .chain(group.modal.iter().map(String::as_str))
            .chain(group.tritone.iter().map(String::as_str));
        for degree in chords.filter_map(degree_prefix) {
            if !degrees.contains(&degree) {
                degrees.push(degree);
            }
        }
    }

    DEGREE_ORDER
        .iter()
        .filter(|d| degrees.contains(d))
        .map(|&degree| ChordChoices {
            degree: degree.to_string(),
            chords: ["", "m", "o"]
                .iter()
                .filter(|&&quality| !(degree == "4" && quality == "o"))
                .map(|quality| format!("{}{}", degree, quality))
                .collect(),
        })
        .collect()
}

fn default_selector_groups() -> Vec<ChordChoices> {
    DEGREE_ORDER
        .iter()
        .map(|&degree| {
            let qualities: &[&str] = match degree {
                "4" => &["", "m"],
                "#4" => &["", "o"],
                _ => &["", "m", "o"],
            };
            ChordChoices {
                degree: degree.to_string(),
                chords: qualities.iter().map(|q| format!("{}{}", degree, q)).collect(),
            }
        })
        .collect()
}
