//! Progressions: the library, substitution and the editing session

mod library;
mod session;
mod substitution;

pub use library::{parse_bars, Bar, MusicReference, Phrase, Progression, ProgressionLibrary};
pub use session::{Session, SessionError, MAX_BPM, MIN_BPM};
pub use substitution::{
    selector_groups, substitute, substitution_candidates, ChordChoices, SubstitutionError,
    SubstitutionGroup, SubstitutionTable,
};
