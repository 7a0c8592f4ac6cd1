//! CLI interface for chordgen

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Chord progression generator with substitution and voice-led playback
#[derive(Parser)]
#[command(name = "chordgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: chordgen.yaml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by commands that play a progression
#[derive(Args, Debug, Clone, Default)]
pub struct PlaybackArgs {
    /// Bars as degrees, e.g. "1 5/7 | 6m | 4 5" (default: a random progression)
    pub bars: Option<String>,

    /// Key to play in
    #[arg(short, long)]
    pub key: Option<String>,

    /// Tempo, 60-200
    #[arg(short, long)]
    pub bpm: Option<u32>,

    /// Seed for the random progression choice
    #[arg(short, long)]
    pub seed: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pick a random progression from the library
    Generate {
        /// Key for note names
        #[arg(short, long)]
        key: Option<String>,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Also print note names in the key
        #[arg(short, long)]
        notes: bool,
    },

    /// Show the tones of a chord symbol, e.g. "Cm7"
    Tones {
        symbol: String,
    },

    /// Print voice-led voicings for a progression
    Voice {
        /// Bars as degrees, e.g. "2m7 | 57 | 1maj7"
        bars: String,

        /// Key to voice in
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Replace a degree chord with another of the same function
    Substitute {
        /// Degree chord to replace
        degree: String,

        /// Diatonic parent to draw from (default: the chord's own parent)
        #[arg(short, long)]
        parent: Option<String>,

        /// Random seed
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// List the chords offered for each degree when picking by hand
    Choices,

    /// Play a progression on the audio device or a MIDI port
    Play {
        #[command(flatten)]
        playback: PlaybackArgs,

        /// Send to MIDI instead of the built-in synth
        #[arg(short, long)]
        midi: bool,
    },

    /// Render a progression to a WAV file
    Record {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        playback: PlaybackArgs,
    },

    /// List available audio devices and MIDI ports
    Devices,

    /// Validate a configuration file
    Check,

    /// Generate an example configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_play() {
        let cli = Cli::parse_from(["chordgen", "play", "1 | 4 5", "--bpm", "120", "--midi"]);
        match cli.command {
            Commands::Play { playback, midi } => {
                assert_eq!(playback.bars.as_deref(), Some("1 | 4 5"));
                assert_eq!(playback.bpm, Some(120));
                assert!(midi);
            }
            _ => panic!("expected play"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["chordgen", "tones", "G7", "--verbose", "-c", "my.yaml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("my.yaml")));
    }
}
