//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::TransportSettings;
use crate::synth::EnvelopeShape;
use crate::theory::Key;
use crate::voicing::VoicingRange;

/// Main configuration for chordgen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChordGenConfig {
    /// Audio output settings
    #[serde(default)]
    pub audio: AudioConfig,

    /// Master settings (tempo, key, volume)
    #[serde(default)]
    pub master: MasterConfig,

    /// Voice-leading range
    #[serde(default)]
    pub voicing: VoicingConfig,

    /// Note levels and envelope
    #[serde(default)]
    pub synth: SynthConfig,

    /// Data file locations
    #[serde(default)]
    pub data: DataConfig,

    /// MIDI output
    #[serde(default)]
    pub midi: MidiConfig,
}

impl ChordGenConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        // Validate audio settings
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        // Validate master settings
        if !(0.0..=1.0).contains(&self.master.volume) {
            bail!("Master volume must be between 0.0 and 1.0");
        }
        if self.master.bpm < 60 || self.master.bpm > 200 {
            bail!("BPM must be between 60 and 200");
        }
        self.key()?;

        // Validate voicing range
        let v = &self.voicing;
        for (name, octave) in [
            ("min_octave", v.min_octave),
            ("max_octave", v.max_octave),
            ("bass_octave", v.bass_octave),
        ] {
            if !(0..=8).contains(&octave) {
                bail!("Voicing {} must be between 0 and 8", name);
            }
        }
        if v.min_octave > v.max_octave {
            bail!("Voicing min_octave must not exceed max_octave");
        }
        if !(v.max_span >= 1.0) {
            bail!("Voicing max_span must be at least 1.0");
        }

        // Validate synth settings
        let s = &self.synth;
        if !(0.0..=1.0).contains(&s.bass_volume) || !(0.0..=1.0).contains(&s.chord_volume) {
            bail!("Synth volumes must be between 0.0 and 1.0");
        }
        if !(s.attack > 0.0) {
            bail!("Synth attack must be positive");
        }
        if !(s.release_start > 0.0 && s.release_start < s.release_end && s.release_end <= 1.0) {
            bail!("Synth release points must satisfy 0 < release_start < release_end <= 1");
        }
        if !(s.min_gain > 0.0 && s.min_gain < 1.0) {
            bail!("Synth min_gain must be between 0.0 and 1.0 (exclusive)");
        }

        // Validate MIDI settings
        if self.midi.channel > 15 {
            bail!("MIDI channel must be between 0 and 15");
        }
        if self.midi.velocity > 127 {
            bail!("MIDI velocity must be between 0 and 127");
        }

        Ok(())
    }

    /// The configured key
    pub fn key(&self) -> Result<Key> {
        match Key::from_name(&self.master.key) {
            Some(key) => Ok(key),
            None => bail!("Unknown key '{}'", self.master.key),
        }
    }

    pub fn voicing_range(&self) -> VoicingRange {
        VoicingRange {
            min_octave: self.voicing.min_octave,
            max_octave: self.voicing.max_octave,
            max_span: self.voicing.max_span,
        }
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            bass_octave: self.voicing.bass_octave,
            bass_volume: self.synth.bass_volume,
            chord_volume: self.synth.chord_volume,
        }
    }

    pub fn envelope_shape(&self) -> EnvelopeShape {
        EnvelopeShape {
            attack: self.synth.attack,
            release_start: self.synth.release_start,
            release_end: self.synth.release_end,
            min_gain: self.synth.min_gain,
        }
    }
}

/// Audio output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz for offline rendering (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Buffer size in samples (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Output device name (None = default device)
    #[serde(default)]
    pub device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            device: None,
        }
    }
}

fn default_sample_rate() -> u32 { 44100 }
fn default_buffer_size() -> usize { 512 }

/// Master settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Beats per minute (default: 200)
    #[serde(default = "default_bpm")]
    pub bpm: u32,

    /// Musical key (default: C)
    #[serde(default = "default_key")]
    pub key: String,

    /// Master volume 0.0-1.0 (default: 0.8)
    #[serde(default = "default_volume")]
    pub volume: f64,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            bpm: default_bpm(),
            key: default_key(),
            volume: default_volume(),
        }
    }
}

fn default_bpm() -> u32 { 200 }
fn default_key() -> String { "C".to_string() }
fn default_volume() -> f64 { 0.8 }

/// Octave window for voicings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoicingConfig {
    #[serde(default = "default_min_octave")]
    pub min_octave: i32,

    #[serde(default = "default_max_octave")]
    pub max_octave: i32,

    /// Octave of the bass note
    #[serde(default = "default_bass_octave")]
    pub bass_octave: i32,

    /// Largest frequency ratio between top and bottom voice
    #[serde(default = "default_max_span")]
    pub max_span: f64,
}

impl Default for VoicingConfig {
    fn default() -> Self {
        Self {
            min_octave: default_min_octave(),
            max_octave: default_max_octave(),
            bass_octave: default_bass_octave(),
            max_span: default_max_span(),
        }
    }
}

fn default_min_octave() -> i32 { 4 }
fn default_max_octave() -> i32 { 5 }
fn default_bass_octave() -> i32 { 3 }
fn default_max_span() -> f64 { 4.0 }

/// Note levels and envelope timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthConfig {
    #[serde(default = "default_bass_volume")]
    pub bass_volume: f64,

    #[serde(default = "default_chord_volume")]
    pub chord_volume: f64,

    /// Attack time in seconds
    #[serde(default = "default_attack")]
    pub attack: f64,

    /// Fraction of a note's duration where the fade starts
    #[serde(default = "default_release_start")]
    pub release_start: f64,

    /// Fraction of a note's duration where the fade ends
    #[serde(default = "default_release_end")]
    pub release_end: f64,

    /// Gain at the end of the fade
    #[serde(default = "default_min_gain")]
    pub min_gain: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            bass_volume: default_bass_volume(),
            chord_volume: default_chord_volume(),
            attack: default_attack(),
            release_start: default_release_start(),
            release_end: default_release_end(),
            min_gain: default_min_gain(),
        }
    }
}

fn default_bass_volume() -> f64 { 0.28 }
fn default_chord_volume() -> f64 { 0.25 }
fn default_attack() -> f64 { 0.01 }
fn default_release_start() -> f64 { 0.85 }
fn default_release_end() -> f64 { 0.98 }
fn default_min_gain() -> f64 { 0.001 }

/// Data file locations (None = built-in data)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default)]
    pub progressions: Option<PathBuf>,

    #[serde(default)]
    pub substitutions: Option<PathBuf>,
}

/// MIDI output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MidiConfig {
    /// Port name (None = first available port)
    #[serde(default)]
    pub port: Option<String>,

    /// MIDI channel (0-15)
    #[serde(default)]
    pub channel: u8,

    /// Velocity for chord tones (0-127)
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            port: None,
            channel: 0,
            velocity: default_velocity(),
        }
    }
}

fn default_velocity() -> u8 { 96 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ChordGenConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.master.bpm, 200);
        assert_eq!(config.voicing_range(), VoicingRange::default());
        assert_eq!(config.transport_settings(), TransportSettings::default());
        assert_eq!(config.envelope_shape(), EnvelopeShape::default());
    }

    #[test]
    fn test_default_audio_config() {
        let yaml = "sample_rate: 48000";
        let config: AudioConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.buffer_size, 512); // default
    }

    #[test]
    fn test_partial_sections() {
        let yaml = r#"
master:
  key: Eb
voicing:
  max_octave: 6
midi:
  port: IAC
"#;
        let config: ChordGenConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.master.bpm, 200);
        assert_eq!(config.key().unwrap().name(), "Eb");
        assert_eq!(config.voicing.min_octave, 4);
        assert_eq!(config.voicing.max_octave, 6);
        assert_eq!(config.midi.port.as_deref(), Some("IAC"));
        assert_eq!(config.midi.velocity, 96);
        assert!(config.data.progressions.is_none());
    }

    fn assert_invalid(mutate: impl FnOnce(&mut ChordGenConfig)) {
        let mut config = ChordGenConfig::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "{:?}", config);
    }

    #[test]
    fn test_invalid_values() {
        assert_invalid(|c| c.audio.sample_rate = 4000);
        assert_invalid(|c| c.audio.buffer_size = 16);
        assert_invalid(|c| c.master.volume = 1.5);
        assert_invalid(|c| c.master.bpm = 40);
        assert_invalid(|c| c.master.bpm = 240);
        assert_invalid(|c| c.master.key = "H".to_string());
        assert_invalid(|c| c.voicing.min_octave = 6);
        assert_invalid(|c| c.voicing.bass_octave = 9);
        assert_invalid(|c| c.voicing.max_span = 0.5);
        assert_invalid(|c| c.voicing.max_span = f64::NAN);
        assert_invalid(|c| c.synth.chord_volume = -0.1);
        assert_invalid(|c| c.synth.attack = 0.0);
        assert_invalid(|c| c.synth.attack = f64::NAN);
        assert_invalid(|c| c.synth.release_start = 0.99);
        assert_invalid(|c| c.synth.release_end = 1.2);
        assert_invalid(|c| c.synth.min_gain = 0.0);
        assert_invalid(|c| c.midi.channel = 16);
        assert_invalid(|c| c.midi.velocity = 128);
    }

    #[test]
    fn test_unknown_key_message() {
        let mut config = ChordGenConfig::default();
        config.master.key = "C#".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "Unknown key 'C#'");
    }
}
