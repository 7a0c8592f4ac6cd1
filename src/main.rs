//! chordgen - Chord progression generator with voice-led playback

use anyhow::{bail, Context, Result};
use chordgen::config::{self, ChordGenConfig};
use chordgen::engine::{
    default_device_name, list_midi_ports, list_output_devices, render_to_wav, AudioSink, Engine,
    MidiSink, Player, ScheduledChord, Transport,
};
use chordgen::progression::{
    parse_bars, selector_groups, substitute, substitution_candidates, ProgressionLibrary, Session,
    SubstitutionTable,
};
use chordgen::theory::{
    chord_tone_names, chord_tones, degree_to_note_in, diatonic_parent, split_slash, Key,
    PitchClass,
};
use chordgen::voicing::VoiceLeader;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, Level};

mod cli;

use cli::{Cli, Commands, PlaybackArgs};

const DEFAULT_CONFIG: &str = "chordgen.yaml";

/// Silence rendered after the last chord
const RECORD_TAIL_SECONDS: f64 = 0.5;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate { key, seed, notes } => {
            let cfg = load_or_default(cli.config.as_deref())?;
            let library = load_library(&cfg)?;
            let mut session = Session::new(resolve_key(&cfg, key.as_deref())?, cfg.master.bpm);
            session.refresh(&library, &mut rng(seed))?;

            print_session(&mut session, notes);
        }

        Commands::Tones { symbol } => {
            println!("{}: {}", symbol, chord_tone_names(&symbol).join(" "));
        }

        Commands::Voice { bars, key } => {
            let cfg = load_or_default(cli.config.as_deref())?;
            let library = load_library(&cfg)?;
            let mut session = Session::new(resolve_key(&cfg, key.as_deref())?, cfg.master.bpm);
            session.load_bars(parse_bars(&bars), &library);

            let mut leader = VoiceLeader::new(cfg.voicing_range());
            for chord in session.flattened_chords() {
                let symbol = degree_to_note_in(session.key(), &chord);
                let (upper, _) = split_slash(&symbol);
                let voicing = leader.next(&chord_tones(upper));
                println!("{:<8} {:<8} {}", chord, symbol, format_voicing(&voicing));
            }
        }

        Commands::Substitute { degree, parent, seed } => {
            let cfg = load_or_default(cli.config.as_deref())?;
            let table = load_substitutions(&cfg)?;
            let parent = parent.unwrap_or_else(|| diatonic_parent(&degree));

            let candidates = substitution_candidates(&degree, &parent, &table);
            println!("Parent: {}", parent);
            println!("Candidates: {}", candidates.join(" "));
            println!("Chosen: {}", substitute(&degree, &parent, &table, &mut rng(seed))?);
        }

        Commands::Choices => {
            let cfg = load_or_default(cli.config.as_deref())?;
            let key = cfg.key()?;
            for group in selector_groups(&load_substitutions(&cfg)?) {
                let chords: Vec<String> = group
                    .chords
                    .iter()
                    .map(|c| format!("{} ({})", c, degree_to_note_in(key, c)))
                    .collect();
                println!("{:<3} {}", group.degree, chords.join("  "));
            }
        }

        Commands::Play { playback, midi } => {
            let cfg = load_or_default(cli.config.as_deref())?;
            let session = build_session(&cfg, &playback)?;
            let mut transport = Transport::new(cfg.voicing_range(), cfg.transport_settings());
            let stop = stop_flag()?;

            if midi {
                let mut sink = MidiSink::connect(
                    cfg.midi.port.as_deref(),
                    cfg.midi.channel,
                    cfg.midi.velocity,
                )?;
                let chords = transport.schedule(&session, &mut sink);
                print_schedule(&chords);

                let end = chords.last().map(|c| c.start + c.duration).unwrap_or(0.0);
                wait_until(&stop, || sink.now() >= end);
            } else {
                let mut player = Player::open(cfg.audio.device.as_deref())?;
                let engine = Arc::new(Mutex::new(Engine::new(
                    player.sample_rate() as f64,
                    cfg.master.volume,
                    cfg.envelope_shape(),
                )));

                let chords = {
                    let mut engine = engine
                        .lock()
                        .map_err(|_| anyhow::anyhow!("audio engine lock poisoned"))?;
                    transport.schedule(&session, &mut *engine)
                };
                print_schedule(&chords);

                player.start(engine.clone())?;
                info!("playback started");
                wait_until(&stop, || engine.lock().map(|e| e.is_idle()).unwrap_or(true));
                player.stop();
            }
        }

        Commands::Record { output, playback } => {
            let cfg = load_or_default(cli.config.as_deref())?;
            let session = build_session(&cfg, &playback)?;
            let mut transport = Transport::new(cfg.voicing_range(), cfg.transport_settings());
            let mut engine = Engine::new(
                cfg.audio.sample_rate as f64,
                cfg.master.volume,
                cfg.envelope_shape(),
            );

            let chords = transport.schedule(&session, &mut engine);
            print_schedule(&chords);

            let summary = render_to_wav(
                &mut engine,
                &output,
                RECORD_TAIL_SECONDS,
                cfg.audio.buffer_size,
            )?;
            println!(
                "Recorded {:.2}s to {:?} (peak {:.1} dBFS)",
                summary.seconds,
                output,
                20.0 * summary.peak.max(f32::EPSILON).log10()
            );
        }

        Commands::Devices => {
            println!("Audio output devices:");
            let default = default_device_name();
            for (name, config) in list_output_devices() {
                let marker = if Some(&name) == default.as_ref() { " [default]" } else { "" };
                println!(
                    "  - {} ({} Hz, {} ch){}",
                    name, config.sample_rate.0, config.channels, marker
                );
            }

            println!("\nMIDI output ports:");
            match list_midi_ports() {
                Ok(ports) if ports.is_empty() => println!("  (none)"),
                Ok(ports) => ports.iter().for_each(|p| println!("  - {}", p)),
                Err(e) => println!("  Error listing ports: {}", e),
            }
        }

        Commands::Check => {
            let path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
            println!("Checking configuration at {:?}...", path);

            match config::load_config(&path).and_then(|cfg| {
                load_library(&cfg)?;
                load_substitutions(&cfg)?;
                Ok(cfg)
            }) {
                Ok(cfg) => {
                    println!("Configuration is valid!");
                    println!("  Key: {}", cfg.master.key);
                    println!("  BPM: {}", cfg.master.bpm);
                    println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
                    println!(
                        "  Voicing: octaves {}-{}, bass octave {}, max span {}",
                        cfg.voicing.min_octave,
                        cfg.voicing.max_octave,
                        cfg.voicing.bass_octave,
                        cfg.voicing.max_span
                    );
                    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
                }
                Err(e) => {
                    println!("Configuration is invalid: {:#}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Init => {
            let example_config = include_str!("../chordgen.example.yaml");

            let path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
            if path.exists() {
                println!("{:?} already exists. Not overwriting.", path);
            } else {
                std::fs::write(&path, example_config)
                    .with_context(|| format!("failed to write {:?}", path))?;
                println!("Created {:?} with example configuration.", path);
            }
        }
    }

    Ok(())
}

/// Load the given config, or chordgen.yaml if it exists, or the defaults
fn load_or_default(path: Option<&Path>) -> Result<ChordGenConfig> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG).exists() => config::load_config(Path::new(DEFAULT_CONFIG)),
        None => Ok(ChordGenConfig::default()),
    }
}

fn load_library(cfg: &ChordGenConfig) -> Result<ProgressionLibrary> {
    match &cfg.data.progressions {
        Some(path) => ProgressionLibrary::load(path),
        None => Ok(ProgressionLibrary::builtin()),
    }
}

fn load_substitutions(cfg: &ChordGenConfig) -> Result<SubstitutionTable> {
    match &cfg.data.substitutions {
        Some(path) => SubstitutionTable::load(path),
        None => Ok(SubstitutionTable::builtin()),
    }
}

fn resolve_key(cfg: &ChordGenConfig, name: Option<&str>) -> Result<Key> {
    match name {
        Some(name) => match Key::from_name(name) {
            Some(key) => Ok(key),
            None => bail!("Unknown key '{}'", name),
        },
        None => cfg.key(),
    }
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn build_session(cfg: &ChordGenConfig, args: &PlaybackArgs) -> Result<Session> {
    let library = load_library(cfg)?;
    let mut session = Session::new(resolve_key(cfg, args.key.as_deref())?, cfg.master.bpm);
    if let Some(bpm) = args.bpm {
        session.set_bpm(bpm);
    }

    match &args.bars {
        Some(text) => {
            let bars = parse_bars(text);
            if bars.is_empty() {
                bail!("no chords given");
            }
            session.load_bars(bars, &library);
        }
        None => session.refresh(&library, &mut rng(args.seed))?,
    }
    Ok(session)
}

fn print_session(session: &mut Session, notes: bool) {
    println!("{}", bar_line(session));

    if notes {
        session.toggle_display();
        println!("{}  (key of {})", bar_line(session), session.key());
    }

    for music in session.music() {
        match &music.part {
            Some(part) => println!("  {} - {} ({})", music.title, music.artist, part),
            None => println!("  {} - {}", music.title, music.artist),
        }
    }
}

/// Bars as displayed by the session, substituted chords marked with `*`
fn bar_line(session: &Session) -> String {
    let bars: Vec<String> = (0..session.bars().len())
        .map(|bar| {
            session
                .display_bar(bar)
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(i, chord)| {
                    if session.is_substituted(bar, i) {
                        format!("{}*", chord)
                    } else {
                        chord
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect();
    format!("| {} |", bars.join(" | "))
}

fn print_schedule(chords: &[ScheduledChord]) {
    for chord in chords {
        println!(
            "{:>6.2}s  {:<8} {:<8} bass {:>7.2} Hz  {}",
            chord.start,
            chord.degree,
            chord.symbol,
            chord.bass,
            format_voicing(&chord.voicing)
        );
    }
}

fn format_voicing(voicing: &[f64]) -> String {
    voicing
        .iter()
        .map(|&f| {
            let midi = (69.0 + 12.0 * (f / 440.0).log2()).round() as i32;
            format!("{}{}", PitchClass::new(midi).name(), midi / 12 - 1)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Ctrl-C sets the returned flag
fn stop_flag() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = stop.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;
    Ok(stop)
}

fn wait_until(stop: &AtomicBool, mut done: impl FnMut() -> bool) {
    while !stop.load(Ordering::SeqCst) && !done() {
        std::thread::sleep(Duration::from_millis(50));
    }
    if stop.load(Ordering::SeqCst) {
        info!("playback interrupted");
    }
}
