//! MIDI output for chordgen.
//!
//! Sends scheduled notes to a MIDI port. Timing is handled by a worker
//! thread that holds the queue of future note-on/note-off messages.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use midir::MidiOutput;
use tracing::{debug, info, warn};

use super::{AudioSink, NoteEvent};

/// Controller number of "All Notes Off"
const ALL_NOTES_OFF: u8 = 123;

/// MIDI message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note on: channel (0-15), note (0-127), velocity (0-127)
    NoteOn(u8, u8, u8),
    /// Note off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff(u8, u8, u8),
    /// Control change: channel (0-15), controller (0-127), value (0-127)
    ControlChange(u8, u8, u8),
}

impl MidiMessage {
    /// Convert to raw MIDI bytes.
    pub fn to_bytes(&self) -> [u8; 3] {
        match *self {
            MidiMessage::NoteOn(ch, note, vel) => [0x90 | (ch & 0x0F), note & 0x7F, vel & 0x7F],
            MidiMessage::NoteOff(ch, note, vel) => [0x80 | (ch & 0x0F), note & 0x7F, vel & 0x7F],
            MidiMessage::ControlChange(ch, ctrl, val) => {
                [0xB0 | (ch & 0x0F), ctrl & 0x7F, val & 0x7F]
            }
        }
    }
}

/// Nearest MIDI note number for a frequency (A4 = 440 Hz = 69)
pub fn frequency_to_midi(frequency: f64) -> Option<u8> {
    if frequency.is_nan() || frequency <= 0.0 {
        return None;
    }
    let note = (69.0 + 12.0 * (frequency / 440.0).log2()).round();
    (0.0..=127.0).contains(&note).then_some(note as u8)
}

enum Command {
    Send { at: Instant, message: MidiMessage },
    Cancel { channel: u8 },
    Stop,
}

/// Worker loop: send queued messages when they fall due
fn run_worker<F: FnMut(&[u8])>(receiver: Receiver<Command>, mut send: F) {
    let mut queue: Vec<(Instant, MidiMessage)> = Vec::new();

    loop {
        let now = Instant::now();
        let due = queue.partition_point(|(at, _)| *at <= now);
        for (_, message) in queue.drain(..due) {
            send(&message.to_bytes());
        }

        let command = match queue.first() {
            Some((at, _)) => receiver.recv_timeout(at.saturating_duration_since(now)),
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match command {
            Ok(Command::Send { at, message }) => {
                let index = queue.partition_point(|(t, _)| *t <= at);
                queue.insert(index, (at, message));
            }
            Ok(Command::Cancel { channel }) => {
                queue.clear();
                send(&MidiMessage::ControlChange(channel, ALL_NOTES_OFF, 0).to_bytes());
            }
            Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

/// Sink that plays notes on an external MIDI instrument
pub struct MidiSink {
    sender: Sender<Command>,
    worker: Option<JoinHandle<()>>,
    origin: Instant,
    channel: u8,
    velocity: u8,
}

impl MidiSink {
    /// Connect to a MIDI port by (partial) name, or the first port
    pub fn connect(port_name: Option<&str>, channel: u8, velocity: u8) -> Result<Self> {
        let midi_out = MidiOutput::new("chordgen")?;
        let ports = midi_out.ports();

        if ports.is_empty() {
            return Err(anyhow!("No MIDI output ports available"));
        }

        let port = if let Some(name) = port_name {
            ports
                .iter()
                .find(|p| {
                    midi_out
                        .port_name(p)
                        .map(|n| n.contains(name))
                        .unwrap_or(false)
                })
                .ok_or_else(|| anyhow!("MIDI port '{}' not found", name))?
                .clone()
        } else {
            ports[0].clone()
        };

        let port_name_actual = midi_out.port_name(&port)?;
        let mut conn = midi_out
            .connect(&port, "chordgen-output")
            .map_err(|e| anyhow!("failed to connect to MIDI port: {}", e))?;

        info!(port = port_name_actual.as_str(), channel, "MIDI output connected");

        Ok(Self::spawn(channel, velocity, move |bytes| {
            if let Err(e) = conn.send(bytes) {
                warn!("MIDI send failed: {}", e);
            }
        }))
    }

    fn spawn<F>(channel: u8, velocity: u8, send: F) -> Self
    where
        F: FnMut(&[u8]) + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::spawn(move || run_worker(receiver, send));

        Self {
            sender,
            worker: Some(worker),
            origin: Instant::now(),
            channel: channel.min(15),
            velocity: velocity.min(127),
        }
    }

    fn at(&self, seconds: f64) -> Instant {
        self.origin + Duration::from_secs_f64(seconds.max(0.0))
    }

    fn send(&self, command: Command) {
        // The worker only exits on Stop, which is sent from Drop
        let _ = self.sender.send(command);
    }
}

impl AudioSink for MidiSink {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn schedule(&mut self, event: NoteEvent) {
        let Some(note) = frequency_to_midi(event.frequency) else {
            debug!(frequency = event.frequency, "no MIDI note for frequency");
            return;
        };
        let velocity = ((self.velocity as f64) * event.volume.clamp(0.0, 1.0) / 0.25)
            .round()
            .clamp(1.0, 127.0) as u8;

        self.send(Command::Send {
            at: self.at(event.start),
            message: MidiMessage::NoteOn(self.channel, note, velocity),
        });
        self.send(Command::Send {
            at: self.at(event.start + event.duration),
            message: MidiMessage::NoteOff(self.channel, note, 0),
        });
    }

    fn cancel_pending(&mut self) {
        self.send(Command::Cancel { channel: self.channel });
    }
}

impl Drop for MidiSink {
    fn drop(&mut self) {
        self.send(Command::Cancel { channel: self.channel });
        self.send(Command::Stop);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// List available MIDI output ports.
pub fn list_midi_ports() -> Result<Vec<String>> {
    let midi_out = MidiOutput::new("chordgen list")?;
    let ports = midi_out.ports();

    let names: Vec<String> = ports
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect();

    Ok(names)
}
