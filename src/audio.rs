use std::f32::consts::PI;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use clap::ValueEnum;
use rodio::buffer::SamplesBuffer;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};

const SAMPLE_RATE: u32 = 44_100;

/// Built-in synthesized cue waveforms, selectable with `--cue`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
pub enum Cue {
    Beep,
    Chime,
    Tick,
}

impl Cue {
    /// Parse the lowercase name persisted in the config file.
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }

    fn samples(self) -> Vec<f32> {
        match self {
            Cue::Beep => tone(880.0, 0.25),
            Cue::Chime => {
                let mut s = tone(659.25, 0.22);
                s.extend(tone(987.77, 0.35));
                s
            }
            Cue::Tick => tone(1760.0, 0.06),
        }
    }
}

/// A single decaying sine burst.
fn tone(freq: f32, secs: f32) -> Vec<f32> {
    let len = (SAMPLE_RATE as f32 * secs) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let envelope = 1.0 - t / secs;
            (2.0 * PI * freq * t).sin() * 0.6 * envelope
        })
        .collect()
}

enum CueSource {
    Synth(Vec<f32>),
    /// Raw bytes of a user-supplied sound file, decoded per play.
    File(Vec<u8>),
}

/// Owner of the audio output, created once at startup. Playback is
/// fire-and-forget through a detached sink; every failure mode (no output
/// device, unreadable file, decode error) degrades to silence rather than
/// surfacing to the countdown.
pub struct CuePlayer {
    // The stream must outlive every sink spawned from its handle.
    output: Option<(OutputStream, OutputStreamHandle)>,
    source: CueSource,
}

impl CuePlayer {
    pub fn new(cue: Cue, sound_file: Option<&Path>) -> Self {
        let output = OutputStream::try_default().ok();
        let source = sound_file
            .and_then(load_file)
            .unwrap_or_else(|| CueSource::Synth(cue.samples()));
        Self { output, source }
    }

    /// A player that never makes a sound, for `--mute` and for tests.
    pub fn disabled() -> Self {
        Self {
            output: None,
            source: CueSource::Synth(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.output.is_some()
    }

    /// Whether a user-supplied sound file was loaded (as opposed to falling
    /// back to the synthesized cue).
    pub fn has_custom_sound(&self) -> bool {
        matches!(self.source, CueSource::File(_))
    }

    /// Play the cue. Never blocks, never errors; a player without an output
    /// device is a no-op.
    pub fn play(&self) {
        let Some((_, handle)) = &self.output else {
            return;
        };
        let Ok(sink) = Sink::try_new(handle) else {
            return;
        };
        match &self.source {
            CueSource::Synth(samples) => {
                if samples.is_empty() {
                    return;
                }
                sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples.clone()));
            }
            CueSource::File(bytes) => {
                let Ok(decoded) = Decoder::new(Cursor::new(bytes.clone())) else {
                    return;
                };
                sink.append(decoded);
            }
        }
        sink.detach();
    }
}

fn load_file(path: &Path) -> Option<CueSource> {
    let bytes = fs::read(path).ok()?;
    // Probe the decode once up front so a corrupt file falls back to the
    // synthesized cue instead of failing silently on every boundary.
    Decoder::new(Cursor::new(bytes.clone())).ok()?;
    Some(CueSource::File(bytes))
}
