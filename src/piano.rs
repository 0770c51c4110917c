// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::audio::Device;
use crate::controller::KeyMapping;
use crate::notes::Note;
use crate::samples::{LoadBatch, SampleBank};
use crate::ui::{Keyboard, ACTIVE_CLASS};


/// The outcome of triggering a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// A new playback was started on the device.
    Started { source_id: u64 },
    /// Nothing was played: the note has no sample or the device refused it.
    Unavailable,
}

/// Plays the loaded samples and highlights the keys being played.
pub struct Piano {
    bank: SampleBank,
    device: Arc<dyn Device>,
    keyboard: Arc<Keyboard>,
    highlight_duration: Duration,
    runtime: Handle,
}

/// Everything needed to run the piano.
pub struct Session {
    pub piano: Arc<Piano>,
    pub mapping: Arc<KeyMapping>,
    /// The sample loads started for the session. Dropping this leaves them running.
    pub loads: LoadBatch,
}

impl Piano {
    /// Creates a piano. Must be called from within a tokio runtime, which is used to
    /// clear highlights.
    pub fn new(
        bank: SampleBank,
        device: Arc<dyn Device>,
        keyboard: Arc<Keyboard>,
        highlight_duration: Duration,
    ) -> Piano {
        Piano {
            bank,
            device,
            keyboard,
            highlight_duration,
            runtime: Handle::current(),
        }
    }

    pub fn bank(&self) -> &SampleBank {
        &self.bank
    }

    pub fn keyboard(&self) -> &Arc<Keyboard> {
        &self.keyboard
    }

    pub fn highlight_duration(&self) -> Duration {
        self.highlight_duration
    }

    /// Plays the sample for a note and highlights its key. Every call starts its own
    /// playback, so a note can overlap with itself. Does nothing but log a warning if
    /// the note has no sample.
    pub fn play_sound(&self, note: Note) -> Playback {
        let Some(sample) = self.bank.get(&note) else {
            warn!(note = %note, "Sound for {} is not available", note);
            return Playback::Unavailable;
        };

        let source_id = match self.device.play(sample.create_source()) {
            Ok(source_id) => source_id,
            Err(e) => {
                warn!(note = %note, err = %e, "Unable to play sound");
                return Playback::Unavailable;
            }
        };
        info!(note = %note, source_id, "Playing sound.");

        self.highlight(note);
        Playback::Started { source_id }
    }

    /// Plays a note given by name, as carried by a key's note attribute.
    pub fn play_note_name(&self, name: &str) -> Playback {
        match name.parse::<Note>() {
            Ok(note) => self.play_sound(note),
            Err(_) => {
                warn!(note = name, "Sound for {} is not available", name);
                Playback::Unavailable
            }
        }
    }

    /// Marks the note's key active and clears it once the highlight duration passes.
    /// Each trigger schedules its own removal.
    fn highlight(&self, note: Note) {
        let data_note = note.to_string();
        let Some(element) = self.keyboard.query_note(&data_note) else {
            debug!(note = data_note, "No key on screen for note");
            return;
        };
        element.add_class(ACTIVE_CLASS);

        let keyboard = self.keyboard.clone();
        let duration = self.highlight_duration;
        self.runtime.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(element) = keyboard.query_note(&data_note) {
                element.remove_class(ACTIVE_CLASS);
            }
        });
    }
}
