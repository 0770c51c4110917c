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
// Core audio mixing logic shared by the cpal output and the mock device.
use std::sync::Arc;

use parking_lot::Mutex;

use crate::audio::sample_source::MemorySampleSource;

/// Sums every active source into the output. Sources never interfere with each other;
/// each plays to its end and is then dropped.
#[derive(Clone)]
pub struct AudioMixer {
    /// Active audio sources currently playing
    active_sources: Arc<Mutex<Vec<ActiveSource>>>,
    /// Number of output channels
    num_channels: u16,
}

/// Represents an active audio source in the mixer
pub struct ActiveSource {
    /// Unique ID for this source
    pub id: u64,
    /// The samples being played
    pub source: MemorySampleSource,
}

impl AudioMixer {
    /// Creates a new audio mixer
    pub fn new(num_channels: u16) -> Self {
        Self {
            active_sources: Arc::new(Mutex::new(Vec::new())),
            num_channels,
        }
    }

    /// Adds a new audio source to the mixer
    pub fn add_source(&self, source: ActiveSource) {
        self.active_sources.lock().push(source);
    }

    /// Mixes the next block into the interleaved output buffer, overwriting it.
    /// Sources that run out during the block are removed.
    pub fn process_into_output(&self, output: &mut [f32], num_frames: usize) {
        let channels = self.num_channels as usize;
        let len = (num_frames * channels).min(output.len());
        let output = &mut output[..len];
        output.fill(0.0);

        let mut sources = self.active_sources.lock();
        sources.retain_mut(|active_source| {
            active_source.source.mix_into(output, channels, num_frames);
            !active_source.source.is_finished()
        });
    }

    /// Processes multiple frames of audio mixing
    pub fn process_frames(&self, num_frames: usize) -> Vec<f32> {
        let mut frames = vec![0.0; num_frames * self.num_channels as usize];
        self.process_into_output(&mut frames, num_frames);
        frames
    }

    /// Returns the number of sources still playing.
    pub fn active_count(&self) -> usize {
        self.active_sources.lock().len()
    }

    /// Drops every active source.
    pub fn clear(&self) {
        self.active_sources.lock().clear();
    }

    /// Gets the number of output channels
    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }
}
