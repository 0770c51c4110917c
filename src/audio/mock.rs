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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::info;

use super::mixer::{ActiveSource, AudioMixer};
use super::next_source_id;
use super::sample_source::{MemorySampleSource, SampleSource};

/// The sample rate mock devices mix at unless configured otherwise.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

const CHANNELS: u16 = 2;

/// A record of one playback started on a mock device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Played {
    pub id: u64,
    pub frames: usize,
    pub channels: u16,
}

/// A mock device. Nothing is sent to the speakers: sources go into a mixer that only
/// advances when `render` is called, and every started playback is recorded.
#[derive(Clone)]
pub struct Device {
    name: String,
    sample_rate: u32,
    mixer: AudioMixer,
    played: Arc<Mutex<Vec<Played>>>,
    failing: Arc<AtomicBool>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device::with_sample_rate(name, DEFAULT_SAMPLE_RATE)
    }

    /// Gets the given mock device running at the given sample rate.
    pub fn with_sample_rate(name: &str, sample_rate: u32) -> Device {
        Device {
            name: name.to_string(),
            sample_rate,
            mixer: AudioMixer::new(CHANNELS),
            played: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Every playback started so far, oldest first.
    pub fn played(&self) -> Vec<Played> {
        self.played.lock().clone()
    }

    /// Number of sources still in the mixer.
    pub fn active_sources(&self) -> usize {
        self.mixer.active_count()
    }

    /// Advances the mixer by the given number of frames and returns the mixed output.
    pub fn render(&self, num_frames: usize) -> Vec<f32> {
        self.mixer.process_frames(num_frames)
    }

    /// Makes subsequent calls to play fail, as a disconnected interface would.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }
}

impl super::Device for Device {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn play(&self, source: MemorySampleSource) -> Result<u64, Box<dyn Error>> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(format!("mock device {} is failing", self.name).into());
        }

        let id = next_source_id();
        info!(
            device = self.name,
            source_id = id,
            frames = source.total_frames(),
            "Playing sample (mock)."
        );

        self.played.lock().push(Played {
            id,
            frames: source.total_frames(),
            channels: source.channel_count(),
        });
        self.mixer.add_source(ActiveSource { id, source });
        Ok(id)
    }

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<Device>, Box<dyn Error>> {
        Ok(Arc::new(self.clone()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name,)
    }
}
