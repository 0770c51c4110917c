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
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{LoadError, SampleBank};
use crate::audio::sample_source::{AudioSampleSource, MemorySampleSource, SampleSource};
use crate::notes::Note;

/// A loaded sample that can be played back.
/// The sample data is stored in an Arc so every playback shares it.
#[derive(Clone)]
pub struct LoadedSample {
    /// The sample data as f32 samples (interleaved if multi-channel).
    data: Arc<Vec<f32>>,
    /// Number of channels in the sample.
    channel_count: u16,
    /// Sample rate of the audio data.
    sample_rate: u32,
}

impl LoadedSample {
    pub fn new(data: Vec<f32>, channel_count: u16, sample_rate: u32) -> LoadedSample {
        LoadedSample {
            data: Arc::new(data),
            channel_count,
            sample_rate,
        }
    }

    /// Creates a new source that plays this sample from the start.
    pub fn create_source(&self) -> MemorySampleSource {
        MemorySampleSource::from_shared(self.data.clone(), self.channel_count, self.sample_rate)
    }

    /// Returns the number of channels.
    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of frames.
    pub fn frames(&self) -> usize {
        self.data.len() / self.channel_count.max(1) as usize
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate.max(1) as f64)
    }

    /// Returns the memory size in bytes.
    pub fn memory_size(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }
}

/// Loads note samples into a bank. Every load is independent: a failure only leaves
/// its own note without a sound.
#[derive(Clone)]
pub struct SampleLoader {
    sounds_dir: PathBuf,
    extension: String,
    /// Target sample rate for transcoding (matches audio output).
    target_sample_rate: u32,
    bank: SampleBank,
}

/// The outcome of a finished batch of loads.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Notes that now have a sample, lowest first.
    pub loaded: Vec<Note>,
    /// Notes without a sample and the reason, lowest first.
    pub failed: Vec<(Note, LoadError)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Loads running in the background. Dropping the batch leaves them running.
pub struct LoadBatch {
    handles: Vec<(Note, JoinHandle<Result<(), LoadError>>)>,
}

impl LoadBatch {
    /// Number of loads in the batch.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Waits for every load to finish.
    pub async fn wait(self) -> LoadReport {
        let mut report = LoadReport::default();
        for (note, handle) in self.handles {
            match handle.await {
                Ok(Ok(())) => report.loaded.push(note),
                Ok(Err(e)) => report.failed.push((note, e)),
                Err(e) => report.failed.push((note, LoadError::Task(e))),
            }
        }
        report.loaded.sort();
        report.failed.sort_by_key(|(note, _)| *note);
        report
    }
}

/// Where the sample for a note lives: `{sounds_dir}/{note}.{extension}`.
pub fn sample_location(sounds_dir: &Path, note: &Note, extension: &str) -> PathBuf {
    sounds_dir.join(format!("{}.{}", note, extension))
}

impl SampleLoader {
    /// Creates a new sample loader that stores into the given bank.
    pub fn new(
        sounds_dir: PathBuf,
        extension: &str,
        target_sample_rate: u32,
        bank: SampleBank,
    ) -> SampleLoader {
        SampleLoader {
            sounds_dir,
            extension: extension.to_string(),
            target_sample_rate,
            bank,
        }
    }

    pub fn location_for(&self, note: &Note) -> PathBuf {
        sample_location(&self.sounds_dir, note, &self.extension)
    }

    /// Fetches and decodes the sample at the location and stores it under the note.
    /// Failures are logged and returned, and leave the bank untouched.
    pub async fn load_sound(&self, location: PathBuf, note: Note) -> Result<(), LoadError> {
        match self.fetch_and_decode(&location).await {
            Ok(sample) => {
                info!(
                    note = %note,
                    location = ?location,
                    channels = sample.channel_count(),
                    sample_rate = sample.sample_rate(),
                    duration_ms = sample.duration().as_millis(),
                    memory_kb = sample.memory_size() / 1024,
                    "Sound loaded"
                );
                self.bank.insert(note, sample);
                Ok(())
            }
            Err(e) => {
                warn!(note = %note, location = ?location, error = %e, "Unable to load sound");
                Err(e)
            }
        }
    }

    /// Starts one independent load per note and returns without waiting.
    pub fn spawn_all(&self, notes: impl IntoIterator<Item = Note>) -> LoadBatch {
        let handles = notes
            .into_iter()
            .map(|note| {
                let loader = self.clone();
                let location = self.location_for(&note);
                let handle = tokio::spawn(async move { loader.load_sound(location, note).await });
                (note, handle)
            })
            .collect();
        LoadBatch { handles }
    }

    async fn fetch_and_decode(&self, location: &Path) -> Result<LoadedSample, LoadError> {
        let bytes = tokio::fs::read(location)
            .await
            .map_err(|source| LoadError::Fetch {
                location: location.to_path_buf(),
                source,
            })?;

        let location = location.to_path_buf();
        let target_sample_rate = self.target_sample_rate;
        tokio::task::spawn_blocking(move || decode(bytes, &location, target_sample_rate)).await?
    }
}

/// Decodes a whole file into memory at the target sample rate.
fn decode(
    bytes: Vec<u8>,
    location: &Path,
    target_sample_rate: u32,
) -> Result<LoadedSample, LoadError> {
    let decode_error = |source| LoadError::Decode {
        location: location.to_path_buf(),
        source,
    };

    let extension = location.extension().and_then(|ext| ext.to_str());
    let mut source = AudioSampleSource::from_bytes(bytes, extension).map_err(decode_error)?;
    let source_sample_rate = source.sample_rate();
    let channel_count = source.channel_count();
    let samples = source.read_to_end().map_err(decode_error)?;

    if samples.len() < channel_count as usize {
        return Err(LoadError::Empty {
            location: location.to_path_buf(),
        });
    }

    let samples = if source_sample_rate != target_sample_rate {
        debug!(
            location = ?location,
            source_rate = source_sample_rate,
            target_rate = target_sample_rate,
            "Transcoding sample"
        );
        transcode_samples(
            &samples,
            channel_count,
            source_sample_rate,
            target_sample_rate,
        )
    } else {
        samples
    };

    Ok(LoadedSample::new(samples, channel_count, target_sample_rate))
}

/// Transcodes samples from one sample rate to another using linear interpolation,
/// which is plenty for one-shot notes.
fn transcode_samples(
    samples: &[f32],
    channel_count: u16,
    source_rate: u32,
    target_rate: u32,
) -> Vec<f32> {
    let ratio = target_rate as f64 / source_rate as f64;
    let channels = channel_count as usize;
    let source_frames = samples.len() / channels;
    let target_frames = (source_frames as f64 * ratio).ceil() as usize;

    let mut output = Vec::with_capacity(target_frames * channels);

    for target_frame in 0..target_frames {
        let source_pos = target_frame as f64 / ratio;
        let source_frame = source_pos.floor() as usize;
        let frac = source_pos.fract() as f32;

        for channel in 0..channels {
            let s0 = samples
                .get(source_frame * channels + channel)
                .copied()
                .unwrap_or(0.0);
            let s1 = samples
                .get((source_frame + 1) * channels + channel)
                .copied()
                .unwrap_or(s0);

            output.push(s0 + (s1 - s0) * frac);
        }
    }

    output
}
