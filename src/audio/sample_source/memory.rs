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

use super::error::SampleSourceError;
use super::traits::SampleSource;

/// A sample source that plays interleaved samples already held in memory.
///
/// The sample data is shared, so creating a source for every key press costs nothing
/// beyond the struct itself.
#[derive(Clone)]
pub struct MemorySampleSource {
    samples: Arc<Vec<f32>>,
    /// Current position in samples (not frames).
    position: usize,
    channel_count: u16,
    sample_rate: u32,
}

impl MemorySampleSource {
    /// Creates a source that plays the shared samples from the beginning.
    pub fn from_shared(samples: Arc<Vec<f32>>, channel_count: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            position: 0,
            channel_count,
            sample_rate,
        }
    }

    /// Total number of frames in the source.
    pub fn total_frames(&self) -> usize {
        match self.channel_count {
            0 => 0,
            channels => self.samples.len() / channels as usize,
        }
    }

    /// Returns true once every frame has been played.
    pub fn is_finished(&self) -> bool {
        self.position / (self.channel_count.max(1) as usize) >= self.total_frames()
    }

    /// Adds up to `num_frames` frames into an interleaved output buffer with the given
    /// number of channels, advancing the source. A mono source is spread across every
    /// output channel; otherwise source channel i feeds output channel i and extra
    /// source channels are dropped. Returns the number of frames mixed.
    pub fn mix_into(
        &mut self,
        output: &mut [f32],
        output_channels: usize,
        num_frames: usize,
    ) -> usize {
        let source_channels = self.channel_count as usize;
        if source_channels == 0 || output_channels == 0 {
            return 0;
        }

        let current_frame = self.position / source_channels;
        let available = self.total_frames().saturating_sub(current_frame);
        let frames = available
            .min(num_frames)
            .min(output.len() / output_channels);

        for frame in 0..frames {
            let input = &self.samples[self.position + frame * source_channels..];
            let out = &mut output[frame * output_channels..(frame + 1) * output_channels];
            if source_channels == 1 {
                out.iter_mut().for_each(|sample| *sample += input[0]);
            } else {
                out.iter_mut()
                    .zip(input.iter().take(source_channels))
                    .for_each(|(sample, value)| *sample += value);
            }
        }

        self.position += frames * source_channels;
        frames
    }
}

impl SampleSource for MemorySampleSource {
    fn next_sample(&mut self) -> Result<Option<f32>, SampleSourceError> {
        let total = self.total_frames() * self.channel_count as usize;
        if self.position >= total {
            return Ok(None);
        }
        let sample = self.samples[self.position];
        self.position += 1;
        Ok(Some(sample))
    }

    fn channel_count(&self) -> u16 {
        self.channel_count
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f64(
            self.total_frames() as f64 / self.sample_rate as f64,
        ))
    }
}
