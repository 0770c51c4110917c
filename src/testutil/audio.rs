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
    f32::consts::PI,
    fs::File,
    io::{Cursor, Seek, Write},
    path::{Path, PathBuf},
};

use hound::{SampleFormat, WavSpec, WavWriter};

/// Writes planar samples (one Vec per channel) as an interleaved WAV file.
pub fn write_wav<S: hound::Sample + Copy + 'static>(
    path: PathBuf,
    samples: Vec<Vec<S>>,
    sample_rate: u32,
) -> Result<(), Box<dyn Error>> {
    write_samples(File::create(path)?, samples, sample_rate)
}

/// Same as write_wav, but returns the file contents instead.
pub fn wav_bytes<S: hound::Sample + Copy + 'static>(
    samples: Vec<Vec<S>>,
    sample_rate: u32,
) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut bytes = Vec::new();
    write_samples(Cursor::new(&mut bytes), samples, sample_rate)?;
    Ok(bytes)
}

/// Writes a short mono 440Hz tone of the given length in frames.
pub fn write_tone(path: &Path, sample_rate: u32, frames: usize) -> Result<(), Box<dyn Error>> {
    let tone: Vec<f32> = (0..frames)
        .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / sample_rate as f32).sin())
        .collect();
    write_wav(path.to_path_buf(), vec![tone], sample_rate)
}

fn write_samples<W, S>(writer: W, samples: Vec<Vec<S>>, sample_rate: u32) -> Result<(), Box<dyn Error>>
where
    W: Write + Seek,
    S: hound::Sample + Copy + 'static,
{
    // Determine sample format based on the type
    let (sample_format, bits_per_sample) =
        if std::any::TypeId::of::<S>() == std::any::TypeId::of::<f32>() {
            (SampleFormat::Float, 32)
        } else if std::any::TypeId::of::<S>() == std::any::TypeId::of::<i32>() {
            (SampleFormat::Int, 32)
        } else if std::any::TypeId::of::<S>() == std::any::TypeId::of::<i16>() {
            (SampleFormat::Int, 16)
        } else {
            return Err("Unsupported sample format".into());
        };

    let num_channels = samples.len();
    assert!(num_channels <= u16::MAX.into(), "Too many channels!");
    let mut writer = WavWriter::new(
        writer,
        WavSpec {
            channels: num_channels as u16,
            sample_rate,
            bits_per_sample,
            sample_format,
        },
    )?;

    let frames = samples.iter().map(Vec::len).min().unwrap_or(0);
    for frame in 0..frames {
        for channel_samples in &samples {
            writer.write_sample(channel_samples[frame])?;
        }
    }
    writer.finalize()?;

    Ok(())
}
