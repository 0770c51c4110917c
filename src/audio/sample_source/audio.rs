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
use std::io::Cursor;
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::default::{get_codecs, get_probe};
use tracing::debug;

use super::error::SampleSourceError;
use super::traits::SampleSource;

/// A sample source that decodes an in-memory audio file (WAV, FLAC, MP3, etc.) with
/// symphonia and yields interleaved f32 samples.
pub struct AudioSampleSource {
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    is_finished: bool,
    sample_buffer: Vec<f32>,
    buffer_position: usize,
    channels: u16,
    sample_rate: u32,
    duration: Option<Duration>,
}

impl SampleSource for AudioSampleSource {
    fn next_sample(&mut self) -> Result<Option<f32>, SampleSourceError> {
        if self.is_finished {
            return Ok(None);
        }

        if self.buffer_position >= self.sample_buffer.len() {
            self.refill_buffer()?;

            if self.sample_buffer.is_empty() {
                self.is_finished = true;
                return Ok(None);
            }
        }

        let sample = self.sample_buffer[self.buffer_position];
        self.buffer_position += 1;
        Ok(Some(sample))
    }

    fn channel_count(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

impl AudioSampleSource {
    /// Creates a new audio sample source from the raw bytes of an audio file. The extension,
    /// if known, helps symphonia pick the right format reader.
    pub fn from_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<Self, SampleSourceError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = extension {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();
        let probed = get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(SampleSourceError::UnrecognizedFormat)?;
        let format_reader = probed.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(SampleSourceError::NoAudioTrack)?;

        let track_id = track.id;
        let params = &track.codec_params;

        let sample_rate = params
            .sample_rate
            .ok_or(SampleSourceError::MissingParameter("sample rate"))?;
        let channels = params
            .channels
            .map(|c| c.count() as u16)
            .filter(|c| *c > 0)
            .ok_or(SampleSourceError::MissingParameter("channel count"))?;
        let duration = params
            .n_frames
            .map(|n_frames| Duration::from_secs_f64(n_frames as f64 / sample_rate as f64));

        let decoder_opts: DecoderOptions = Default::default();
        let decoder = get_codecs()
            .make(params, &decoder_opts)
            .map_err(SampleSourceError::UnsupportedCodec)?;

        Ok(Self {
            format_reader,
            decoder,
            track_id,
            is_finished: false,
            sample_buffer: Vec::new(),
            buffer_position: 0,
            channels,
            sample_rate,
            duration,
        })
    }

    /// Reads the next packet. End of stream shows up as Ok(None).
    fn read_next_packet(&mut self) -> Result<Option<Packet>, SampleSourceError> {
        match self.format_reader.next_packet() {
            Ok(packet) => Ok(Some(packet)),
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Ok(None)
            }
            Err(SymphoniaError::ResetRequired) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Decodes packets until one yields audio, replacing the buffer contents. Leaves the
    /// buffer empty at the end of the stream.
    fn refill_buffer(&mut self) -> Result<(), SampleSourceError> {
        self.sample_buffer.clear();
        self.buffer_position = 0;

        while let Some(packet) = self.read_next_packet()? {
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    // A corrupt packet is skipped rather than ending the stream.
                    debug!(err = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            if decoded.frames() == 0 {
                continue;
            }

            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
            buffer.copy_interleaved_ref(decoded);
            self.sample_buffer.extend_from_slice(buffer.samples());
            return Ok(());
        }

        Ok(())
    }
}
