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
use symphonia::core::errors::Error as SymphoniaError;

/// Why an audio file couldn't be decoded.
#[derive(Debug, thiserror::Error)]
pub enum SampleSourceError {
    #[error("unrecognized audio format: {0}")]
    UnrecognizedFormat(SymphoniaError),

    #[error("no audio track found")]
    NoAudioTrack,

    #[error("{0} not specified")]
    MissingParameter(&'static str),

    #[error("unsupported codec: {0}")]
    UnsupportedCodec(SymphoniaError),

    #[error("decode failed: {0}")]
    Decode(#[from] SymphoniaError),
}
