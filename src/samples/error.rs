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
use std::path::PathBuf;

use crate::audio::sample_source::SampleSourceError;

/// Why a note's sample could not be loaded. Only ever reported, never retried.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("unable to read {}: {source}", location.display())]
    Fetch {
        location: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to decode {}: {source}", location.display())]
    Decode {
        location: PathBuf,
        source: SampleSourceError,
    },

    #[error("{} contains no audio", location.display())]
    Empty { location: PathBuf },

    #[error("load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
