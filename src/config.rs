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
use std::error::Error;
use std::sync::Arc;

use tracing::info;

use crate::notes::ALL_NOTES;
use crate::piano::Session;
use crate::samples::{SampleBank, SampleLoader};
use crate::ui::Keyboard;

mod audio;
mod error;
mod piano;

pub use self::audio::Audio;
pub use self::error::ConfigError;
pub use self::piano::Piano;

/// Initializes the piano from the given configuration and starts loading every note.
/// Loads continue in the background; the returned session never waits on them.
/// Must be called from within a tokio runtime.
pub fn init_session(config: &Piano) -> Result<Session, Box<dyn Error>> {
    // Validate everything before any load is started.
    let highlight_duration = config.highlight_duration()?;
    let mapping = config.key_mapping()?;
    let device = crate::audio::get_device(config.audio())?;

    info!(
        device = device.to_string(),
        sounds_dir = ?config.sounds_dir(),
        sample_rate = device.sample_rate(),
        "Initializing piano."
    );

    let bank = SampleBank::new();
    let loader = SampleLoader::new(
        config.sounds_dir(),
        config.extension(),
        device.sample_rate(),
        bank.clone(),
    );
    let loads = loader.spawn_all(ALL_NOTES);

    let keyboard = Arc::new(Keyboard::full());
    let piano = Arc::new(crate::piano::Piano::new(
        bank,
        device,
        keyboard,
        highlight_duration,
    ));

    Ok(Session {
        piano,
        mapping: Arc::new(mapping),
        loads,
    })
}
