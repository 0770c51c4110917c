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
use std::sync::atomic::{AtomicU64, Ordering};
use std::{error::Error, fmt, sync::Arc};

use crate::config;

pub mod cpal;
pub mod mixer;
pub mod mock;
pub mod sample_source;

use self::sample_source::MemorySampleSource;

/// Global atomic counter for generating unique source IDs.
static SOURCE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Returns a new, process-unique playback source ID.
pub fn next_source_id() -> u64 {
    SOURCE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// An audio output that plays independent sources on top of each other.
pub trait Device: fmt::Display + Send + Sync {
    /// The sample rate the device mixes at. Loaded samples are converted to this rate.
    fn sample_rate(&self) -> u32;

    /// Starts playing the given source immediately and returns its ID. Sources already
    /// playing are left alone.
    fn play(&self, source: MemorySampleSource) -> Result<u64, Box<dyn Error>>;

    #[cfg(test)]
    fn to_mock(&self) -> Result<Arc<mock::Device>, Box<dyn Error>>;
}

/// Describes an output device without opening it.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub host: String,
    pub max_channels: u16,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (Channels={}) ({})",
            self.name, self.max_channels, self.host
        )
    }
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<DeviceInfo>, Box<dyn Error>> {
    cpal::Device::list()
}

/// Gets the device described by the configuration.
pub fn get_device(config: &config::Audio) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        let mock = match config.sample_rate() {
            Some(sample_rate) => mock::Device::with_sample_rate(device, sample_rate),
            None => mock::Device::get(device),
        };
        return Ok(Arc::new(mock));
    };

    Ok(Arc::new(cpal::Device::get(config)?))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_source_ids_are_unique() {
        let first = next_source_id();
        let second = next_source_id();
        assert!(second > first);
    }

    #[test]
    fn test_get_mock_device() {
        let device = get_device(&config::Audio::new("mock-device")).unwrap();
        assert_eq!("mock-device (Mock)", device.to_string());
        assert_eq!(mock::DEFAULT_SAMPLE_RATE, device.sample_rate());
        assert!(device.to_mock().is_ok());
    }
}
