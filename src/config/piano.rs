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
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use super::audio::Audio;
use super::error::ConfigError;
use crate::controller::KeyMapping;
use crate::notes::Note;
use crate::samples;

const DEFAULT_SOUNDS_DIR: &str = "sounds";
const DEFAULT_EXTENSION: &str = "wav";
const DEFAULT_HIGHLIGHT_DURATION: Duration = Duration::from_millis(200);
const DEFAULT_LOG_FILE: &str = "vpiano.log";

/// The configuration for the piano. Every field is optional.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Piano {
    /// The directory holding one sample per note.
    sounds_dir: Option<String>,

    /// The file extension of the samples.
    extension: Option<String>,

    /// How long a key stays highlighted after it is played.
    highlight_duration: Option<String>,

    /// Where logs go while the terminal keyboard owns the screen.
    log_file: Option<String>,

    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,

    /// Replaces the default key to note table when set.
    key_mapping: Option<BTreeMap<String, String>>,
}

impl Piano {
    /// Parse a piano configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Piano, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Piano>()?)
    }

    /// Loads the configuration at the given path, or the defaults if there is none.
    pub fn load(path: Option<&Path>) -> Result<Piano, ConfigError> {
        match path {
            Some(path) => Piano::deserialize(path),
            None => Ok(Piano::default()),
        }
    }

    /// Returns the samples directory.
    pub fn sounds_dir(&self) -> PathBuf {
        PathBuf::from(self.sounds_dir.as_deref().unwrap_or(DEFAULT_SOUNDS_DIR))
    }

    /// Returns the sample file extension.
    pub fn extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(DEFAULT_EXTENSION)
    }

    /// Returns where the sample for the note is loaded from.
    pub fn sample_location(&self, note: &Note) -> PathBuf {
        samples::sample_location(&self.sounds_dir(), note, self.extension())
    }

    /// Returns the highlight duration (default: 200ms).
    pub fn highlight_duration(&self) -> Result<Duration, ConfigError> {
        match &self.highlight_duration {
            Some(value) => Ok(DurationString::from_string(value.clone())
                .map_err(|e| ConfigError::InvalidDuration {
                    value: value.clone(),
                    reason: e.to_string(),
                })?
                .into()),
            None => Ok(DEFAULT_HIGHLIGHT_DURATION),
        }
    }

    /// Returns the log file path.
    pub fn log_file(&self) -> PathBuf {
        PathBuf::from(self.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE))
    }

    /// Returns the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Builds the key mapping, validating every configured note.
    pub fn key_mapping(&self) -> Result<KeyMapping, ConfigError> {
        match &self.key_mapping {
            Some(table) => Ok(KeyMapping::from_table(table)?),
            None => Ok(KeyMapping::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;
    use crate::controller::{KeyMappingError, KeyPress};

    fn parse(yaml: &str) -> Piano {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let piano = Piano::default();

        assert_eq!(PathBuf::from("sounds"), piano.sounds_dir());
        assert_eq!("wav", piano.extension());
        assert_eq!(
            Duration::from_millis(200),
            piano.highlight_duration().unwrap()
        );
        assert_eq!(PathBuf::from("vpiano.log"), piano.log_file());
        assert_eq!(
            PathBuf::from("sounds/C#2.wav"),
            piano.sample_location(&"C#2".parse().unwrap())
        );
        assert!(piano.audio().is_default_device());
        assert_eq!(None, piano.audio().sample_rate());

        let mapping = piano.key_mapping().unwrap();
        assert_eq!(Some("C2".parse().unwrap()), mapping.get("Z"));
    }

    #[test]
    fn test_full_config() {
        let piano = parse(
            r#"
            sounds_dir: /opt/piano/samples
            extension: flac
            highlight_duration: 350ms
            log_file: /tmp/piano.log
            audio:
              device: mock-device
              sample_rate: 48000
            key_mapping:
              A: C3
              "/": B4
            "#,
        );

        assert_eq!(PathBuf::from("/opt/piano/samples"), piano.sounds_dir());
        assert_eq!("flac", piano.extension());
        assert_eq!(
            Duration::from_millis(350),
            piano.highlight_duration().unwrap()
        );
        assert_eq!(PathBuf::from("/tmp/piano.log"), piano.log_file());
        assert_eq!(
            PathBuf::from("/opt/piano/samples/B4.flac"),
            piano.sample_location(&"B4".parse().unwrap())
        );
        assert_eq!("mock-device", piano.audio().device());
        assert_eq!(Some(48000), piano.audio().sample_rate());

        let mapping = piano.key_mapping().unwrap();
        assert_eq!(Some("C3".parse().unwrap()), mapping.get("A"));
        assert_eq!(Some("B4".parse().unwrap()), mapping.get("/"));
        // The configured table replaces the default one.
        assert_eq!(None, mapping.get("Z"));
    }

    #[test]
    fn test_audio_defaults_when_section_partial() {
        let piano = parse(
            r#"
            audio:
              sample_rate: 44100
            "#,
        );
        assert!(piano.audio().is_default_device());
        assert_eq!(Some(44100), piano.audio().sample_rate());
    }

    #[test]
    fn test_invalid_key_mapping() {
        let piano = parse(
            r#"
            key_mapping:
              Z: C9
            "#,
        );

        match piano.key_mapping() {
            Err(ConfigError::InvalidKeyMapping(KeyMappingError::UnknownNote { label, .. })) => {
                assert_eq!("Z", label)
            }
            other => panic!("expected invalid key mapping, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_lowercase_key_mapping() {
        let piano = parse(
            r#"
            key_mapping:
              a: D3
              z: C2
            "#,
        );

        let mapping = piano.key_mapping().unwrap();
        assert_eq!(Some("D3".parse().unwrap()), mapping.get("A"));
        assert_eq!(
            Some("C2".parse().unwrap()),
            mapping.resolve(&KeyPress::new("z"))
        );
        assert_eq!(None, mapping.get("a"));
    }

    #[test]
    fn test_conflicting_key_mapping() {
        let piano = parse(
            r#"
            key_mapping:
              a: D3
              A: E3
            "#,
        );

        assert!(matches!(
            piano.key_mapping(),
            Err(ConfigError::InvalidKeyMapping(
                KeyMappingError::ConflictingKeys { .. }
            ))
        ));
    }

    #[test]
    fn test_invalid_duration() {
        let piano = parse("highlight_duration: soon");
        assert!(matches!(
            piano.highlight_duration(),
            Err(ConfigError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Piano::load(Some(&dir.path().join("missing.yaml")));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
