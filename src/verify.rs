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
use std::error::Error;

use crate::audio::mock::DEFAULT_SAMPLE_RATE;
use crate::controller::KeyMapping;
use crate::notes::{Note, ALL_NOTES};
use crate::samples::{LoadReport, SampleBank, SampleLoader};

/// Severity level for a verification issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single verification issue found during checking.
#[derive(Debug, Clone)]
pub struct Issue {
    pub severity: Severity,
    pub category: &'static str,
    pub note: Note,
    pub message: String,
}

/// Result of verifying a sample set.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub issues: Vec<Issue>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    /// Merge another report into this one.
    pub fn merge(&mut self, other: VerificationReport) {
        self.issues.extend(other.issues);
    }
}

/// Returns an error for each note whose sample failed to load.
pub fn check_samples(report: &LoadReport) -> VerificationReport {
    VerificationReport {
        issues: report
            .failed
            .iter()
            .map(|(note, error)| Issue {
                severity: Severity::Error,
                category: "samples",
                note: *note,
                message: error.to_string(),
            })
            .collect(),
    }
}

/// Returns a warning for each note that no key plays. Those notes can still be clicked.
pub fn check_key_mapping(mapping: &KeyMapping) -> VerificationReport {
    VerificationReport {
        issues: ALL_NOTES
            .iter()
            .filter(|note| mapping.label_for(note).is_none())
            .map(|note| Issue {
                severity: Severity::Warning,
                category: "key-mapping",
                note: *note,
                message: "no key plays this note".to_string(),
            })
            .collect(),
    }
}

/// Loads every sample the configuration points at and checks the key mapping. Nothing
/// is played, so no audio device is needed.
pub async fn verify(config: &crate::config::Piano) -> Result<VerificationReport, Box<dyn Error>> {
    let mapping = config.key_mapping()?;
    let sample_rate = config.audio().sample_rate().unwrap_or(DEFAULT_SAMPLE_RATE);
    let loader = SampleLoader::new(
        config.sounds_dir(),
        config.extension(),
        sample_rate,
        SampleBank::new(),
    );

    let mut report = check_samples(&loader.spawn_all(ALL_NOTES).wait().await);
    report.merge(check_key_mapping(&mapping));
    Ok(report)
}

/// Prints a verification report grouped by note.
pub fn print_report(report: &VerificationReport) {
    if report.is_clean() {
        println!("\u{2705} All {} note(s) passed verification.", ALL_NOTES.len());
        return;
    }

    let mut by_note: BTreeMap<Note, Vec<&Issue>> = BTreeMap::new();
    for issue in &report.issues {
        by_note.entry(issue.note).or_default().push(issue);
    }

    for (note, issues) in &by_note {
        let has_errors = issues.iter().any(|i| i.severity == Severity::Error);
        let icon = if has_errors {
            "\u{274c}"
        } else {
            "\u{26a0}\u{fe0f} "
        };
        println!("{} {}", icon, note);
        for issue in issues {
            let severity_icon = match issue.severity {
                Severity::Warning => "\u{26a0}\u{fe0f} ",
                Severity::Error => "\u{274c}",
            };
            println!(
                "   {} [{}] {}",
                severity_icon, issue.category, issue.message
            );
        }
    }

    let clean_count = ALL_NOTES.len() - by_note.len();
    if clean_count > 0 {
        println!("\n\u{2705} {} note(s) passed all checks.", clean_count);
    }

    println!(
        "\nSummary: {} issue(s) found across {} note(s).",
        report.issues.len(),
        by_note.len()
    );
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::error::Error;

    use config::{Config, File, FileFormat};

    use super::*;
    use crate::notes::NOTE_COUNT;
    use crate::testutil::write_tone;

    #[test]
    fn test_check_key_mapping() {
        // The built-in table leaves the sharps of octaves 3 and 4 unmapped.
        let report = check_key_mapping(&KeyMapping::default());
        assert_eq!(10, report.issues.len());
        assert!(!report.has_errors());
        assert!(report
            .issues
            .iter()
            .all(|issue| issue.note.pitch().is_sharp() && issue.note.octave() > 2));

        let full: BTreeMap<String, String> = ALL_NOTES
            .iter()
            .enumerate()
            .map(|(i, note)| (format!("K{}", i), note.to_string()))
            .collect();
        assert!(check_key_mapping(&KeyMapping::from_table(&full).unwrap()).is_clean());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_verify() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        for note in ALL_NOTES.iter().filter(|note| note.octave() != 3) {
            write_tone(&dir.path().join(format!("{}.wav", note)), 22050, 100)?;
        }
        std::fs::write(dir.path().join("C3.wav"), b"not a wav file")?;

        let yaml = format!("sounds_dir: {}\n", dir.path().display());
        let config: crate::config::Piano = Config::builder()
            .add_source(File::from_str(&yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;

        let report = verify(&config).await?;
        assert!(report.has_errors());

        let errors: Vec<&Issue> = report
            .issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .collect();
        assert_eq!(NOTE_COUNT / 3, errors.len());
        assert!(errors.iter().all(|issue| issue.note.octave() == 3));
        let c3 = errors.iter().find(|issue| issue.note.to_string() == "C3");
        assert!(c3.is_some_and(|issue| issue.message.contains("decode")));
        Ok(())
    }
}
