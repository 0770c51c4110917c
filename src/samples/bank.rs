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
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::LoadedSample;
use crate::notes::Note;

/// The decoded samples, keyed by note. Entries are only ever added; a note without an
/// entry simply has no sound.
#[derive(Clone, Default)]
pub struct SampleBank {
    samples: Arc<RwLock<HashMap<Note, LoadedSample>>>,
}

impl SampleBank {
    /// Creates an empty bank.
    pub fn new() -> SampleBank {
        SampleBank::default()
    }

    /// Stores the sample for a note.
    pub fn insert(&self, note: Note, sample: LoadedSample) {
        self.samples.write().insert(note, sample);
    }

    /// Returns the sample for a note. The data is shared, not copied.
    pub fn get(&self, note: &Note) -> Option<LoadedSample> {
        self.samples.read().get(note).cloned()
    }

    pub fn contains(&self, note: &Note) -> bool {
        self.samples.read().contains_key(note)
    }

    pub fn len(&self) -> usize {
        self.samples.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.read().is_empty()
    }

    /// Returns the total memory used by loaded samples.
    pub fn memory_usage(&self) -> usize {
        self.samples.read().values().map(|s| s.memory_size()).sum()
    }
}

impl std::fmt::Debug for SampleBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleBank")
            .field("loaded_samples", &self.len())
            .field("total_memory_kb", &(self.memory_usage() / 1024))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank() {
        let bank = SampleBank::new();
        let e3: Note = "E3".parse().unwrap();
        let c2: Note = "C2".parse().unwrap();
        assert!(bank.is_empty());
        assert!(bank.get(&c2).is_none());

        bank.insert(e3, LoadedSample::new(vec![0.5; 4], 1, 44100));
        let shared = bank.clone();
        shared.insert(c2, LoadedSample::new(vec![0.5; 8], 2, 44100));

        assert_eq!(2, bank.len());
        assert!(bank.contains(&c2));
        assert!(bank.contains(&e3));
        assert_eq!(12 * std::mem::size_of::<f32>(), bank.memory_usage());
        assert_eq!(2, bank.get(&c2).unwrap().channel_count());
    }
}
