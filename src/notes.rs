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

//! Note identifiers for the three octaves the keyboard covers.

use std::fmt;
use std::str::FromStr;

/// The lowest octave on the keyboard.
pub const LOWEST_OCTAVE: u8 = 2;

/// The highest octave on the keyboard.
pub const HIGHEST_OCTAVE: u8 = 4;

/// The number of semitones in an octave.
pub const SEMITONES: usize = 12;

/// The number of notes on the keyboard.
pub const NOTE_COUNT: usize = SEMITONES * (HIGHEST_OCTAVE - LOWEST_OCTAVE + 1) as usize;

/// Every note on the keyboard, lowest first.
pub const ALL_NOTES: [Note; NOTE_COUNT] = {
    let mut notes = [Note {
        pitch: PitchClass::C,
        octave: LOWEST_OCTAVE,
    }; NOTE_COUNT];
    let mut i = 0;
    while i < NOTE_COUNT {
        notes[i] = Note {
            pitch: PitchClass::ALL[i % SEMITONES],
            octave: LOWEST_OCTAVE + (i / SEMITONES) as u8,
        };
        i += 1;
    }
    notes
};

/// Errors produced when parsing note identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NoteError {
    #[error("unknown note \"{0}\"")]
    Unknown(String),
}

/// One of the twelve semitones of an octave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PitchClass {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl PitchClass {
    /// All pitch classes in ascending order.
    pub const ALL: [PitchClass; SEMITONES] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// The name used in note identifiers.
    pub fn name(&self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// True for the pitches played on black keys.
    pub fn is_sharp(&self) -> bool {
        matches!(
            self,
            PitchClass::CSharp
                | PitchClass::DSharp
                | PitchClass::FSharp
                | PitchClass::GSharp
                | PitchClass::ASharp
        )
    }

    fn from_name(name: &str) -> Option<PitchClass> {
        PitchClass::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// A note identifier such as `C2` or `F#3`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note {
    pitch: PitchClass,
    octave: u8,
}

impl Note {
    /// Creates a note if it lies on the keyboard.
    pub fn new(pitch: PitchClass, octave: u8) -> Option<Note> {
        (LOWEST_OCTAVE..=HIGHEST_OCTAVE)
            .contains(&octave)
            .then_some(Note { pitch, octave })
    }

    pub fn pitch(&self) -> PitchClass {
        self.pitch
    }

    pub fn octave(&self) -> u8 {
        self.octave
    }

    /// Position of the note on the keyboard, starting at zero for the lowest note.
    pub fn index(&self) -> usize {
        (self.octave - LOWEST_OCTAVE) as usize * SEMITONES + self.pitch as usize
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch.name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || NoteError::Unknown(s.to_string());

        let split = s
            .char_indices()
            .last()
            .filter(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| i)
            .ok_or_else(unknown)?;
        let (name, octave) = s.split_at(split);

        let pitch = PitchClass::from_name(name).ok_or_else(unknown)?;
        let octave = octave.parse::<u8>().map_err(|_| unknown())?;
        Note::new(pitch, octave).ok_or_else(unknown)
    }
}
