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

use crate::notes::{Note, NoteError};

/// The built-in key table: the Z row and the home row cover octave 2, the Q row the
/// white keys of octave 3 and the digits the white keys of octave 4.
const DEFAULT_MAPPING: [(&str, &str); 26] = [
    ("Z", "C2"),
    ("S", "C#2"),
    ("X", "D2"),
    ("D", "D#2"),
    ("C", "E2"),
    ("V", "F2"),
    ("G", "F#2"),
    ("B", "G2"),
    ("H", "G#2"),
    ("N", "A2"),
    ("J", "A#2"),
    ("M", "B2"),
    ("Q", "C3"),
    ("W", "D3"),
    ("E", "E3"),
    ("R", "F3"),
    ("T", "G3"),
    ("Y", "A3"),
    ("U", "B3"),
    ("1", "C4"),
    ("2", "D4"),
    ("3", "E4"),
    ("4", "F4"),
    ("5", "G4"),
    ("6", "A4"),
    ("7", "B4"),
];

/// A physical key going down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    /// The character the key produced, e.g. "q", "Q" or "!".
    pub key: String,
    /// The physical key, independent of layout and modifiers, e.g. "KeyQ" or "Digit1".
    pub code: String,
    /// True when the press comes from the key being held down.
    pub repeat: bool,
}

impl KeyPress {
    /// A first press of a key, with the code derived from the character.
    pub fn new(key: &str) -> KeyPress {
        let code = key
            .chars()
            .next()
            .filter(|_| key.chars().count() == 1)
            .map(code_for_char)
            .unwrap_or_else(|| key.to_string());
        KeyPress {
            key: key.to_string(),
            code,
            repeat: false,
        }
    }

    pub fn with_code(key: &str, code: &str) -> KeyPress {
        KeyPress {
            key: key.to_string(),
            code: code.to_string(),
            repeat: false,
        }
    }

    pub fn repeated(mut self) -> KeyPress {
        self.repeat = true;
        self
    }
}

/// Turns a key press into the label used to look up the key table. Letters are
/// uppercased, digit and keypad keys keep the character they produced as is, and the
/// slash key always reads "/".
pub fn resolve_label(key: &str, code: &str) -> String {
    if code.starts_with("Digit") || code.starts_with("Numpad") {
        key.to_string()
    } else if code == "Slash" {
        "/".to_string()
    } else {
        key.to_uppercase()
    }
}

/// The physical key code for a character typed on a US layout.
pub fn code_for_char(c: char) -> String {
    let code = match c {
        'a'..='z' | 'A'..='Z' => return format!("Key{}", c.to_ascii_uppercase()),
        '0'..='9' => return format!("Digit{}", c),
        '!' => "Digit1",
        '@' => "Digit2",
        '#' => "Digit3",
        '$' => "Digit4",
        '%' => "Digit5",
        '^' => "Digit6",
        '&' => "Digit7",
        '*' => "Digit8",
        '(' => "Digit9",
        ')' => "Digit0",
        '/' | '?' => "Slash",
        '\\' | '|' => "Backslash",
        ',' | '<' => "Comma",
        '.' | '>' => "Period",
        ';' | ':' => "Semicolon",
        '\'' | '"' => "Quote",
        '[' | '{' => "BracketLeft",
        ']' | '}' => "BracketRight",
        '-' | '_' => "Minus",
        '=' | '+' => "Equal",
        '`' | '~' => "Backquote",
        ' ' => "Space",
        _ => "Unidentified",
    };
    code.to_string()
}

/// The code of a digit on the numeric keypad.
pub fn keypad_code(c: char) -> Option<String> {
    c.is_ascii_digit().then(|| format!("Numpad{}", c))
}

/// Why a key table couldn't be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyMappingError {
    #[error("key \"{label}\": {source}")]
    UnknownNote { label: String, source: NoteError },

    #[error("keys \"{first}\" and \"{second}\" are the same key but play different notes")]
    ConflictingKeys { first: String, second: String },
}

/// Maps key labels to notes. Fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMapping {
    keys: BTreeMap<String, Note>,
}

impl Default for KeyMapping {
    fn default() -> Self {
        KeyMapping {
            keys: DEFAULT_MAPPING
                .iter()
                .filter_map(|(label, note)| Some((label.to_string(), note.parse().ok()?)))
                .collect(),
        }
    }
}

impl KeyMapping {
    /// Builds a mapping from label to note name. Letter labels are matched against
    /// uppercased keys, so they are stored uppercased; two labels that end up the same
    /// must name the same note.
    pub fn from_table(table: &BTreeMap<String, String>) -> Result<KeyMapping, KeyMappingError> {
        let mut keys: BTreeMap<String, (String, Note)> = BTreeMap::new();
        for (label, name) in table {
            let note = name
                .parse::<Note>()
                .map_err(|source| KeyMappingError::UnknownNote {
                    label: label.clone(),
                    source,
                })?;
            let normalized = label.to_uppercase();
            match keys.get(&normalized) {
                Some((first, existing)) if *existing != note => {
                    return Err(KeyMappingError::ConflictingKeys {
                        first: first.clone(),
                        second: label.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    keys.insert(normalized, (label.clone(), note));
                }
            }
        }
        Ok(KeyMapping {
            keys: keys
                .into_iter()
                .map(|(label, (_, note))| (label, note))
                .collect(),
        })
    }

    /// Looks up a label as is.
    pub fn get(&self, label: &str) -> Option<Note> {
        self.keys.get(label).copied()
    }

    /// Looks up the note a key press plays.
    pub fn resolve(&self, press: &KeyPress) -> Option<Note> {
        self.get(&resolve_label(&press.key, &press.code))
    }

    /// The first label that plays the note, for display.
    pub fn label_for(&self, note: &Note) -> Option<&str> {
        self.keys
            .iter()
            .find(|(_, mapped)| *mapped == note)
            .map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn note(name: &str) -> Option<Note> {
        Some(name.parse().unwrap())
    }

    #[test]
    fn test_default_mapping() {
        let mapping = KeyMapping::default();
        assert_eq!(26, mapping.len());
        assert_eq!(note("C2"), mapping.get("Z"));
        assert_eq!(note("A#2"), mapping.get("J"));
        assert_eq!(note("B3"), mapping.get("U"));
        assert_eq!(note("C4"), mapping.get("1"));
        assert_eq!(note("B4"), mapping.get("7"));
        assert_eq!(None, mapping.get("z"));
        assert_eq!(None, mapping.get("/"));
    }

    #[test]
    fn test_resolve_label() {
        assert_eq!("C", resolve_label("c", "KeyC"));
        assert_eq!("C", resolve_label("C", "KeyC"));
        assert_eq!("1", resolve_label("1", "Digit1"));
        assert_eq!("!", resolve_label("!", "Digit1"));
        assert_eq!("5", resolve_label("5", "Numpad5"));
        assert_eq!("/", resolve_label("/", "Slash"));
        assert_eq!("/", resolve_label("?", "Slash"));
        assert_eq!("ENTER", resolve_label("Enter", "Enter"));
    }

    #[test]
    fn test_resolve() {
        let mapping = KeyMapping::default();
        assert_eq!(note("E2"), mapping.resolve(&KeyPress::new("c")));
        assert_eq!(note("E2"), mapping.resolve(&KeyPress::new("C")));
        assert_eq!(note("C4"), mapping.resolve(&KeyPress::new("1")));
        assert_eq!(note("C4"), mapping.resolve(&KeyPress::with_code("1", "Numpad1")));
        // Shift+1 produces "!" which has no entry.
        assert_eq!(None, mapping.resolve(&KeyPress::new("!")));
        assert_eq!(None, mapping.resolve(&KeyPress::new("p")));
        assert_eq!(None, mapping.resolve(&KeyPress::new("Escape")));
    }

    #[test]
    fn test_slash() {
        let mut table = BTreeMap::new();
        table.insert("/".to_string(), "C3".to_string());
        let mapping = KeyMapping::from_table(&table).unwrap();

        assert_eq!(note("C3"), mapping.resolve(&KeyPress::new("/")));
        assert_eq!(note("C3"), mapping.resolve(&KeyPress::new("?")));
    }

    #[test]
    fn test_from_table_rejects_unknown_notes() {
        let mut table = BTreeMap::new();
        table.insert("A".to_string(), "C3".to_string());
        table.insert("B".to_string(), "H3".to_string());

        assert_eq!(
            Err(KeyMappingError::UnknownNote {
                label: "B".to_string(),
                source: NoteError::Unknown("H3".to_string()),
            }),
            KeyMapping::from_table(&table)
        );
    }

    #[test]
    fn test_from_table_uppercases_letters() {
        let mut table = BTreeMap::new();
        table.insert("a".to_string(), "D3".to_string());
        table.insert("1".to_string(), "C4".to_string());
        let mapping = KeyMapping::from_table(&table).unwrap();

        assert_eq!(note("D3"), mapping.get("A"));
        assert_eq!(None, mapping.get("a"));
        assert_eq!(note("D3"), mapping.resolve(&KeyPress::new("a")));
        assert_eq!(note("D3"), mapping.resolve(&KeyPress::new("A")));
        assert_eq!(note("C4"), mapping.resolve(&KeyPress::new("1")));
        assert_eq!(Some("A"), mapping.label_for(&"D3".parse().unwrap()));
    }

    #[test]
    fn test_from_table_rejects_conflicting_case() {
        let mut table = BTreeMap::new();
        table.insert("A".to_string(), "D3".to_string());
        table.insert("a".to_string(), "E3".to_string());
        assert_eq!(
            Err(KeyMappingError::ConflictingKeys {
                first: "A".to_string(),
                second: "a".to_string(),
            }),
            KeyMapping::from_table(&table)
        );

        // The same note under both spellings is harmless.
        table.insert("a".to_string(), "D3".to_string());
        assert_eq!(1, KeyMapping::from_table(&table).unwrap().len());
    }

    #[test]
    fn test_code_for_char() {
        assert_eq!("KeyQ", code_for_char('q'));
        assert_eq!("KeyQ", code_for_char('Q'));
        assert_eq!("Digit7", code_for_char('7'));
        assert_eq!("Digit7", code_for_char('&'));
        assert_eq!("Slash", code_for_char('?'));
        assert_eq!("Unidentified", code_for_char('é'));
        assert_eq!(Some("Numpad3".to_string()), keypad_code('3'));
        assert_eq!(None, keypad_code('+'));
    }

    #[test]
    fn test_label_for() {
        let mapping = KeyMapping::default();
        assert_eq!(Some("Z"), mapping.label_for(&"C2".parse().unwrap()));
        assert_eq!(Some("1"), mapping.label_for(&"C4".parse().unwrap()));
        assert_eq!(None, mapping.label_for(&"C#3".parse().unwrap()));
    }
}
