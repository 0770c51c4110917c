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
use std::collections::BTreeSet;

use parking_lot::Mutex;

use crate::notes::{Note, ALL_NOTES};

/// The class that marks a key as highlighted.
pub const ACTIVE_CLASS: &str = "active";

const KEY_CLASS: &str = "key";
const WHITE_CLASS: &str = "white";
const BLACK_CLASS: &str = "black";

/// One key on the on-screen keyboard. It carries the note it plays and a set of
/// classes that can change while the keyboard is on screen.
#[derive(Debug)]
pub struct KeyElement {
    note: Note,
    classes: Mutex<BTreeSet<String>>,
}

impl KeyElement {
    pub fn new(note: Note) -> KeyElement {
        let color = if note.pitch().is_sharp() {
            BLACK_CLASS
        } else {
            WHITE_CLASS
        };
        KeyElement {
            note,
            classes: Mutex::new([KEY_CLASS, color].into_iter().map(String::from).collect()),
        }
    }

    pub fn note(&self) -> Note {
        self.note
    }

    /// The note attribute, e.g. "C#2".
    pub fn data_note(&self) -> String {
        self.note.to_string()
    }

    pub fn is_black(&self) -> bool {
        self.has_class(BLACK_CLASS)
    }

    pub fn add_class(&self, class: &str) {
        self.classes.lock().insert(class.to_string());
    }

    pub fn remove_class(&self, class: &str) {
        self.classes.lock().remove(class);
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.lock().contains(class)
    }

    /// True while the key is highlighted.
    pub fn is_active(&self) -> bool {
        self.has_class(ACTIVE_CLASS)
    }
}

/// The keys on screen, lowest note first.
#[derive(Debug)]
pub struct Keyboard {
    elements: Vec<KeyElement>,
}

impl Keyboard {
    /// A keyboard with an element for each of the given notes.
    pub fn new(notes: impl IntoIterator<Item = Note>) -> Keyboard {
        let mut notes: Vec<Note> = notes.into_iter().collect();
        notes.sort();
        notes.dedup();
        Keyboard {
            elements: notes.into_iter().map(KeyElement::new).collect(),
        }
    }

    /// A keyboard with every note.
    pub fn full() -> Keyboard {
        Keyboard::new(ALL_NOTES)
    }

    /// Finds the key whose note attribute equals the given value.
    pub fn query_note(&self, data_note: &str) -> Option<&KeyElement> {
        self.elements
            .iter()
            .find(|element| element.data_note() == data_note)
    }

    pub fn elements(&self) -> &[KeyElement] {
        &self.elements
    }

    /// Notes whose keys are currently highlighted.
    pub fn active_notes(&self) -> Vec<Note> {
        self.elements
            .iter()
            .filter(|element| element.is_active())
            .map(KeyElement::note)
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_full_keyboard() {
        let keyboard = Keyboard::full();
        assert_eq!(36, keyboard.elements().len());
        assert_eq!(15, keyboard.elements().iter().filter(|k| k.is_black()).count());
        assert!(keyboard.active_notes().is_empty());
    }

    #[test]
    fn test_query_note() {
        let keyboard = Keyboard::full();
        let element = keyboard.query_note("F#3").unwrap();
        assert_eq!("F#3", element.data_note());
        assert!(element.is_black());
        assert!(element.has_class("key"));

        assert!(keyboard.query_note("f#3").is_none());
        assert!(keyboard.query_note("C5").is_none());
    }

    #[test]
    fn test_classes() {
        let keyboard = Keyboard::new(["C2".parse().unwrap()]);
        let element = keyboard.query_note("C2").unwrap();
        assert!(!element.is_black());

        element.add_class(ACTIVE_CLASS);
        element.add_class(ACTIVE_CLASS);
        assert!(element.is_active());
        assert_eq!(vec![element.note()], keyboard.active_notes());

        element.remove_class(ACTIVE_CLASS);
        assert!(!element.is_active());
        assert!(element.has_class("white"));
    }

    #[test]
    fn test_partial_keyboard() {
        let keyboard = Keyboard::new(["E3".parse().unwrap(), "C2".parse().unwrap()]);
        let notes: Vec<String> = keyboard.elements().iter().map(|k| k.data_note()).collect();
        assert_eq!(vec!["C2", "E3"], notes);
        assert!(keyboard.query_note("D2").is_none());
    }
}
