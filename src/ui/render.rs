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
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Clear, Paragraph, Widget},
};

use super::Keyboard;
use crate::controller::KeyMapping;
use crate::notes::Note;

pub const WHITE_KEY_WIDTH: u16 = 5;
pub const BLACK_KEY_WIDTH: u16 = 3;
const KEY_HEIGHT: u16 = 9;
const STATUS_HEIGHT: u16 = 1;

/// Where a key is drawn on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRect {
    pub note: Note,
    pub area: Rect,
    pub black: bool,
}

impl KeyRect {
    fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.area.x
            && column < self.area.x + self.area.width
            && row >= self.area.y
            && row < self.area.y + self.area.height
    }
}

/// The part of the screen the keys occupy. The status line sits right below it.
pub fn keyboard_area(area: Rect) -> Rect {
    Rect {
        height: area.height.saturating_sub(STATUS_HEIGHT).min(KEY_HEIGHT),
        ..area
    }
}

/// Lays the keys out left to right. White keys span the full height; black keys cover
/// the upper part of the boundary with the previous white key. Black keys come last in
/// the result since they are drawn on top. Keys are clipped to the area.
pub fn layout_keys(area: Rect, keyboard: &Keyboard) -> Vec<KeyRect> {
    let black_height = (area.height * 3 / 5).max(1);
    let mut whites = Vec::new();
    let mut blacks = Vec::new();
    let mut next_white_x = area.x;

    for element in keyboard.elements() {
        let note = element.note();
        if element.is_black() {
            let x = next_white_x.saturating_sub(2).max(area.x);
            blacks.push(KeyRect {
                note,
                area: Rect::new(x, area.y, BLACK_KEY_WIDTH, black_height),
                black: true,
            });
        } else {
            whites.push(KeyRect {
                note,
                area: Rect::new(next_white_x, area.y, WHITE_KEY_WIDTH, area.height),
                black: false,
            });
            next_white_x = next_white_x.saturating_add(WHITE_KEY_WIDTH);
        }
    }

    whites
        .into_iter()
        .chain(blacks)
        .filter_map(|key| {
            let clipped = key.area.intersection(area);
            (!clipped.is_empty()).then_some(KeyRect {
                area: clipped,
                ..key
            })
        })
        .collect()
}

/// Returns the note under the given cell, if any.
pub fn hit_test(keys: &[KeyRect], column: u16, row: u16) -> Option<Note> {
    keys.iter()
        .rev()
        .find(|key| key.contains(column, row))
        .map(|key| key.note)
}

/// Draws the keyboard and a status line.
pub struct KeyboardView<'a> {
    keyboard: &'a Keyboard,
    mapping: &'a KeyMapping,
    loaded: usize,
}

impl<'a> KeyboardView<'a> {
    pub fn new(keyboard: &'a Keyboard, mapping: &'a KeyMapping, loaded: usize) -> Self {
        Self {
            keyboard,
            mapping,
            loaded,
        }
    }

    fn key_style(black: bool, active: bool) -> Style {
        match (black, active) {
            (_, true) => Style::default().bg(Color::Yellow).fg(Color::Black),
            (true, false) => Style::default().bg(Color::DarkGray).fg(Color::White),
            (false, false) => Style::default().bg(Color::White).fg(Color::Black),
        }
    }
}

impl Widget for KeyboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let keys_area = keyboard_area(area);

        for key in layout_keys(keys_area, self.keyboard) {
            let active = self
                .keyboard
                .query_note(&key.note.to_string())
                .is_some_and(|element| element.is_active());
            let style = Self::key_style(key.black, active);
            let label = self.mapping.label_for(&key.note).unwrap_or_default();

            if key.black {
                Clear.render(key.area, buf);
                Paragraph::new(Line::from(label))
                    .alignment(Alignment::Center)
                    .style(style)
                    .render(key.area, buf);
            } else {
                // Labels sit at the bottom of the key, below the black keys.
                let padding = key.area.height.saturating_sub(4) as usize;
                let mut lines = vec![Line::from(""); padding];
                lines.push(Line::from(label));
                lines.push(Line::from(key.note.to_string()));
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .style(style)
                    .block(Block::bordered())
                    .render(key.area, buf);
            }
        }

        let status_y = keys_area.y + keys_area.height;
        if status_y < area.y + area.height {
            let status_area = Rect::new(area.x, status_y, area.width, STATUS_HEIGHT);
            Paragraph::new(format!(
                " {}/{} samples loaded  [Esc] Quit  Click a key or press its letter",
                self.loaded,
                self.keyboard.elements().len()
            ))
            .style(Style::default().fg(Color::DarkGray))
            .render(status_area, buf);
        }
    }
}
