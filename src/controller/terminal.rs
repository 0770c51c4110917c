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
use std::io::{self, stdout, Write};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind,
    KeyEventState, KeyModifiers, KeyboardEnhancementFlags, MouseButton, MouseEvent,
    MouseEventKind, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::DefaultTerminal;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, info, span, warn, Level};

use super::{code_for_char, keypad_code, Event, KeyMapping, KeyPress};
use crate::samples::SampleBank;
use crate::ui::{hit_test, keyboard_area, layout_keys, KeyRect, KeyboardView, Keyboard};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Undoes every terminal mode it switched on when dropped, including when setup fails
/// partway through.
struct TerminalGuard<W: Write> {
    out: W,
    initialized: bool,
    mouse_captured: bool,
    enhanced: bool,
}

impl<W: Write> TerminalGuard<W> {
    fn new(out: W) -> TerminalGuard<W> {
        TerminalGuard {
            out,
            initialized: false,
            mouse_captured: false,
            enhanced: false,
        }
    }

    /// Enters raw mode and the alternate screen.
    fn init(&mut self) -> io::Result<DefaultTerminal> {
        // A failed init may have switched on raw mode already.
        self.initialized = true;
        ratatui::try_init()
    }

    fn capture_mouse(&mut self) -> io::Result<()> {
        execute!(self.out, EnableMouseCapture)?;
        self.mouse_captured = true;
        Ok(())
    }

    fn enhance_keyboard(&mut self) -> io::Result<()> {
        execute!(
            self.out,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
        self.enhanced = true;
        Ok(())
    }
}

impl<W: Write> Drop for TerminalGuard<W> {
    fn drop(&mut self) {
        if self.enhanced {
            if let Err(e) = execute!(self.out, PopKeyboardEnhancementFlags) {
                warn!(err = %e, "Unable to reset keyboard flags");
            }
        }
        if self.mouse_captured {
            if let Err(e) = execute!(self.out, DisableMouseCapture) {
                warn!(err = %e, "Unable to release mouse capture");
            }
        }
        if self.initialized {
            ratatui::restore();
        }
    }
}

/// A driver that draws the keyboard in the terminal and reads the terminal's key and
/// mouse input.
pub struct Driver {
    keyboard: Arc<Keyboard>,
    mapping: Arc<KeyMapping>,
    bank: SampleBank,
}

impl Driver {
    pub fn new(keyboard: Arc<Keyboard>, mapping: Arc<KeyMapping>, bank: SampleBank) -> Driver {
        Driver {
            keyboard,
            mapping,
            bank,
        }
    }

    fn run(
        terminal: &mut DefaultTerminal,
        events_tx: &Sender<Event>,
        keyboard: &Keyboard,
        mapping: &KeyMapping,
        bank: &SampleBank,
    ) -> Result<(), io::Error> {
        loop {
            let mut keys = Vec::new();
            terminal.draw(|frame| {
                let area = frame.area();
                keys = layout_keys(keyboard_area(area), keyboard);
                frame.render_widget(KeyboardView::new(keyboard, mapping, bank.len()), area);
            })?;

            if !event::poll(FRAME_INTERVAL)? {
                continue;
            }

            let Some(event) = translate(&event::read()?, &keys) else {
                continue;
            };
            debug!(event = ?event, "Terminal input");

            let quit = event == Event::Quit;
            if events_tx.blocking_send(event).is_err() || quit {
                return Ok(());
            }
        }
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let keyboard = self.keyboard.clone();
        let mapping = self.mapping.clone();
        let bank = self.bank.clone();

        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "terminal driver");
            let _enter = span.enter();

            let mut guard = TerminalGuard::new(stdout());
            let mut terminal = guard.init()?;
            guard.capture_mouse()?;

            // Key repeats and release events are only reported with the enhanced protocol.
            let enhanced = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
            if enhanced {
                guard.enhance_keyboard()?;
            } else {
                warn!("Terminal doesn't report key repeats, held keys will retrigger");
            }
            info!(enhanced, "Terminal driver started.");

            let result = Self::run(&mut terminal, &events_tx, &keyboard, &mapping, &bank);
            drop(guard);

            result
        })
    }
}

/// Turns terminal input into a piano event. `keys` is where each key was last drawn.
pub fn translate(event: &event::Event, keys: &[KeyRect]) -> Option<Event> {
    match event {
        event::Event::Key(key) => translate_key(key),
        event::Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            ..
        }) => hit_test(keys, *column, *row).map(|note| Event::Click {
            note: note.to_string(),
        }),
        _ => None,
    }
}

fn translate_key(key: &KeyEvent) -> Option<Event> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match key.code {
        KeyCode::Esc => Some(Event::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Event::Quit),
        KeyCode::Char(c) => {
            let code = if key.state.contains(KeyEventState::KEYPAD) {
                keypad_code(c).unwrap_or_else(|| code_for_char(c))
            } else {
                code_for_char(c)
            };
            let press = KeyPress::with_code(&c.to_string(), &code);
            Some(Event::KeyDown(if key.kind == KeyEventKind::Repeat {
                press.repeated()
            } else {
                press
            }))
        }
        _ => None,
    }
}
