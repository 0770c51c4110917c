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
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use duration_string::DurationString;
use parking_lot::Mutex;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::{Event, KeyPress};

const CLICK: &str = "click";
const KEY: &str = "key";
const WAIT: &str = "wait";
const QUIT: &str = "quit";
const REPEAT: &str = "repeat";

/// A single line of a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Event(Event),
    Wait(Duration),
}

/// Parses a script line. Blank lines and lines starting with '#' yield nothing.
///
/// ```text
/// click C#2
/// key z
/// key 1 Numpad1
/// key z KeyZ repeat
/// wait 250ms
/// quit
/// ```
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut parts = line.split_whitespace();
    let command = parts.next().unwrap_or_default().to_lowercase();
    let args: Vec<&str> = parts.collect();

    let parsed = match (command.as_str(), args.as_slice()) {
        (CLICK, [note]) => Command::Event(Event::Click {
            note: note.to_string(),
        }),
        (KEY, [key]) => Command::Event(Event::KeyDown(KeyPress::new(key))),
        (KEY, [key, code]) => Command::Event(Event::KeyDown(KeyPress::with_code(key, code))),
        (KEY, [key, code, REPEAT]) => {
            Command::Event(Event::KeyDown(KeyPress::with_code(key, code).repeated()))
        }
        (WAIT, [duration]) => Command::Wait(
            DurationString::from_string(duration.to_string())
                .map_err(|e| format!("invalid duration {}: {}", duration, e))?
                .into(),
        ),
        (QUIT, []) => Command::Event(Event::Quit),
        _ => return Err(format!("unrecognized command: {}", line)),
    };
    Ok(Some(parsed))
}

/// A driver that replays input events from a script, one command per line. Quits at
/// the end of the script.
pub struct Driver {
    reader: Mutex<Option<Box<dyn BufRead + Send>>>,
}

impl Driver {
    pub fn new<R>(reader: R) -> Driver
    where
        R: BufRead + Send + 'static,
    {
        Driver {
            reader: Mutex::new(Some(Box::new(reader))),
        }
    }

    /// Reads the script from standard input.
    pub fn stdin() -> Driver {
        Driver::new(BufReader::new(io::stdin()))
    }

    pub fn from_file(path: &Path) -> Result<Driver, io::Error> {
        Ok(Driver::new(BufReader::new(File::open(path)?)))
    }

    fn run_script<R>(events_tx: &Sender<Event>, reader: R) -> Result<(), io::Error>
    where
        R: BufRead,
    {
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            match parse_line(&line) {
                Ok(Some(Command::Event(event))) => {
                    let quit = event == Event::Quit;
                    Self::send(events_tx, event)?;
                    if quit {
                        return Ok(());
                    }
                }
                Ok(Some(Command::Wait(duration))) => std::thread::sleep(duration),
                Ok(None) => {}
                Err(e) => warn!(line = number + 1, "Skipping script line: {}", e),
            }
        }

        Self::send(events_tx, Event::Quit)
    }

    fn send(events_tx: &Sender<Event>, event: Event) -> Result<(), io::Error> {
        events_tx
            .blocking_send(event)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let reader = self.reader.lock().take();
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "script driver");
            let _enter = span.enter();

            match reader {
                Some(reader) => {
                    info!("Script driver started.");
                    Self::run_script(&events_tx, reader)
                }
                None => {
                    warn!("Script has already been played.");
                    Self::send(&events_tx, Event::Quit)
                }
            }
        })
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, BufReader};
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;

    fn get_events(script: &str) -> Result<Vec<Event>, io::Error> {
        let (sender, mut receiver) = mpsc::channel::<Event>(32);

        Driver::run_script(&sender, BufReader::new(script.as_bytes()))?;

        // Force the sender to close.
        drop(sender);
        let mut events = Vec::new();
        while let Some(event) = receiver.blocking_recv() {
            events.push(event);
        }
        Ok(events)
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(Ok(None), parse_line(""));
        assert_eq!(Ok(None), parse_line("   # a comment"));
        assert_eq!(
            Ok(Some(Command::Event(Event::Click {
                note: "C#2".to_string()
            }))),
            parse_line("click C#2")
        );
        assert_eq!(
            Ok(Some(Command::Event(Event::KeyDown(KeyPress::with_code(
                "z", "KeyZ"
            ))))),
            parse_line("KEY z")
        );
        assert_eq!(
            Ok(Some(Command::Event(Event::KeyDown(KeyPress::with_code(
                "1", "Numpad1"
            ))))),
            parse_line("key 1 Numpad1")
        );
        assert_eq!(
            Ok(Some(Command::Event(Event::KeyDown(
                KeyPress::with_code("z", "KeyZ").repeated()
            )))),
            parse_line("key z KeyZ repeat")
        );
        assert_eq!(
            Ok(Some(Command::Wait(Duration::from_millis(250)))),
            parse_line("wait 250ms")
        );
        assert_eq!(Ok(Some(Command::Event(Event::Quit))), parse_line("quit"));

        assert!(parse_line("wait later").is_err());
        assert!(parse_line("click").is_err());
        assert!(parse_line("strum C2").is_err());
    }

    #[test]
    fn test_script_events() -> Result<(), io::Error> {
        let events = get_events("# warm up\nclick C2\nkey q\nbogus\nwait 1ms\nkey q KeyQ repeat\n")?;
        assert_eq!(
            vec![
                Event::Click {
                    note: "C2".to_string()
                },
                Event::KeyDown(KeyPress::new("q")),
                Event::KeyDown(KeyPress::new("q").repeated()),
                Event::Quit,
            ],
            events
        );
        Ok(())
    }

    #[test]
    fn test_script_stops_at_quit() -> Result<(), io::Error> {
        let events = get_events("key z\nquit\nkey x\n")?;
        assert_eq!(vec![Event::KeyDown(KeyPress::new("z")), Event::Quit], events);
        Ok(())
    }
}
