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
use std::io;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, error, info, span, trace, Instrument, Level};

use crate::piano::{Piano, Playback};

mod keymap;
pub mod script;
pub mod terminal;

pub use keymap::{
    code_for_char, keypad_code, resolve_label, KeyMapping, KeyMappingError, KeyPress,
};

/// Input events that drive the piano.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// An on-screen key was clicked. Carries the key's note attribute.
    Click { note: String },

    /// A physical key went down.
    KeyDown(KeyPress),

    /// Stops the controller.
    Quit,
}

/// A source of input events.
pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Applies a single event to the piano. Returns what was played, or None if the event
/// doesn't play anything.
pub fn handle_event(piano: &Piano, mapping: &KeyMapping, event: &Event) -> Option<Playback> {
    match event {
        Event::Click { note } => Some(piano.play_note_name(note)),
        Event::KeyDown(press) if press.repeat => {
            trace!(key = press.key, "Ignoring repeated key");
            None
        }
        Event::KeyDown(press) => match mapping.resolve(press) {
            Some(note) => Some(piano.play_sound(note)),
            None => {
                trace!(key = press.key, code = press.code, "Key is not mapped");
                None
            }
        },
        Event::Quit => None,
    }
}

/// Feeds events from a driver to the piano.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(piano: Arc<Piano>, mapping: Arc<KeyMapping>, driver: Arc<dyn Driver>) -> Controller {
        let span = span!(Level::INFO, "controller");
        Controller {
            handle: tokio::spawn(
                Controller::trigger_events(piano, mapping, driver).instrument(span),
            ),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Plays notes by watching the driver and getting events from it.
    async fn trigger_events(piano: Arc<Piano>, mapping: Arc<KeyMapping>, driver: Arc<dyn Driver>) {
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let join_handle = driver.monitor_events(events_tx);

        info!(mapped_keys = mapping.len(), "Controller started.");

        while let Some(event) = events_rx.recv().await {
            debug!(event = ?event, "Received event.");
            if event == Event::Quit {
                break;
            }
            handle_event(&piano, &mapping, &event);
        }

        info!("Controller closing.");
        // Anything the driver still sends fails and lets it stop.
        drop(events_rx);
        match join_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Event monitor failed: {}", e),
            Err(e) => error!("Error waiting for event monitor to stop: {}", e),
        }
    }
}

#[cfg(test)]
mod test {
    use std::error::Error;
    use std::io::{self, Cursor};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::{sync::mpsc::Sender, task::JoinHandle};

    use crate::audio::{self, Device as _};
    use crate::notes::Note;
    use crate::piano::{Piano, Playback};
    use crate::samples::{LoadedSample, SampleBank};
    use crate::ui::Keyboard;

    use super::*;

    /// Sends a fixed list of events and stops.
    struct TestDriver {
        events: Vec<Event>,
    }

    impl Driver for TestDriver {
        fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
            let events = self.events.clone();
            tokio::task::spawn_blocking(move || {
                for event in events {
                    events_tx
                        .blocking_send(event)
                        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                }
                Ok(())
            })
        }
    }

    fn piano(notes: &[&str]) -> (Arc<Piano>, Arc<audio::mock::Device>) {
        let device = Arc::new(audio::mock::Device::get("mock-device"));
        let bank = SampleBank::new();
        for name in notes {
            let note: Note = name.parse().unwrap();
            bank.insert(note, LoadedSample::new(vec![0.25; 32], 1, device.sample_rate()));
        }
        let piano = Piano::new(
            bank,
            device.clone(),
            Arc::new(Keyboard::full()),
            Duration::from_millis(200),
        );
        (Arc::new(piano), device)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_handle_event() {
        let (piano, device) = piano(&["C2", "E2"]);
        let mapping = KeyMapping::default();

        let click = Event::Click {
            note: "C2".to_string(),
        };
        assert!(matches!(
            handle_event(&piano, &mapping, &click),
            Some(Playback::Started { .. })
        ));
        assert!(matches!(
            handle_event(&piano, &mapping, &Event::KeyDown(KeyPress::new("c"))),
            Some(Playback::Started { .. })
        ));
        assert_eq!(
            None,
            handle_event(
                &piano,
                &mapping,
                &Event::KeyDown(KeyPress::new("c").repeated())
            )
        );
        assert_eq!(
            None,
            handle_event(&piano, &mapping, &Event::KeyDown(KeyPress::new("p")))
        );
        // Mapped, but no sample.
        assert_eq!(
            Some(Playback::Unavailable),
            handle_event(&piano, &mapping, &Event::KeyDown(KeyPress::new("q")))
        );
        assert_eq!(None, handle_event(&piano, &mapping, &Event::Quit));

        assert_eq!(2, device.played().len());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_controller() -> Result<(), Box<dyn Error>> {
        let (piano, device) = piano(&["C2", "C3"]);
        let driver = Arc::new(TestDriver {
            events: vec![
                Event::KeyDown(KeyPress::new("z")),
                Event::Click {
                    note: "C3".to_string(),
                },
                Event::KeyDown(KeyPress::new("z").repeated()),
                Event::Click {
                    note: "C#2".to_string(),
                },
                Event::Quit,
                Event::KeyDown(KeyPress::new("q")),
            ],
        });

        let mut controller =
            Controller::new(piano.clone(), Arc::new(KeyMapping::default()), driver);
        controller.join().await?;

        // The repeat, the missing sample and everything after quitting play nothing.
        assert_eq!(2, device.played().len());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_controller_with_script() -> Result<(), Box<dyn Error>> {
        let (piano, device) = piano(&["C4", "D2"]);
        let script = "key 1\nkey x\nkey x KeyX repeat\nclick D2\n";
        let driver = Arc::new(script::Driver::new(Cursor::new(script.as_bytes().to_vec())));

        let mut controller =
            Controller::new(piano.clone(), Arc::new(KeyMapping::default()), driver);
        // End of input quits.
        controller.join().await?;

        assert_eq!(3, device.played().len());
        Ok(())
    }
}
