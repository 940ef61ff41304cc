//! Events consumed by the session and the channel that carries them.
//!
//! Key presses and the completion outcome share a single unbounded channel,
//! so the event loop handles exactly one event at a time.

use crate::completion::CompletionError;
use crossterm::event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

/// How long the terminal reader waits for input before checking whether
/// the event loop is still listening.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Terminal-independent key signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Ctrl+C.
    Interrupt,
    Esc,
    Enter,
    Backspace,
    /// A printable character.
    Char(char),
    /// Anything else (arrows, function keys, modified chars).
    Other,
}

impl Key {
    /// Interrupt, escape and `q` end the session in every phase.
    pub fn is_quit(self) -> bool {
        matches!(self, Key::Interrupt | Key::Esc | Key::Char('q'))
    }
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        let modified = event
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);

        match event.code {
            KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => Key::Interrupt,
            KeyCode::Char(c) if !modified && !c.is_control() => Key::Char(c),
            KeyCode::Esc => Key::Esc,
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            _ => Key::Other,
        }
    }
}

/// A discrete input to the session.
#[derive(Debug)]
pub enum Event {
    Key(Key),
    /// Outcome of the generation request, delivered exactly once.
    Generated(Result<String, CompletionError>),
}

/// Owns the event channel.
pub struct EventHandler {
    sender: UnboundedSender<Event>,
    receiver: UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// Returns a sender for producers (the terminal reader, generation tasks).
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.sender.clone()
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Starts a thread forwarding terminal key presses into the channel.
    ///
    /// The thread exits on its own once the handler has been dropped.
    pub fn spawn_terminal_reader(&self) -> thread::JoinHandle<()> {
        let sender = self.sender();
        thread::spawn(move || read_terminal_keys(sender))
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn read_terminal_keys(sender: UnboundedSender<Event>) {
    while !sender.is_closed() {
        match event::poll(POLL_INTERVAL) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!("Terminal poll failed: {}", e);
                break;
            }
        }

        match event::read() {
            Ok(event::Event::Key(key)) if key.kind != KeyEventKind::Release => {
                if sender.send(Event::Key(Key::from(key))).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Terminal read failed: {}", e);
                break;
            }
        }
    }
    debug!("Terminal reader stopped");
}
