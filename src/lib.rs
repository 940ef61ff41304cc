//! Conjure - turn a plain-language request into a single shell command.
//!
//! The user types what they want at a one-line prompt. The request, together
//! with a snapshot of the local shell environment, is sent to a
//! chat-completion endpoint, and the returned command is shown for the user
//! to accept or reject. An accepted command is written to stdout or to a
//! file; it is never executed.
//!
//! # Architecture
//!
//! - [`context`] - Best-effort snapshot of the local environment
//! - [`prompt`] - System instruction and request body
//! - [`http_client`] - HTTP client abstraction
//! - [`completion`] - Completion client and its error taxonomy
//! - [`session`] - The interactive state machine and its view
//! - [`event`] - Key and completion events, and their channel
//! - [`ui`] - Terminal rendering
//! - [`app`] - Event loop tying the session to the completion client
//! - [`output`] - Emission of the accepted command
//! - [`config`] - Configuration sources (packaged, file, environment)
//! - [`providers`] - Shared dependency injection traits
//!
//! # Example
//!
//! ```ignore
//! use conjure::{app, completion::CompletionClient, config::Config};
//! use conjure::{context::gather_context, event::EventHandler, session::Session};
//! use conjure::ui::TerminalUi;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let mut events = EventHandler::new();
//!     events.spawn_terminal_reader();
//!
//!     let session = app::run(
//!         Session::new(gather_context()),
//!         Arc::new(CompletionClient::new(&config)),
//!         &mut events,
//!         &mut TerminalUi::new(std::io::stderr()),
//!     )
//!     .await?;
//!
//!     if let Some(command) = session.into_accepted_command() {
//!         print!("{}", command);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Known limitations
//!
//! The completion request has no timeout beyond the HTTP client's defaults
//! and is never retried. After an error the only way forward is to quit and
//! run again.

pub mod app;
pub mod completion;
pub mod config;
pub mod context;
pub mod event;
pub mod http_client;
pub mod output;
pub mod prompt;
pub mod providers;
pub mod session;
pub mod ui;
