//! Interactive session state machine.
//!
//! A [`Session`] moves through `Editing -> Generating -> (Result | Error)`.
//! It never performs I/O itself: [`Session::update`] consumes one [`Event`]
//! and returns an [`Action`] for the event loop to carry out, and
//! [`Session::view`] describes what should be on screen.

use crate::completion::CompletionError;
use crate::event::{Event, Key};
use crate::prompt::{build_user_prompt, SYSTEM_PROMPT};
use std::fmt;
use tracing::{debug, info, warn};

pub const PROMPT_LABEL: &str = "What command do you need? ";
pub const CURSOR_MARKER: &str = "_";
pub const LOADING_TEXT: &str = "🔄 Generating command...";
pub const RESULT_LABEL: &str = "Generated: ";
pub const RESULT_HINT: &str = "Press Enter to use, ESC to cancel";
pub const ERROR_LABEL: &str = "Error: ";
pub const ERROR_HINT: &str = "Press ESC to exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Generating,
    Result,
    Error,
}

/// Prompt pair handed to the completion client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

/// What the event loop must do after an update.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    None,
    /// Start the one and only generation attempt.
    Generate(GenerationRequest),
    /// End the session.
    Quit,
}

/// Display description of the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View<'a> {
    Prompt { input: &'a str, show_cursor: bool },
    Loading,
    Generated(&'a str),
    Failed(&'a str),
}

impl fmt::Display for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Prompt { input, show_cursor } => {
                write!(f, "{}{}", PROMPT_LABEL, input)?;
                if *show_cursor {
                    f.write_str(CURSOR_MARKER)?;
                }
                Ok(())
            }
            View::Loading => writeln!(f, "{}", LOADING_TEXT),
            View::Generated(command) => write!(f, "{}{}\n{}", RESULT_LABEL, command, RESULT_HINT),
            View::Failed(message) => write!(f, "{}{}\n{}", ERROR_LABEL, message, ERROR_HINT),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    input: String,
    /// Offset in characters; always equals the input length.
    cursor: usize,
    context: String,
    phase: Phase,
    generated_command: Option<String>,
    error_message: Option<String>,
    accepted: bool,
}

impl Session {
    /// Creates a session in the `Editing` phase around a fixed context snapshot.
    pub fn new(context: String) -> Self {
        Self {
            input: String::new(),
            cursor: 0,
            context,
            phase: Phase::Editing,
            generated_command: None,
            error_message: None,
            accepted: false,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generated_command(&self) -> Option<&str> {
        self.generated_command.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Consumes the session and returns the command the user accepted, if any.
    pub fn into_accepted_command(self) -> Option<String> {
        match (self.accepted, self.phase) {
            (true, Phase::Result) => self.generated_command,
            _ => None,
        }
    }

    /// Applies one event and reports what the event loop must do next.
    pub fn update(&mut self, event: Event) -> Action {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Generated(outcome) => {
                self.complete(outcome);
                Action::None
            }
        }
    }

    fn handle_key(&mut self, key: Key) -> Action {
        if key.is_quit() {
            debug!("Quit requested in phase {:?}", self.phase);
            return Action::Quit;
        }

        match (self.phase, key) {
            (Phase::Result, Key::Enter) => {
                info!("Command accepted");
                self.accepted = true;
                Action::Quit
            }
            (Phase::Editing, Key::Enter) => self.submit(),
            (Phase::Editing, Key::Backspace) => {
                self.input.pop();
                self.cursor = self.input.chars().count();
                Action::None
            }
            (Phase::Editing, Key::Char(c)) => {
                self.input.push(c);
                self.cursor = self.input.chars().count();
                Action::None
            }
            _ => Action::None,
        }
    }

    fn submit(&mut self) -> Action {
        if self.input.is_empty() {
            return Action::None;
        }

        info!("Submitting request: {}", self.input);
        self.phase = Phase::Generating;
        Action::Generate(GenerationRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: build_user_prompt(&self.context, &self.input),
        })
    }

    fn complete(&mut self, outcome: Result<String, CompletionError>) {
        if self.phase != Phase::Generating {
            warn!("Dropping completion outcome received in phase {:?}", self.phase);
            return;
        }

        match outcome {
            Ok(command) => {
                info!("Generation finished");
                self.generated_command = Some(command);
                self.phase = Phase::Result;
            }
            Err(e) => {
                if e.is_configuration() {
                    warn!("Generation not attempted, configuration incomplete: {}", e);
                } else {
                    warn!("Generation failed: {}", e);
                }
                self.error_message = Some(e.to_string());
                self.phase = Phase::Error;
            }
        }
    }

    /// Describes the screen for the current phase.
    pub fn view(&self) -> View<'_> {
        match self.phase {
            Phase::Editing => View::Prompt {
                input: &self.input,
                show_cursor: self.cursor == self.input.chars().count(),
            },
            Phase::Generating => View::Loading,
            Phase::Result => View::Generated(self.generated_command.as_deref().unwrap_or_default()),
            Phase::Error => View::Failed(self.error_message.as_deref().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(session: &mut Session, text: &str) {
        for c in text.chars() {
            assert_eq!(session.update(Event::Key(Key::Char(c))), Action::None);
        }
    }

    fn generating(input: &str) -> Session {
        let mut session = Session::new("PWD: /tmp\n".to_string());
        type_text(&mut session, input);
        assert!(matches!(session.update(Event::Key(Key::Enter)), Action::Generate(_)));
        session
    }

    // =========================================================================
    // Editing
    // =========================================================================

    #[test]
    fn test_new_session_is_editing_and_empty() {
        let session = Session::new("ctx".to_string());
        assert_eq!(session.phase(), Phase::Editing);
        assert_eq!(session.input(), "");
        assert_eq!(session.cursor(), 0);
        assert_eq!(session.context(), "ctx");
        assert!(!session.accepted());
        assert!(session.generated_command().is_none());
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_edit_sequences_match_append_and_pop() {
        // Each script is a sequence of chars where '<' means backspace
        let scripts = ["list", "ab<<<", "<<x", "fi<ind", "é<ü日本<", "a b c<<d", ""];

        for script in scripts {
            let mut session = Session::new(String::new());
            let mut expected = String::new();

            for step in script.chars() {
                if step == '<' {
                    session.update(Event::Key(Key::Backspace));
                    expected.pop();
                } else {
                    session.update(Event::Key(Key::Char(step)));
                    expected.push(step);
                }
                assert_eq!(session.cursor(), session.input().chars().count());
            }

            assert_eq!(session.input(), expected, "script {:?}", script);
            assert_eq!(session.phase(), Phase::Editing);
        }
    }

    #[test]
    fn test_backspace_on_empty_input_is_noop() {
        let mut session = Session::new(String::new());
        assert_eq!(session.update(Event::Key(Key::Backspace)), Action::None);
        assert_eq!(session.input(), "");
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn test_other_keys_do_not_edit() {
        let mut session = Session::new(String::new());
        type_text(&mut session, "ls");
        session.update(Event::Key(Key::Other));
        assert_eq!(session.input(), "ls");
    }

    #[test]
    fn test_q_quits_even_while_editing() {
        let mut session = Session::new(String::new());
        type_text(&mut session, "ls");
        assert_eq!(session.update(Event::Key(Key::Char('q'))), Action::Quit);
        assert_eq!(session.input(), "ls");
        assert!(!session.accepted());
    }

    // =========================================================================
    // Submission
    // =========================================================================

    #[test]
    fn test_empty_submission_keeps_phase() {
        let mut session = Session::new(String::new());
        assert_eq!(session.update(Event::Key(Key::Enter)), Action::None);
        assert_eq!(session.phase(), Phase::Editing);
    }

    #[test]
    fn test_submission_requests_generation_with_context() {
        let mut session = Session::new("PWD: /tmp\n".to_string());
        type_text(&mut session, "list files");

        let action = session.update(Event::Key(Key::Enter));

        assert_eq!(
            action,
            Action::Generate(GenerationRequest {
                system_prompt: SYSTEM_PROMPT.to_string(),
                user_prompt: "PWD: /tmp\n---list files".to_string(),
            })
        );
        assert_eq!(session.phase(), Phase::Generating);
    }

    #[test]
    fn test_keys_ignored_while_generating() {
        let mut session = generating("list files");

        for key in [Key::Char('x'), Key::Backspace, Key::Enter, Key::Other] {
            assert_eq!(session.update(Event::Key(key)), Action::None);
            assert_eq!(session.phase(), Phase::Generating);
            assert_eq!(session.input(), "list files");
        }
    }

    #[test]
    fn test_quit_works_while_generating() {
        let mut session = generating("list files");
        assert_eq!(session.update(Event::Key(Key::Interrupt)), Action::Quit);
        assert!(!session.accepted());
    }

    // =========================================================================
    // Completion outcomes
    // =========================================================================

    #[test]
    fn test_success_moves_to_result() {
        let mut session = generating("list files");

        session.update(Event::Generated(Ok("ls -la".to_string())));

        assert_eq!(session.phase(), Phase::Result);
        assert_eq!(session.generated_command(), Some("ls -la"));
        assert!(session.error_message().is_none());
    }

    #[test]
    fn test_failure_moves_to_error() {
        let mut session = generating("list files");

        session.update(Event::Generated(Err(CompletionError::MissingApiKey)));

        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(
            session.error_message(),
            Some("OPENAI_KEY environment variable is not set")
        );
        assert!(session.generated_command().is_none());
    }

    #[test]
    fn test_outcome_outside_generating_is_ignored() {
        let mut session = Session::new(String::new());
        session.update(Event::Generated(Ok("ls".to_string())));
        assert_eq!(session.phase(), Phase::Editing);
        assert!(session.generated_command().is_none());

        let mut session = generating("x");
        session.update(Event::Generated(Ok("ls".to_string())));
        session.update(Event::Generated(Err(CompletionError::EmptyCommand)));
        assert_eq!(session.phase(), Phase::Result);
        assert!(session.error_message().is_none());
    }

    // =========================================================================
    // Terminal phases
    // =========================================================================

    #[test]
    fn test_enter_in_result_accepts() {
        let mut session = generating("list files");
        session.update(Event::Generated(Ok("ls -la".to_string())));

        assert_eq!(session.update(Event::Key(Key::Enter)), Action::Quit);
        assert!(session.accepted());
        assert_eq!(session.into_accepted_command(), Some("ls -la".to_string()));
    }

    #[test]
    fn test_escape_in_result_does_not_accept() {
        let mut session = generating("list files");
        session.update(Event::Generated(Ok("ls -la".to_string())));

        assert_eq!(session.update(Event::Key(Key::Esc)), Action::Quit);
        assert!(!session.accepted());
        assert_eq!(session.into_accepted_command(), None);
    }

    #[test]
    fn test_result_ignores_editing_keys() {
        let mut session = generating("list files");
        session.update(Event::Generated(Ok("ls -la".to_string())));

        session.update(Event::Key(Key::Char('x')));
        session.update(Event::Key(Key::Backspace));

        assert_eq!(session.input(), "list files");
        assert_eq!(session.phase(), Phase::Result);
    }

    #[test]
    fn test_error_is_terminal() {
        let mut session = generating("list files");
        session.update(Event::Generated(Err(CompletionError::EmptyCommand)));

        assert_eq!(session.update(Event::Key(Key::Char('x'))), Action::None);
        assert_eq!(session.update(Event::Key(Key::Enter)), Action::None);
        assert_eq!(session.phase(), Phase::Error);
        assert!(!session.accepted());
        assert_eq!(session.update(Event::Key(Key::Esc)), Action::Quit);
        assert_eq!(session.into_accepted_command(), None);
    }

    // =========================================================================
    // View
    // =========================================================================

    #[test]
    fn test_view_per_phase() {
        let mut session = Session::new(String::new());
        type_text(&mut session, "df");
        assert_eq!(session.view().to_string(), "What command do you need? df_");

        session.update(Event::Key(Key::Enter));
        assert_eq!(session.view(), View::Loading);
        assert_eq!(session.view().to_string(), "🔄 Generating command...\n");

        session.update(Event::Generated(Ok("df -h".to_string())));
        assert_eq!(
            session.view().to_string(),
            "Generated: df -h\nPress Enter to use, ESC to cancel"
        );
    }

    #[test]
    fn test_error_view() {
        let mut session = generating("x");
        session.update(Event::Generated(Err(CompletionError::Transport("timed out".to_string()))));
        assert_eq!(
            session.view().to_string(),
            "Error: failed to make HTTP request: timed out\nPress ESC to exit"
        );
    }
}
