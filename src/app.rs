//! Event loop driving a [`Session`] to completion.

use crate::completion::CommandCompleter;
use crate::event::{Event, EventHandler};
use crate::session::{Action, GenerationRequest, Session};
use crate::ui::Renderer;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Runs the session until the user quits or accepts a command.
///
/// All session mutation happens here, one event at a time. The generation
/// request runs on its own task and reports back through the event channel.
pub async fn run<R: Renderer>(
    mut session: Session,
    completer: Arc<dyn CommandCompleter>,
    events: &mut EventHandler,
    renderer: &mut R,
) -> Result<Session> {
    debug!("Session started with {} bytes of context", session.context().len());
    renderer.draw(&session.view())?;

    while let Some(event) = events.next().await {
        match session.update(event) {
            Action::None => {}
            Action::Generate(request) => spawn_generation(completer.clone(), request, events.sender()),
            Action::Quit => break,
        }
        renderer.draw(&session.view())?;
    }

    debug!("Session ended in phase {:?}", session.phase());
    Ok(session)
}

fn spawn_generation(
    completer: Arc<dyn CommandCompleter>,
    request: GenerationRequest,
    sender: UnboundedSender<Event>,
) {
    tokio::spawn(async move {
        let outcome = completer
            .request_command(&request.system_prompt, &request.user_prompt)
            .await;
        if sender.send(Event::Generated(outcome)).is_err() {
            warn!("Session ended before the generation outcome arrived");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::CompletionError;
    use crate::event::Key;
    use crate::session::{Phase, View};
    use async_trait::async_trait;

    struct FixedCompleter(&'static str);

    #[async_trait]
    impl CommandCompleter for FixedCompleter {
        async fn request_command(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
            Ok(self.0.to_string())
        }
    }

    /// Records rendered views as plain text.
    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<String>,
    }

    impl Renderer for RecordingRenderer {
        fn draw(&mut self, view: &View<'_>) -> Result<()> {
            self.frames.push(view.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_quit_before_submitting() {
        let mut events = EventHandler::new();
        let sender = events.sender();
        for c in "ls".chars() {
            sender.send(Event::Key(Key::Char(c))).unwrap();
        }
        sender.send(Event::Key(Key::Esc)).unwrap();

        let mut renderer = RecordingRenderer::default();
        let session = run(
            Session::new(String::new()),
            Arc::new(FixedCompleter("ls")),
            &mut events,
            &mut renderer,
        )
        .await
        .unwrap();

        assert_eq!(session.phase(), Phase::Editing);
        assert!(!session.accepted());
        assert_eq!(
            renderer.frames,
            vec![
                "What command do you need? _",
                "What command do you need? l_",
                "What command do you need? ls_",
            ]
        );
    }

    #[tokio::test]
    async fn test_generation_outcome_reaches_session() {
        let mut events = EventHandler::new();
        let sender = events.sender();
        sender.send(Event::Key(Key::Char('x'))).unwrap();
        sender.send(Event::Key(Key::Enter)).unwrap();

        // Renderer that quits as soon as the result is shown
        struct QuitOnResult {
            sender: UnboundedSender<Event>,
        }
        impl Renderer for QuitOnResult {
            fn draw(&mut self, view: &View<'_>) -> Result<()> {
                if matches!(view, View::Generated(_)) {
                    self.sender.send(Event::Key(Key::Esc)).ok();
                }
                Ok(())
            }
        }

        let mut renderer = QuitOnResult { sender };
        let session = run(
            Session::new(String::new()),
            Arc::new(FixedCompleter("echo hi")),
            &mut events,
            &mut renderer,
        )
        .await
        .unwrap();

        assert_eq!(session.phase(), Phase::Result);
        assert_eq!(session.generated_command(), Some("echo hi"));
        assert!(!session.accepted());
    }
}
