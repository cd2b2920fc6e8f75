//! Scripted presentation.
//!
//! [`ScriptedPresenter`] answers menu, username and reconnect prompts from
//! queues filled by the test, and records every call as a
//! [`PresenterEvent`]. An exhausted script answers Exit, closed input and
//! "no" so a test never hangs on a prompt, unless the test asks for a held
//! reconnect prompt to exercise cancellation.
//!
//! Events are published over a `watch` channel: tests wait for a condition
//! with [`ScriptedPresenter::wait_for`] instead of sleeping.

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use parley_client::{LineSource, MenuChoice, Presenter, Status};
use parley_proto::ChatMessage;
use tokio::sync::{mpsc, watch};

/// One recorded presenter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    /// Main menu shown; carries the scripted answer.
    Menu(MenuChoice),
    /// Username asked.
    UsernamePrompt,
    /// Reconnect asked; carries the scripted answer.
    ReconnectPrompt(bool),
    /// Reconnect asked and left unanswered.
    ReconnectHeld,
    /// Error line shown.
    Error(String),
    /// Status notice shown.
    Status(Status),
    /// Classified message rendered.
    Message(ChatMessage),
    /// User list rendered.
    UserList(Vec<String>),
}

#[derive(Default)]
struct Script {
    menu: VecDeque<MenuChoice>,
    usernames: VecDeque<String>,
    reconnect: VecDeque<bool>,
    hold_reconnect: bool,
}

/// Presenter driven by queued answers.
pub struct ScriptedPresenter {
    script: Mutex<Script>,
    events: watch::Sender<Vec<PresenterEvent>>,
}

impl Default for ScriptedPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedPresenter {
    /// Create a presenter with an empty script.
    pub fn new() -> Self {
        let (events, _rx) = watch::channel(Vec::new());
        Self { script: Mutex::new(Script::default()), events }
    }

    /// Queue main menu answers.
    #[must_use]
    pub fn with_menu(self, choices: impl IntoIterator<Item = MenuChoice>) -> Self {
        self.lock().menu.extend(choices);
        self
    }

    /// Queue username answers.
    #[must_use]
    pub fn with_usernames<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        self.lock().usernames.extend(names.into_iter().map(Into::into));
        self
    }

    /// Queue reconnect answers.
    #[must_use]
    pub fn with_reconnect(self, answers: impl IntoIterator<Item = bool>) -> Self {
        self.lock().reconnect.extend(answers);
        self
    }

    /// Leave reconnect prompts unanswered once the queued answers run out.
    #[must_use]
    pub fn with_held_reconnect(self) -> Self {
        self.lock().hold_reconnect = true;
        self
    }

    /// Snapshot of every recorded call, in order.
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.borrow().clone()
    }

    /// Count recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&PresenterEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|e| pred(e)).count()
    }

    /// Wait until the recorded calls satisfy `pred`.
    pub async fn wait_for(&self, pred: impl Fn(&[PresenterEvent]) -> bool) {
        let mut rx = self.events.subscribe();
        // Sender lives as long as self
        let _ = rx.wait_for(|events| pred(events)).await;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: PresenterEvent) {
        tracing::trace!(?event, "presenter");
        self.events.send_modify(|events| events.push(event));
    }
}

impl std::fmt::Debug for ScriptedPresenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedPresenter").field("events", &self.events.borrow().len()).finish()
    }
}

impl Presenter for ScriptedPresenter {
    async fn show_menu(&self) -> MenuChoice {
        let choice = self.lock().menu.pop_front().unwrap_or(MenuChoice::Exit);
        self.record(PresenterEvent::Menu(choice));
        choice
    }

    async fn prompt_username(&self) -> Option<String> {
        let name = self.lock().usernames.pop_front();
        self.record(PresenterEvent::UsernamePrompt);
        name
    }

    async fn prompt_reconnect(&self) -> bool {
        let (answer, held) = {
            let mut script = self.lock();
            (script.reconnect.pop_front(), script.hold_reconnect)
        };
        match answer {
            Some(answer) => {
                self.record(PresenterEvent::ReconnectPrompt(answer));
                answer
            },
            None if held => {
                self.record(PresenterEvent::ReconnectHeld);
                std::future::pending().await
            },
            None => {
                self.record(PresenterEvent::ReconnectPrompt(false));
                false
            },
        }
    }

    fn report_error(&self, text: &str) {
        self.record(PresenterEvent::Error(text.to_owned()));
    }

    fn report_status(&self, status: Status) {
        self.record(PresenterEvent::Status(status));
    }

    fn render_message(&self, message: &ChatMessage) {
        self.record(PresenterEvent::Message(message.clone()));
    }

    fn render_user_list(&self, names: &[String]) {
        self.record(PresenterEvent::UserList(names.to_vec()));
    }
}

/// Typed lines fed by the test. Blocks until a line arrives; dropping the
/// [`LineFeeder`] closes input.
#[derive(Debug)]
pub struct ScriptedLines {
    rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

/// Test side of [`ScriptedLines`].
#[derive(Debug, Clone)]
pub struct LineFeeder {
    tx: mpsc::UnboundedSender<String>,
}

impl ScriptedLines {
    /// Create an empty line source and its feeder.
    pub fn channel() -> (Self, LineFeeder) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx: tokio::sync::Mutex::new(rx) }, LineFeeder { tx })
    }
}

impl LineSource for ScriptedLines {
    async fn next_line(&self) -> Option<String> {
        self.rx.lock().await.recv().await
    }
}

impl LineFeeder {
    /// Type one line.
    pub fn type_line(&self, line: impl Into<String>) {
        let _ = self.tx.send(line.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exhausted_script_answers_safely() {
        let presenter = ScriptedPresenter::new().with_menu([MenuChoice::Connect]);

        assert_eq!(presenter.show_menu().await, MenuChoice::Connect);
        assert_eq!(presenter.show_menu().await, MenuChoice::Exit);
        assert_eq!(presenter.prompt_username().await, None);
        assert!(!presenter.prompt_reconnect().await);
        assert_eq!(presenter.events().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn held_reconnect_waits_after_queued_answers() {
        let presenter = ScriptedPresenter::new().with_reconnect([true]).with_held_reconnect();

        assert!(presenter.prompt_reconnect().await);
        let held =
            tokio::time::timeout(std::time::Duration::from_secs(60), presenter.prompt_reconnect())
                .await;

        assert!(held.is_err());
        assert_eq!(presenter.events(), vec![
            PresenterEvent::ReconnectPrompt(true),
            PresenterEvent::ReconnectHeld,
        ]);
    }

    #[tokio::test]
    async fn lines_close_when_feeder_dropped() {
        let (lines, feeder) = ScriptedLines::channel();
        feeder.type_line("hello");
        drop(feeder);

        assert_eq!(lines.next_line().await.as_deref(), Some("hello"));
        assert_eq!(lines.next_line().await, None);
    }
}
