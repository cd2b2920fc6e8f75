//! Main menu flow.

use std::sync::Arc;

use crate::{
    config::ClientConfig,
    context::{Identity, Lifecycle, SessionContext},
    controller::{ConnectionController, LoopOutcome},
    presenter::{LineSource, MenuChoice, Presenter},
    transport::Connector,
};

/// Interactive chat client: main menu, username prompt, then the
/// connection loop.
pub struct ChatClient<C, P, L> {
    connector: C,
    presenter: Arc<P>,
    lines: Arc<L>,
    lifecycle: Lifecycle,
    config: ClientConfig,
}

impl<C, P, L> ChatClient<C, P, L>
where
    C: Connector,
    P: Presenter,
    L: LineSource,
{
    /// Create a client. `lifecycle` is shared with the termination handler.
    pub fn new(
        connector: C,
        presenter: Arc<P>,
        lines: Arc<L>,
        lifecycle: Lifecycle,
        config: ClientConfig,
    ) -> Self {
        Self { connector, presenter, lines, lifecycle, config }
    }

    /// Run the main menu until the user exits or the connection loop ends.
    ///
    /// Returns the connection loop outcome, or `None` if the client ended
    /// without ever connecting.
    pub async fn run(self) -> Option<LoopOutcome> {
        let shutdown = self.lifecycle.shutdown_token().clone();

        loop {
            let choice = tokio::select! {
                biased;
                () = shutdown.cancelled() => return None,
                choice = self.presenter.show_menu() => choice,
            };

            match choice {
                MenuChoice::Connect => {
                    let identity = self.prompt_identity().await?;
                    tracing::info!(%identity, "identity set");

                    let ctx = SessionContext::new(identity, self.lifecycle.clone());
                    let mut controller = ConnectionController::new(
                        self.connector,
                        self.presenter,
                        self.lines,
                        ctx,
                        self.config,
                    );
                    return Some(controller.run_connection_loop().await);
                },
                MenuChoice::ViewUsers => self.presenter.report_error("Please connect first."),
                MenuChoice::Exit => return None,
            }
        }
    }

    /// Ask until a non-blank username arrives. `None` on closed input or
    /// shutdown.
    async fn prompt_identity(&self) -> Option<Identity> {
        let shutdown = self.lifecycle.shutdown_token();
        loop {
            let name = tokio::select! {
                biased;
                () = shutdown.cancelled() => return None,
                name = self.presenter.prompt_username() => name?,
            };

            match Identity::new(&name) {
                Some(identity) => return Some(identity),
                None => self.presenter.report_error("Username cannot be empty. Please try again."),
            }
        }
    }
}

impl<C, P, L> std::fmt::Debug for ChatClient<C, P, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient").field("config", &self.config).finish_non_exhaustive()
    }
}
