//! Connection controller.
//!
//! Owns the session lifecycle across reconnects:
//!
//! ```text
//!            ┌──────────────────────────────────────────────────────────┐
//!            ↓                                                          │
//! ┌─────────────────────┐ ok  ┌──────────────────┐ first pump ends ┌──────────┐
//! │ new Session/connect │────>│ race both pumps  │────────────────>│  close   │
//! └─────────────────────┘     └──────────────────┘                 └──────────┘
//!            │ error                                                    │ Aborted
//!            ↓                                                          ↓
//!    ┌───────────────┐                                         ┌───────────────┐
//!    │ report, maybe │                                         │ report lost,  │
//!    │ prompt        │                                         │ prompt        │
//!    └───────────────┘                                         └───────────────┘
//! ```
//!
//! The loop runs while the reconnect intent holds and the process is not
//! terminating. A fresh [`Session`] is built for every attempt and the old
//! one is dropped before the next is created.

use std::sync::Arc;

use parley_proto::Codec;
use tokio::{
    task::JoinHandle,
    time::{Instant, interval_at, sleep_until},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::{ClientConfig, Endpoint, FailurePolicy},
    context::SessionContext,
    error::ClientError,
    presenter::{LineSource, Presenter, Status},
    pump::{self, PumpExit},
    session::{Session, SessionReader, SessionState},
    transport::Connector,
};

/// Reason carried in the close frame we send.
pub const CLOSE_REASON: &str = "Application exiting";

/// How the connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// User typed `exit` or chose Exit while connected.
    UserExit,
    /// User declined to reconnect.
    Declined,
    /// Termination was requested.
    Shutdown,
}

/// Why a connect attempt produced no session.
enum AttemptError {
    Shutdown,
    Failed(ClientError),
}

/// Drives connect, duplex exchange and reconnect decisions.
pub struct ConnectionController<C, P, L> {
    connector: C,
    presenter: Arc<P>,
    lines: Arc<L>,
    ctx: SessionContext,
    config: ClientConfig,
    codec: Arc<Codec>,
    endpoint: Endpoint,
    attempts: u64,
}

impl<C, P, L> ConnectionController<C, P, L>
where
    C: Connector,
    P: Presenter,
    L: LineSource,
{
    /// Create a controller for one identity.
    pub fn new(
        connector: C,
        presenter: Arc<P>,
        lines: Arc<L>,
        ctx: SessionContext,
        config: ClientConfig,
    ) -> Self {
        let endpoint = Endpoint::for_identity(&config.server_url, ctx.identity());
        let codec = Arc::new(Codec::new(config.wire_format, ctx.identity().as_str()));
        Self { connector, presenter, lines, ctx, config, codec, endpoint, attempts: 0 }
    }

    /// Endpoint every attempt connects to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Number of connect attempts so far.
    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    /// Run until the user exits, declines to reconnect or termination is
    /// requested.
    pub async fn run_connection_loop(&mut self) -> LoopOutcome {
        let mut user_exit = false;

        while self.ctx.intent().get() && !self.ctx.lifecycle().is_terminating() {
            self.attempts += 1;
            let mut session = Session::<C>::new(self.attempts);

            match self.open(&mut session).await {
                Ok(reader) => {
                    let exit = self.exchange(&session, reader).await;
                    user_exit |= exit == PumpExit::ExitRequested;

                    if session.state() == SessionState::Aborted && exit != PumpExit::ExitRequested {
                        self.presenter.report_status(Status::ConnectionLost);
                        self.ask_reconnect().await;
                    }
                },
                Err(AttemptError::Shutdown) => break,
                Err(AttemptError::Failed(err)) => self.handle_failure(&err).await,
            }
        }

        let outcome = if self.ctx.lifecycle().is_terminating() {
            LoopOutcome::Shutdown
        } else if user_exit {
            LoopOutcome::UserExit
        } else {
            LoopOutcome::Declined
        };
        tracing::info!(?outcome, attempts = self.attempts, "connection loop finished");
        outcome
    }

    /// Connect with progress ticks, an optional timeout and shutdown.
    async fn open(
        &self,
        session: &mut Session<C>,
    ) -> Result<SessionReader<C::Stream>, AttemptError> {
        self.presenter.report_status(Status::Connecting);

        let shutdown = self.ctx.lifecycle().shutdown_token().clone();
        let tick = self.config.connect_tick;
        let mut ticks = interval_at(Instant::now() + tick, tick);
        let timeout = self.config.connect_timeout;
        let deadline = async move {
            match timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        let connect = session.connect(&self.connector, &self.endpoint);
        tokio::pin!(deadline, connect);

        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => return Err(AttemptError::Shutdown),
                result = &mut connect => {
                    return match result {
                        Ok(reader) => {
                            self.presenter.report_status(Status::Connected);
                            Ok(reader)
                        },
                        Err(e) => Err(AttemptError::Failed(e.into())),
                    };
                },
                () = &mut deadline => {
                    let limit = timeout.unwrap_or_default();
                    return Err(AttemptError::Failed(ClientError::ConnectFailure(format!(
                        "timed out after {}s",
                        limit.as_secs()
                    ))));
                },
                _ = ticks.tick() => self.presenter.report_status(Status::ConnectProgress),
            }
        }
    }

    /// Run both pumps against the open session until the first one ends,
    /// then stop the other and close the session.
    async fn exchange(&self, session: &Session<C>, reader: SessionReader<C::Stream>) -> PumpExit {
        let token = self.ctx.lifecycle().shutdown_token().child_token();

        let mut inbound = tokio::spawn(pump::receive_loop(
            reader,
            Arc::clone(&self.codec),
            Arc::clone(&self.presenter),
            self.config.receive_buffer_size,
            token.clone(),
        ));
        let mut outbound = tokio::spawn(pump::send_loop(
            session.writer(),
            Arc::clone(&self.codec),
            Arc::clone(&self.presenter),
            Arc::clone(&self.lines),
            self.ctx.intent().clone(),
            token.clone(),
        ));

        tokio::select! {
            result = &mut inbound => {
                let exit = joined(result, "inbound");
                tracing::debug!(?exit, "inbound pump finished first");
                let deadline = Instant::now() + self.config.close_grace;
                token.cancel();
                match tokio::time::timeout_at(deadline, &mut outbound).await {
                    Ok(result) => {
                        joined(result, "outbound");
                    },
                    Err(_) => {
                        tracing::warn!("outbound pump did not stop within grace period");
                        outbound.abort();
                    },
                }
                // Answers a peer close; no-op once aborted
                self.close_within(session, deadline).await;
                exit
            },
            result = &mut outbound => {
                let exit = joined(result, "outbound");
                tracing::debug!(?exit, "outbound pump finished first");
                self.close_with_grace(session, &mut inbound, &token).await;
                exit
            },
        }
    }

    /// Scoped close, then give the inbound pump up to `close_grace` to see
    /// the peer's acknowledgement before cancelling it.
    async fn close_with_grace(
        &self,
        session: &Session<C>,
        inbound: &mut JoinHandle<PumpExit>,
        token: &CancellationToken,
    ) {
        let deadline = Instant::now() + self.config.close_grace;

        if self.close_within(session, deadline).await {
            self.presenter.report_status(Status::Closing);
            let tick = self.config.connect_tick;
            let mut ticks = interval_at(Instant::now() + tick, tick);
            loop {
                tokio::select! {
                    biased;
                    result = &mut *inbound => {
                        joined(result, "inbound");
                        return;
                    },
                    () = sleep_until(deadline) => {
                        tracing::debug!("close grace elapsed");
                        break;
                    },
                    _ = ticks.tick() => self.presenter.report_status(Status::ClosingProgress),
                }
            }
        }

        token.cancel();
        joined(inbound.await, "inbound");
    }

    /// Scoped close bounded by `deadline`. Returns whether the close frame
    /// was written.
    async fn close_within(&self, session: &Session<C>, deadline: Instant) -> bool {
        match tokio::time::timeout_at(deadline, session.close(CLOSE_REASON)).await {
            Ok(Ok(sent)) => sent,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "close failed");
                false
            },
            Err(_) => {
                tracing::warn!(
                    attempt = self.attempts,
                    "close frame not written within grace period"
                );
                false
            },
        }
    }

    async fn handle_failure(&self, err: &ClientError) {
        tracing::warn!(error = %err, attempt = self.attempts, "connect attempt failed");
        self.presenter.report_error(&err.to_string());

        if err.is_recoverable() || self.config.on_unexpected_failure == FailurePolicy::Prompt {
            self.ask_reconnect().await;
            return;
        }

        // Retry without asking, one tick apart
        let shutdown = self.ctx.lifecycle().shutdown_token();
        tokio::select! {
            () = shutdown.cancelled() => {},
            () = tokio::time::sleep(self.config.connect_tick) => {},
        }
    }

    async fn ask_reconnect(&self) {
        let shutdown = self.ctx.lifecycle().shutdown_token();
        let answer = tokio::select! {
            biased;
            () = shutdown.cancelled() => return,
            answer = self.presenter.prompt_reconnect() => answer,
        };

        if self.ctx.lifecycle().is_terminating() {
            return;
        }
        tracing::debug!(reconnect = answer, "reconnect prompt answered");
        self.ctx.intent().set(answer);
    }
}

impl<C, P, L> std::fmt::Debug for ConnectionController<C, P, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionController")
            .field("endpoint", &self.endpoint)
            .field("attempts", &self.attempts)
            .finish_non_exhaustive()
    }
}

/// Unwrap a pump result. A panicked pump counts as an aborted connection.
fn joined(result: Result<PumpExit, tokio::task::JoinError>, pump: &'static str) -> PumpExit {
    result.unwrap_or_else(|e| {
        tracing::warn!(pump, error = %e, "pump task failed");
        PumpExit::Aborted
    })
}
