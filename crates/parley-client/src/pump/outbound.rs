//! Outbound pump.

use std::sync::Arc;

use parley_proto::{Codec, OutboundMessage};
use tokio_util::sync::CancellationToken;

use super::PumpExit;
use crate::{
    command::{LineCommand, parse_line},
    context::ReconnectIntent,
    error::SessionError,
    presenter::{LineSource, MenuChoice, Presenter, Status},
    session::{SessionState, SessionWriter},
    transport::FrameSink,
};

/// Read typed lines and send them until the user exits, the session stops
/// accepting sends or `cancel` fires.
///
/// Closed input parks the pump on `cancel` instead of spinning; inbound
/// traffic keeps flowing until the peer closes or the process terminates.
pub async fn send_loop<S, P, L>(
    writer: SessionWriter<S>,
    codec: Arc<Codec>,
    presenter: Arc<P>,
    lines: Arc<L>,
    intent: ReconnectIntent,
    cancel: CancellationToken,
) -> PumpExit
where
    S: FrameSink,
    P: Presenter,
    L: LineSource,
{
    loop {
        let line = tokio::select! {
            biased;
            () = cancel.cancelled() => return cancelled(presenter.as_ref(), &intent),
            line = lines.next_line() => line,
        };

        // Termination may land while we were blocked on input
        if !intent.get() {
            presenter.report_status(Status::Exiting);
            return PumpExit::Cancelled;
        }

        let Some(line) = line else {
            tracing::debug!("input closed, outbound pump idle");
            cancel.cancelled().await;
            return cancelled(presenter.as_ref(), &intent);
        };

        let message = match parse_line(&line) {
            LineCommand::Skip => continue,
            LineCommand::Exit => {
                intent.clear();
                return PumpExit::ExitRequested;
            },
            LineCommand::ShowMenu => {
                let choice = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return cancelled(presenter.as_ref(), &intent),
                    choice = presenter.show_menu() => choice,
                };
                match choice {
                    MenuChoice::Connect => {
                        presenter.report_status(Status::AlreadyConnected);
                        continue;
                    },
                    MenuChoice::ViewUsers => OutboundMessage::ListUsers,
                    MenuChoice::Exit => {
                        intent.clear();
                        return PumpExit::ExitRequested;
                    },
                }
            },
            LineCommand::Send(text) => OutboundMessage::Chat(text),
        };

        let payload = match codec.encode(&message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode outbound message");
                presenter.report_error(&format!("Could not send message: {e}"));
                continue;
            },
        };

        // A peer that stopped reading can stall the write indefinitely
        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return cancelled(presenter.as_ref(), &intent),
            sent = writer.send_text(payload) => sent,
        };

        match sent {
            Ok(()) => {},
            Err(SessionError::NotOpen(state)) => {
                tracing::debug!(?state, "session stopped accepting sends");
                return if state == SessionState::Aborted {
                    PumpExit::Aborted
                } else {
                    PumpExit::CloseReceived
                };
            },
            Err(e) => {
                tracing::warn!(error = %e, "send failed");
                return PumpExit::Aborted;
            },
        }
    }
}

fn cancelled<P: Presenter>(presenter: &P, intent: &ReconnectIntent) -> PumpExit {
    // Cancelled by the controller after the peer closed: nothing to announce
    if !intent.get() {
        presenter.report_status(Status::Exiting);
    }
    PumpExit::Cancelled
}
