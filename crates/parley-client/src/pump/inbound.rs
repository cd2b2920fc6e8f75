//! Inbound pump.

use std::sync::Arc;

use parley_proto::{ChatMessage, Codec};
use tokio_util::sync::CancellationToken;

use super::PumpExit;
use crate::{
    presenter::Presenter,
    session::{Received, SessionReader},
    transport::FrameStream,
};

/// Receive, classify and render frames until the peer closes, the
/// connection fails or `cancel` fires.
///
/// Payloads longer than `buffer_size` bytes are delivered as consecutive
/// chunks (split on character boundaries), each classified on its own. There
/// is no reassembly.
pub async fn receive_loop<R, P>(
    mut reader: SessionReader<R>,
    codec: Arc<Codec>,
    presenter: Arc<P>,
    buffer_size: usize,
    cancel: CancellationToken,
) -> PumpExit
where
    R: FrameStream,
    P: Presenter,
{
    loop {
        let received = tokio::select! {
            biased;
            () = cancel.cancelled() => return PumpExit::Cancelled,
            received = reader.recv() => received,
        };

        match received {
            Received::Text(payload) => {
                for chunk in chunks(&payload, buffer_size) {
                    deliver(&codec, presenter.as_ref(), chunk);
                }
            },
            Received::Closed { code, reason } => {
                tracing::info!(code, %reason, "server closed the connection");
                return PumpExit::CloseReceived;
            },
            Received::Lost(reason) => {
                tracing::warn!(%reason, "connection lost");
                return PumpExit::Aborted;
            },
        }
    }
}

fn deliver<P: Presenter>(codec: &Codec, presenter: &P, payload: &str) {
    match codec.decode(payload) {
        Ok(ChatMessage::UserListReply { names }) => presenter.render_user_list(&names),
        Ok(message) => {
            tracing::trace!(kind = message.kind(), "inbound message");
            presenter.render_message(&message);
        },
        Err(e) => {
            tracing::warn!(error = %e, "undecodable frame");
            presenter.report_error(&format!("Unreadable message from server: {e}"));
        },
    }
}

/// Split `payload` into pieces of at most `max` bytes on character
/// boundaries. A single character wider than `max` forms its own piece.
fn chunks(payload: &str, max: usize) -> impl Iterator<Item = &str> {
    let max = max.max(1);
    let mut rest = payload;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let mut end = rest.len().min(max);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        if end == 0 {
            end = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_payload_is_one_chunk() {
        assert_eq!(chunks("hello", 1024).collect::<Vec<_>>(), vec!["hello"]);
        assert_eq!(chunks("", 1024).count(), 0);
    }

    #[test]
    fn long_payload_splits_at_buffer_size() {
        let payload = "a".repeat(2500);
        let sizes: Vec<usize> = chunks(&payload, 1024).map(str::len).collect();
        assert_eq!(sizes, vec![1024, 1024, 452]);
    }

    #[test]
    fn split_respects_char_boundaries() {
        // 'é' is two bytes; a 3-byte buffer cannot hold two of them
        let pieces: Vec<&str> = chunks("ééé", 3).collect();
        assert_eq!(pieces, vec!["é", "é", "é"]);

        let pieces: Vec<&str> = chunks("€", 1).collect();
        assert_eq!(pieces, vec!["€"]);
    }
}
