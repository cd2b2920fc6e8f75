//! Controller against a real WebSocket server on localhost.

use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use parley_client::{
    ChatMessage, ClientConfig, ConnectionController, Identity, Lifecycle, LoopOutcome, MenuChoice,
    SessionContext, Status, websocket::WebSocketConnector,
};
use parley_harness::{PresenterEvent, ScriptedLines, ScriptedPresenter};
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::tungstenite::{
    Message,
    handshake::server::{ErrorResponse, Request, Response},
};

/// Echo server speaking the legacy convention for one client.
///
/// Returns the request URI and every message the client sent.
async fn serve_one(listener: TcpListener) -> (String, Vec<Message>) {
    let (tcp, _) = listener.accept().await.unwrap();
    let (uri_tx, uri_rx) = oneshot::channel();
    let mut ws = tokio_tungstenite::accept_hdr_async(tcp, move |req: &Request, resp: Response| {
        let _ = uri_tx.send(req.uri().to_string());
        Ok::<_, ErrorResponse>(resp)
    })
    .await
    .unwrap();

    let mut seen = Vec::new();
    while let Some(Ok(msg)) = ws.next().await {
        match &msg {
            Message::Text(text) if text.as_str() == "getConnectedUsers" => {
                ws.send(Message::Text("(System)ConnectedUserList: alice, bob".into()))
                    .await
                    .unwrap();
            },
            Message::Text(text) => {
                ws.send(Message::Text(format!("(alice){}", text.as_str()).into())).await.unwrap();
            },
            _ => {},
        }
        seen.push(msg);
    }
    (uri_rx.await.unwrap(), seen)
}

fn config(url: String) -> ClientConfig {
    ClientConfig {
        server_url: url,
        connect_tick: Duration::from_millis(50),
        close_grace: Duration::from_secs(1),
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn chat_round_trip_over_websocket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_one(listener));

    let presenter = Arc::new(ScriptedPresenter::new().with_menu([MenuChoice::ViewUsers]));
    let (lines, feeder) = ScriptedLines::channel();
    let ctx = SessionContext::new(Identity::new("alice").unwrap(), Lifecycle::new());
    let mut controller = ConnectionController::new(
        WebSocketConnector::new(),
        Arc::clone(&presenter),
        Arc::new(lines),
        ctx,
        config(format!("ws://{addr}/ws")),
    );
    let run = tokio::spawn(async move { controller.run_connection_loop().await });

    feeder.type_line("hello");
    presenter
        .wait_for(|events| {
            events.contains(&PresenterEvent::Message(ChatMessage::SelfEcho {
                text: "(alice)hello".into(),
            }))
        })
        .await;

    feeder.type_line("showmenu");
    presenter
        .wait_for(|events| {
            events.contains(&PresenterEvent::UserList(vec!["alice".into(), "bob".into()]))
        })
        .await;

    feeder.type_line("exit");
    assert_eq!(run.await.unwrap(), LoopOutcome::UserExit);

    let (uri, seen) = server.await.unwrap();
    assert_eq!(uri, "/ws?name=alice");
    assert_eq!(seen.first(), Some(&Message::Text("hello".into())));
    assert!(matches!(seen.last(), Some(Message::Close(Some(frame))) if frame.reason == "Application exiting"));
}

#[tokio::test]
async fn refused_connection_prompts() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let presenter = Arc::new(ScriptedPresenter::new().with_reconnect([false]));
    let (lines, _feeder) = ScriptedLines::channel();
    let ctx = SessionContext::new(Identity::new("alice").unwrap(), Lifecycle::new());
    let mut controller = ConnectionController::new(
        WebSocketConnector::new(),
        Arc::clone(&presenter),
        Arc::new(lines),
        ctx,
        config(format!("ws://{addr}/ws")),
    );

    assert_eq!(controller.run_connection_loop().await, LoopOutcome::Declined);
    let events = presenter.events();
    assert_eq!(events.first(), Some(&PresenterEvent::Status(Status::Connecting)));
    assert!(events.iter().any(|e| matches!(
        e,
        PresenterEvent::Error(text) if text.starts_with("failed to connect")
    )));
    assert!(events.contains(&PresenterEvent::ReconnectPrompt(false)));
}
