//! Parley chat client binary.
//!
//! # Usage
//!
//! ```bash
//! # Connect to the default local server
//! parley
//!
//! # Another server, versioned envelope wire format, verbose logs on stderr
//! parley --server wss://chat.example.com/ws --wire-format envelope --log-level debug
//! ```

use std::{sync::Arc, time::Duration};

use clap::{Parser, ValueEnum};
use parley_cli::console::{ConsoleLines, ConsolePresenter, SharedInput};
use parley_client::{
    ChatClient, ClientConfig, DEFAULT_SERVER_URL, FailurePolicy, Lifecycle, LoopOutcome,
    websocket::WebSocketConnector,
};
use parley_proto::WireFormat;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Interactive WebSocket chat client
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Interactive chat client for a WebSocket chat server")]
#[command(version)]
struct Args {
    /// Chat server URL; the username is appended as `name=<username>`
    #[arg(short, long, default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Wire format (legacy, envelope)
    #[arg(long, default_value = "legacy")]
    wire_format: WireFormat,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Seconds to wait for the server to acknowledge a close
    #[arg(long, default_value_t = 3)]
    close_grace_secs: u64,

    /// Seconds before a pending connect is abandoned (0 waits forever)
    #[arg(long, default_value_t = 30)]
    connect_timeout_secs: u64,

    /// What to do after a connect failure that is not a network error
    #[arg(long, value_enum, default_value_t = UnexpectedFailure::Prompt)]
    unexpected_failure: UnexpectedFailure,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum UnexpectedFailure {
    /// Ask whether to reconnect
    Prompt,
    /// Retry without asking
    Retry,
}

impl From<UnexpectedFailure> for FailurePolicy {
    fn from(value: UnexpectedFailure) -> Self {
        match value {
            UnexpectedFailure::Prompt => Self::Prompt,
            UnexpectedFailure::Retry => Self::Retry,
        }
    }
}

impl Args {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            server_url: self.server.clone(),
            wire_format: self.wire_format,
            connect_timeout: (self.connect_timeout_secs > 0)
                .then(|| Duration::from_secs(self.connect_timeout_secs)),
            close_grace: Duration::from_secs(self.close_grace_secs),
            on_unexpected_failure: self.unexpected_failure.into(),
            ..ClientConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Chat output owns stdout
    tracing_subscriber::registry().with(fmt::layer().with_writer(std::io::stderr)).with(filter).init();

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let outcome = runtime.block_on(run(args.config()));
    tracing::info!(?outcome, "parley exiting");

    // A stdin read still pending on the blocking pool would hold shutdown open
    runtime.shutdown_timeout(Duration::from_millis(100));
    Ok(())
}

async fn run(config: ClientConfig) -> Option<LoopOutcome> {
    tracing::info!(server = %config.server_url, wire_format = %config.wire_format, "parley starting");

    let lifecycle = Lifecycle::new();
    let on_signal = lifecycle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("termination requested");
            on_signal.terminate();
        }
    });

    let input = SharedInput::stdin();
    let client = ChatClient::new(
        WebSocketConnector::new(),
        Arc::new(ConsolePresenter::new(input.clone())),
        Arc::new(ConsoleLines::new(input)),
        lifecycle,
        config,
    );
    client.run().await
}
