//! Session context shared by the controller and both pumps.
//!
//! Replaces process-wide globals with explicit values:
//!
//! - [`Identity`]: the username, fixed after the first connection attempt.
//! - [`ReconnectIntent`]: whether the controller should retry after the
//!   duplex exchange ends.
//! - [`Lifecycle`]: the intent plus a process-wide shutdown token, created
//!   at startup so the termination signal handler can reach it before any
//!   identity exists.
//! - [`SessionContext`]: everything above, handed to the controller.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio_util::sync::CancellationToken;

/// The local username.
///
/// Never empty or whitespace-only. Surrounding whitespace is kept as typed,
/// matching what the server receives in the `name` query parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(Arc<str>);

impl Identity {
    /// Create an identity. `None` if `name` is blank.
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref();
        if name.trim().is_empty() { None } else { Some(Self(Arc::from(name))) }
    }

    /// Username as typed.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the controller should reconnect after a session ends.
///
/// Starts `true`. Written only by the termination handler (forces `false`),
/// the `exit` command (forces `false`) and the reconnect prompt. Clones share
/// the same flag.
#[derive(Debug, Clone)]
pub struct ReconnectIntent(Arc<AtomicBool>);

impl Default for ReconnectIntent {
    fn default() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }
}

impl ReconnectIntent {
    /// Current value.
    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Set from a reconnect prompt answer.
    pub fn set(&self, reconnect: bool) {
        self.0.store(reconnect, Ordering::SeqCst);
    }

    /// Stop reconnecting.
    pub fn clear(&self) {
        self.set(false);
    }
}

/// Process-wide lifecycle state.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    intent: ReconnectIntent,
    shutdown: CancellationToken,
}

impl Lifecycle {
    /// Create a lifecycle with reconnection enabled and no shutdown pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconnect intent flag.
    pub fn intent(&self) -> &ReconnectIntent {
        &self.intent
    }

    /// Process-wide shutdown token. Pumps hold child tokens of this.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }

    /// Request termination: stop reconnecting and cancel every pump.
    pub fn terminate(&self) {
        self.intent.clear();
        self.shutdown.cancel();
    }

    /// Returns true once [`Lifecycle::terminate`] has been called.
    pub fn is_terminating(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

/// Context for one client: identity plus lifecycle.
#[derive(Debug, Clone)]
pub struct SessionContext {
    identity: Identity,
    lifecycle: Lifecycle,
}

impl SessionContext {
    /// Bind an identity to the process lifecycle.
    pub fn new(identity: Identity, lifecycle: Lifecycle) -> Self {
        Self { identity, lifecycle }
    }

    /// Local username.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Process lifecycle.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Shorthand for the reconnect intent.
    pub fn intent(&self) -> &ReconnectIntent {
        self.lifecycle.intent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_identity_rejected() {
        assert!(Identity::new("").is_none());
        assert!(Identity::new("   ").is_none());
        assert_eq!(Identity::new("alice").map(|i| i.to_string()), Some("alice".to_string()));
    }

    #[test]
    fn intent_clones_share_state() {
        let intent = ReconnectIntent::default();
        let clone = intent.clone();
        assert!(clone.get());

        intent.clear();
        assert!(!clone.get());
    }

    #[test]
    fn terminate_clears_intent_and_cancels() {
        let lifecycle = Lifecycle::new();
        let child = lifecycle.shutdown_token().child_token();

        lifecycle.terminate();

        assert!(!lifecycle.intent().get());
        assert!(lifecycle.is_terminating());
        assert!(child.is_cancelled());
    }
}
