//! Session identity and transition subscriptions.
//!
//! The favorites layer does not authenticate anyone. It only observes
//! whether the session is anonymous or signed in, and reacts to the
//! transition between the two. The auth stack publishes the current
//! identity through [`AuthState`]; the favorites controller holds an
//! [`AuthSubscription`] and reconciles on anonymous-to-authenticated.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Who the current session belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionIdentity {
    /// Guest usage before sign-in; favorites persist only on-device.
    #[default]
    Anonymous,
    /// Signed-in usage; the server-side favorites set is authoritative.
    #[serde(rename_all = "camelCase")]
    Authenticated { user_id: String },
}

impl SessionIdentity {
    /// Whether the session is signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionIdentity::Authenticated { .. })
    }
}

/// Publisher side of the session identity.
#[derive(Debug)]
pub struct AuthState {
    tx: watch::Sender<SessionIdentity>,
}

impl AuthState {
    /// Create an auth state starting from the given identity.
    pub fn new(initial: SessionIdentity) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// The current identity.
    pub fn current(&self) -> SessionIdentity {
        self.tx.borrow().clone()
    }

    /// Publish a new identity. Subscribers observe the change even if
    /// several transitions happen before they poll (they always see the
    /// latest value).
    pub fn set(&self, identity: SessionIdentity) {
        // send_replace stores the value even with no receivers yet.
        self.tx.send_replace(identity);
    }

    /// Subscribe to identity transitions.
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new(SessionIdentity::Anonymous)
    }
}

/// Subscriber side of the session identity.
#[derive(Debug, Clone)]
pub struct AuthSubscription {
    rx: watch::Receiver<SessionIdentity>,
}

impl AuthSubscription {
    /// The identity as of the last observation.
    pub fn current(&self) -> SessionIdentity {
        self.rx.borrow().clone()
    }

    /// Wait for the next identity change and return it.
    ///
    /// Returns `None` once the publisher has been dropped.
    pub async fn changed(&mut self) -> Option<SessionIdentity> {
        match self.rx.changed().await {
            Ok(()) => Some(self.rx.borrow_and_update().clone()),
            Err(_) => None,
        }
    }
}
