use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

/// The authenticated identity issued by the hosted auth service. Sign-up,
/// sign-in, and token issuance all happen on the service side; this
/// application only ever sees a verified identity or nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProfileRole {
    User,
    Admin,
}

impl Default for ProfileRole {
    fn default() -> Self {
        ProfileRole::User
    }
}

/// The profile row keyed by the identity id. Created by the auth service at
/// sign-up; this application mutates `full_name` only and never deletes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub role: ProfileRole,
}

/// Explicit auth context: initialized at application start, updated on
/// sign-in/out, observable by anything that keys queries off the current
/// identity. Replaces the ambient global session the original UI leaned on.
#[derive(Debug)]
pub struct AuthSession {
    tx: watch::Sender<Option<Identity>>,
}

impl AuthSession {
    pub fn new(initial: Option<Identity>) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn signed_out() -> Self {
        Self::new(None)
    }

    pub fn sign_in(&self, identity: Identity) {
        tracing::info!(user_id = %identity.id, "identity signed in");
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        tracing::info!("identity signed out");
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    /// Stream of identity changes; resource views restart their queries and
    /// subscriptions when the value flips.
    pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::signed_out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_lifecycle() {
        let session = AuthSession::signed_out();
        assert!(session.current().is_none());

        let identity = Identity {
            id: Uuid::new_v4(),
            email: "asha@example.com".to_string(),
        };
        session.sign_in(identity.clone());
        assert_eq!(session.current(), Some(identity));

        session.sign_out();
        assert!(session.current().is_none());
    }

    #[test]
    fn watchers_observe_sign_out() {
        let session = AuthSession::new(Some(Identity {
            id: Uuid::new_v4(),
            email: "asha@example.com".to_string(),
        }));
        let rx = session.watch();

        session.sign_out();
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow().is_none());
    }
}
