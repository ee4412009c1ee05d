//! Authentication contract.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::session::AuthSession;

/// Stream of session changes emitted by an `AuthGateway`.
///
/// Each message is the session after the change: `Some` after sign-in or
/// a token refresh, `None` after sign-out or expiry.
pub type SessionChanges = mpsc::UnboundedReceiver<Option<AuthSession>>;

/// Profile metadata attached to a new account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignUpProfile {
    pub full_name: Option<String>,
}

/// Password authentication offered by the hosted backend.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Returns the current session, if one is established and not expired.
    async fn current_session(&self) -> Result<Option<AuthSession>>;

    /// Registers a new listener for session changes.
    ///
    /// Dropping the receiver unsubscribes.
    fn session_changes(&self) -> SessionChanges;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession>;

    /// Creates an account. Backends that require e-mail confirmation
    /// return `Ok(None)`; otherwise the new account is signed in.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &SignUpProfile,
    ) -> Result<Option<AuthSession>>;

    async fn sign_out(&self) -> Result<()>;
}
