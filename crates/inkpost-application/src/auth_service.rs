//! Sign-in, sign-up and sign-out use cases.

use inkpost_core::error::{InkpostError, Result};
use inkpost_core::gateway::{AuthGateway, SignUpProfile};
use inkpost_core::session::{AuthSession, SessionRepository, SessionUser};
use std::sync::Arc;

/// Result of a sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The account was created and signed in.
    SignedIn(SessionUser),
    /// The backend wants the e-mail address confirmed first.
    ConfirmationPending,
}

/// Authentication use cases on top of an `AuthGateway`.
///
/// When a `SessionRepository` is attached, established sessions are saved
/// there and removed again on sign-out.
pub struct AuthService {
    auth: Arc<dyn AuthGateway>,
    sessions: Option<Arc<dyn SessionRepository>>,
}

impl AuthService {
    pub fn new(auth: Arc<dyn AuthGateway>) -> Self {
        Self {
            auth,
            sessions: None,
        }
    }

    pub fn with_repository(mut self, sessions: Arc<dyn SessionRepository>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Result<Option<SessionUser>> {
        Ok(self.auth.current_session().await?.map(|session| session.user))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SessionUser> {
        validate_credentials(email, password)?;

        let session = self.auth.sign_in(email.trim(), password).await?;
        self.persist(&session)?;
        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session.user)
    }

    /// Creates an account. `full_name` becomes the display name.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<SignUpOutcome> {
        validate_credentials(email, password)?;

        let profile = SignUpProfile {
            full_name: full_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
        };
        match self.auth.sign_up(email.trim(), password, &profile).await? {
            Some(session) => {
                self.persist(&session)?;
                tracing::info!(user_id = %session.user.id, "Signed up");
                Ok(SignUpOutcome::SignedIn(session.user))
            }
            None => {
                tracing::info!("Sign-up awaiting e-mail confirmation");
                Ok(SignUpOutcome::ConfirmationPending)
            }
        }
    }

    /// Ends the session. The stored session is removed even when the
    /// backend call fails.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.auth.sign_out().await;
        if let Some(sessions) = &self.sessions {
            sessions.clear()?;
        }
        result?;
        tracing::info!("Signed out");
        Ok(())
    }

    fn persist(&self, session: &AuthSession) -> Result<()> {
        match &self.sessions {
            Some(sessions) => sessions.save(session),
            None => Ok(()),
        }
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(InkpostError::validation("Email and password required"));
    }
    Ok(())
}
