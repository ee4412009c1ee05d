use async_trait::async_trait;
use chrono::Utc;
use inkpost_core::error::Result;
use inkpost_core::gateway::{AuthGateway, SessionChanges, SignUpProfile};
use inkpost_core::session::AuthSession;
use serde_json::{Value, json};

use super::dto::TokenResponse;
use super::{SupabaseGateway, transport_error};

#[async_trait]
impl AuthGateway for SupabaseGateway {
    async fn current_session(&self) -> Result<Option<AuthSession>> {
        let session = self.session_snapshot();
        match session {
            Some(session) if session.is_expired(Utc::now()) => {
                tracing::info!("Session for {} expired", session.user.email);
                self.set_session(None);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    fn session_changes(&self) -> SessionChanges {
        self.listeners.subscribe()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession> {
        let url = self.url("auth/v1/token");
        let response = self
            .send(
                self.client
                    .post(url)
                    .query(&[("grant_type", "password")])
                    .header("apikey", &self.anon_key)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;

        let token: TokenResponse = response.json().await.map_err(transport_error)?;
        let session = token.into_session(Utc::now());
        tracing::info!("Signed in as {}", session.user.email);

        self.set_session(Some(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        profile: &SignUpProfile,
    ) -> Result<Option<AuthSession>> {
        let url = self.url("auth/v1/signup");
        let response = self
            .send(
                self.client
                    .post(url)
                    .header("apikey", &self.anon_key)
                    .json(&json!({
                        "email": email,
                        "password": password,
                        "data": { "full_name": profile.full_name },
                    })),
            )
            .await?;

        // Projects with e-mail confirmation answer with the bare user.
        let body: Value = response.json().await.map_err(transport_error)?;
        if body.get("access_token").is_none() {
            tracing::info!("Registered {email}, confirmation pending");
            return Ok(None);
        }

        let token: TokenResponse = serde_json::from_value(body)?;
        let session = token.into_session(Utc::now());
        self.set_session(Some(session.clone()));
        Ok(Some(session))
    }

    async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.session_snapshot() else {
            return Ok(());
        };

        let url = self.url("auth/v1/logout");
        let result = self
            .send(
                self.client
                    .post(url)
                    .header("apikey", &self.anon_key)
                    .bearer_auth(&session.access_token),
            )
            .await;

        // The local session is dropped even when the backend call fails.
        self.set_session(None);
        tracing::info!("Signed out {}", session.user.email);

        result.map(|_| ())
    }
}
