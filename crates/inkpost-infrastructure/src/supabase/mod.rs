//! SupabaseGateway - HTTP implementation of the gateway traits.
//!
//! Talks to the three REST surfaces of a Supabase project:
//! - `/rest/v1` (PostgREST) for tables
//! - `/storage/v1` for buckets
//! - `/auth/v1` (GoTrue) for password auth
//!
//! Requests carry the anon key as `apikey` and the session's access token
//! (or the anon key when signed out) as bearer token.

mod auth;
mod dto;
mod storage;
mod table;

use inkpost_core::config::BackendSettings;
use inkpost_core::error::{InkpostError, Result};
use inkpost_core::session::AuthSession;
use reqwest::{Client, Method, RequestBuilder, Response};
use std::sync::RwLock;

use crate::session_listeners::SessionListeners;

/// Gateway backed by a hosted Supabase project.
pub struct SupabaseGateway {
    client: Client,
    base_url: String,
    anon_key: String,
    session: RwLock<Option<AuthSession>>,
    listeners: SessionListeners,
}

impl SupabaseGateway {
    /// Creates a gateway with a default HTTP client.
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, anon_key)
    }

    /// Creates a gateway reusing an existing HTTP client.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            anon_key: anon_key.into(),
            session: RwLock::new(None),
            listeners: SessionListeners::new(),
        }
    }

    /// Builds a gateway from `[backend]` settings.
    pub fn from_settings(settings: &BackendSettings) -> Result<Self> {
        let (url, key) = settings.credentials()?;
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| InkpostError::config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, url, key))
    }

    /// Installs a previously persisted session without notifying listeners.
    pub fn restore_session(&self, session: AuthSession) {
        if let Ok(mut current) = self.session.write() {
            *current = Some(session);
        }
    }

    /// The session currently held, expired or not.
    pub fn session_snapshot(&self) -> Option<AuthSession> {
        self.session.read().ok().and_then(|s| s.clone())
    }

    fn set_session(&self, session: Option<AuthSession>) {
        if let Ok(mut current) = self.session.write() {
            *current = session.clone();
        }
        self.listeners.publish(session);
    }

    fn bearer_token(&self) -> String {
        self.session_snapshot()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer_token())
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await.map_err(transport_error)?;
        ensure_success(response).await
    }
}

fn transport_error(err: reqwest::Error) -> InkpostError {
    InkpostError::gateway(format!("Request failed: {err}"))
}

/// Turns a non-2xx response into a Gateway error carrying the backend's
/// own message.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = dto::error_message(&body)
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    tracing::debug!(status = status.as_u16(), %message, "Backend returned an error");
    Err(InkpostError::gateway(message))
}
