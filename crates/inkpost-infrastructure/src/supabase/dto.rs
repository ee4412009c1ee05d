//! Wire shapes of the auth API and error bodies.

use chrono::{DateTime, Duration, Utc};
use inkpost_core::session::{AuthSession, SessionUser};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: UserDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserDto {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: Option<Value>,
}

impl UserDto {
    fn full_name(&self) -> Option<String> {
        self.user_metadata
            .as_ref()
            .and_then(|meta| meta.get("full_name"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

impl TokenResponse {
    pub fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));
        let display_name = self.user.full_name();

        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: SessionUser::new(
                self.user.id,
                self.user.email.unwrap_or_default(),
                display_name,
            ),
        }
    }
}

/// Extracts the human-readable message from an error body.
///
/// PostgREST uses `message`, GoTrue uses `msg` or `error_description`,
/// storage uses `message` or `error`.
pub(super) fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.to_string());
    };

    ["message", "msg", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .or_else(|| Some(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_variants() {
        assert_eq!(
            error_message(r#"{"code":"PGRST116","message":"JSON object requested"}"#),
            Some("JSON object requested".to_string())
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            Some("Invalid login credentials".to_string())
        );
        assert_eq!(error_message("Bad Gateway"), Some("Bad Gateway".to_string()));
        assert_eq!(error_message("  "), None);
    }

    #[test]
    fn test_token_response_into_session() {
        let now = Utc::now();
        let response: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "user": {
                "id": "u-1",
                "email": "ada@example.com",
                "user_metadata": { "full_name": "Ada Lovelace" }
            }
        }))
        .unwrap();

        let session = response.into_session(now);
        assert_eq!(session.user.display_name, "Ada Lovelace");
        assert_eq!(session.expires_at, Some(now + Duration::seconds(3600)));
    }
}
