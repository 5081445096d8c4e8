//! Supabase `GoTrue` client used as the auth collaborator.
//!
//! The client signs users in and out and keeps the resulting session in a
//! caller-supplied [`SessionPersistence`] so it survives between runs.

use std::fmt;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ClientConfig;

/// Sessions expiring within this window are treated as already expired.
const EXPIRY_SKEW_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: Option<String>,
}

/// Token-bearing session as issued by the backend.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub user: AuthUser,
}

impl AuthSession {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= unix_timestamp_now() + EXPIRY_SKEW_SECONDS
    }
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AuthSession")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(AuthSession),
    ConfirmationRequired,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Auth client misconfigured: {0}")]
    InvalidConfiguration(&'static str),
    #[error("Auth request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Unreadable auth payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Auth service rejected the request: {0}")]
    Api(String),
    #[error("Session storage error: {0}")]
    SecureStorage(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Where sessions live between runs (keychain, memory, ...).
pub trait SessionPersistence: Clone + Send + Sync + 'static {
    fn load_session(&self) -> AuthResult<Option<AuthSession>>;
    fn save_session(&self, session: &AuthSession) -> AuthResult<()>;
    fn clear_session(&self) -> AuthResult<()>;
}

#[derive(Clone)]
pub struct AuthClient<S: SessionPersistence> {
    auth_url: String,
    anon_key: String,
    client: Client,
    store: S,
}

impl<S: SessionPersistence> AuthClient<S> {
    pub fn new(config: &ClientConfig, store: S) -> AuthResult<Self> {
        let anon_key = config.supabase_anon_key.trim().to_string();
        if anon_key.is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Supabase anon key must not be empty",
            ));
        }

        Ok(Self {
            auth_url: config.auth_url(),
            anon_key,
            client: Client::builder().build()?,
            store,
        })
    }

    /// Load the persisted session, refreshing it when expired.
    ///
    /// A session whose refresh fails is cleared and `None` is returned.
    pub async fn restore_session(&self) -> AuthResult<Option<AuthSession>> {
        let Some(stored) = self.store.load_session()? else {
            return Ok(None);
        };

        if !stored.is_expired() {
            return Ok(Some(stored));
        }

        match self.refresh_session(&stored.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(error) => {
                tracing::warn!("Failed to refresh persisted session: {}", error);
                self.store.clear_session()?;
                Ok(None)
            }
        }
    }

    /// Create an account. Projects with email confirmation enabled answer
    /// without tokens, which maps to [`SignUpOutcome::ConfirmationRequired`].
    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<SignUpOutcome> {
        let credentials = Credentials::new(email, password)?;
        let request = self.client.post(self.endpoint("signup")).json(&credentials);

        let Some(session) = self.send(request).await?.into_session()? else {
            return Ok(SignUpOutcome::ConfirmationRequired);
        };
        self.store.save_session(&session)?;
        Ok(SignUpOutcome::SignedIn(session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let session = self
            .grant(Grant::Password(Credentials::new(email, password)?))
            .await?;
        tracing::info!("Signed in as user {}", session.user.id);
        Ok(session)
    }

    pub async fn refresh_session(&self, refresh_token: &str) -> AuthResult<AuthSession> {
        if refresh_token.trim().is_empty() {
            return Err(AuthError::InvalidConfiguration(
                "Refresh token must not be empty",
            ));
        }
        self.grant(Grant::RefreshToken { refresh_token }).await
    }

    /// Revoke the session remotely and forget it locally.
    ///
    /// An already-invalid token (401) still counts as signed out.
    pub async fn sign_out(&self, access_token: &str) -> AuthResult<()> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            expect_success(response).await?;
        }

        self.store.clear_session()?;
        Ok(())
    }

    /// Exchange a grant at the token endpoint and persist the new session.
    async fn grant(&self, grant: Grant<'_>) -> AuthResult<AuthSession> {
        let request = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant.kind())])
            .json(&grant);
        let session = self.send(request).await?.into_session()?.ok_or_else(|| {
            AuthError::Api(format!("No session issued for {} grant", grant.kind()))
        })?;

        self.store.save_session(&session)?;
        Ok(session)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.auth_url)
    }

    /// Send a request authorized with the anon key and decode the token payload.
    async fn send(&self, request: RequestBuilder) -> AuthResult<TokenResponse> {
        let response = request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .await?;
        Ok(expect_success(response).await?.json::<TokenResponse>().await?)
    }
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl<'a> Credentials<'a> {
    fn new(email: &'a str, password: &'a str) -> AuthResult<Self> {
        if email.trim().is_empty() {
            return Err(AuthError::Api("Email is required".to_string()));
        }
        if password.trim().is_empty() {
            return Err(AuthError::Api("Password is required".to_string()));
        }
        Ok(Self { email, password })
    }
}

/// Body of a `/token` request; the variant picks the `grant_type`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Grant<'a> {
    Password(Credentials<'a>),
    RefreshToken { refresh_token: &'a str },
}

impl Grant<'_> {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Password(_) => "password",
            Self::RefreshToken { .. } => "refresh_token",
        }
    }
}

/// Token endpoint payload. Sign-up may nest the tokens under `session`.
#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(flatten)]
    tokens: TokenFields,
    session: Option<TokenFields>,
}

#[derive(Debug, Default, Deserialize)]
struct TokenFields {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<i64>,
    expires_in: Option<i64>,
    user: Option<AuthUser>,
}

impl TokenFields {
    fn merge(self, fallback: Self) -> Self {
        Self {
            access_token: self.access_token.or(fallback.access_token),
            refresh_token: self.refresh_token.or(fallback.refresh_token),
            expires_at: self.expires_at.or(fallback.expires_at),
            expires_in: self.expires_in.or(fallback.expires_in),
            user: self.user.or(fallback.user),
        }
    }
}

impl TokenResponse {
    /// `Ok(None)` means the backend created the user but wants email
    /// confirmation before issuing tokens.
    fn into_session(self) -> AuthResult<Option<AuthSession>> {
        let fields = self.tokens.merge(self.session.unwrap_or_default());
        let expires_at = fields.expires_at.or_else(|| {
            fields
                .expires_in
                .map(|expires_in| unix_timestamp_now().saturating_add(expires_in))
        });

        match (fields.access_token, fields.refresh_token, expires_at, fields.user) {
            (Some(access_token), Some(refresh_token), Some(expires_at), Some(user)) => {
                Ok(Some(AuthSession {
                    access_token,
                    refresh_token,
                    expires_at,
                    user,
                }))
            }
            (None, None, None, Some(_)) => Ok(None),
            _ => Err(AuthError::Api(
                "Auth response did not include enough session fields".to_string(),
            )),
        }
    }
}

async fn expect_success(response: Response) -> AuthResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AuthError::Api(parse_api_error(status, &body)))
}

/// Error keys used by `GoTrue` and `PostgREST`, most specific first.
const ERROR_MESSAGE_KEYS: [&str; 4] = ["message", "msg", "error_description", "error"];

/// Pull a human-readable message out of a `GoTrue` or `PostgREST` error body.
pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> String {
    let code = status.as_u16();
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|payload| {
            ERROR_MESSAGE_KEYS
                .iter()
                .find_map(|key| payload.get(*key)?.as_str().map(str::trim).map(str::to_string))
        })
        .filter(|message| !message.is_empty());

    match from_json {
        Some(message) => format!("{message} ({code})"),
        None => {
            let excerpt: String = body.trim().chars().take(180).collect();
            if excerpt.is_empty() {
                format!("HTTP {code}")
            } else {
                format!("{excerpt} ({code})")
            }
        }
    }
}

fn unix_timestamp_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_expiring_at(expires_at: i64) -> AuthSession {
        AuthSession {
            access_token: "secret-access-token".to_string(),
            refresh_token: "secret-refresh-token".to_string(),
            expires_at,
            user: AuthUser {
                id: "user".to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn signup_without_tokens_means_confirmation_required() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"user": {"id": "user", "email": "me@example.com"}}"#)
                .unwrap();
        assert!(response.into_session().unwrap().is_none());
    }

    #[test]
    fn nested_session_fields_are_used() {
        let response: TokenResponse = serde_json::from_str(
            r#"{
                "session": {
                    "access_token": "a",
                    "refresh_token": "r",
                    "expires_at": 1700000000,
                    "user": {"id": "u1", "email": null}
                }
            }"#,
        )
        .unwrap();
        let session = response.into_session().unwrap().unwrap();
        assert_eq!(session.user.id, "u1");
        assert_eq!(session.expires_at, 1_700_000_000);
    }

    #[test]
    fn partial_token_payload_is_rejected() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token": "a", "user": {"id": "u1"}}"#).unwrap();
        assert!(matches!(response.into_session(), Err(AuthError::Api(_))));
    }

    #[test]
    fn expires_in_is_converted_to_absolute_time() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token": "a", "refresh_token": "r", "expires_in": 3600, "user": {"id": "u1"}}"#,
        )
        .unwrap();
        let session = response.into_session().unwrap().unwrap();
        assert!(session.expires_at > unix_timestamp_now());
        assert!(!session.is_expired());
    }

    #[test]
    fn session_inside_skew_window_is_expired() {
        assert!(session_expiring_at(unix_timestamp_now() + 10).is_expired());
        assert!(!session_expiring_at(unix_timestamp_now() + 3600).is_expired());
    }

    #[test]
    fn session_debug_redacts_tokens() {
        let rendered = format!("{:?}", session_expiring_at(1_700_000_000));
        assert!(!rendered.contains("secret-access-token"));
        assert!(!rendered.contains("secret-refresh-token"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn grants_serialize_to_token_bodies() {
        let password = Grant::Password(Credentials::new("me@example.com", "hunter2").unwrap());
        assert_eq!(password.kind(), "password");
        assert_eq!(
            serde_json::to_value(&password).unwrap(),
            serde_json::json!({ "email": "me@example.com", "password": "hunter2" })
        );

        let refresh = Grant::RefreshToken { refresh_token: "r1" };
        assert_eq!(refresh.kind(), "refresh_token");
        assert_eq!(
            serde_json::to_value(&refresh).unwrap(),
            serde_json::json!({ "refresh_token": "r1" })
        );
    }

    #[test]
    fn blank_credentials_are_rejected() {
        assert!(Credentials::new(" ", "pw").is_err());
        assert!(Credentials::new("me@example.com", "").is_err());
    }

    #[test]
    fn api_error_prefers_message_fields() {
        let message = parse_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(message, "Invalid login credentials (400)");
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }
}
