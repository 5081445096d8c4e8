//! Authenticated principal passed into note operations

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::AuthSession;

/// Opaque user identifier issued by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The signed-in user as seen by the note manager.
///
/// Carries no tokens; the store that talks to the backend owns those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }
}

impl From<&AuthSession> for Session {
    fn from(value: &AuthSession) -> Self {
        Self {
            user_id: UserId::new(value.user.id.clone()),
            email: value.user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthUser;

    #[test]
    fn session_from_auth_session_drops_tokens() {
        let auth = AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("me@example.com".to_string()),
            },
        };
        let session = Session::from(&auth);
        assert_eq!(session.user_id.as_str(), "user-1");
        assert_eq!(session.email.as_deref(), Some("me@example.com"));
    }
}
