//! Auth gate: decides whether note operations may run.
//!
//! The current auth state is published through a [`SessionWatch`]; the gate
//! only ever observes it. Reading the state is cheap and never touches the
//! network, so front ends can evaluate the gate on every render or command.

use tokio::sync::watch;

use crate::auth::{AuthClient, AuthSession, SessionPersistence};
use crate::error::{Error, Result};
use crate::models::Session;

/// Observable auth state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// The auth check has not completed yet.
    #[default]
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

impl AuthState {
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Loading | Self::Unauthenticated => None,
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl From<Option<Session>> for AuthState {
    fn from(value: Option<Session>) -> Self {
        value.map_or(Self::Unauthenticated, Self::Authenticated)
    }
}

/// Where the front end should be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Still loading; show a spinner and do nothing else.
    Pending,
    /// No session; leave for the login flow.
    Login,
    /// Signed in; the notes view may activate.
    Notes(Session),
}

/// Publisher side of the session stream, owned by whoever talks to the auth
/// collaborator.
#[derive(Debug)]
pub struct SessionWatch {
    sender: watch::Sender<AuthState>,
}

impl Default for SessionWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionWatch {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(AuthState::Loading);
        Self { sender }
    }

    /// Publish a resolved session (or its absence).
    pub fn publish(&self, session: Option<Session>) {
        let state = AuthState::from(session);
        tracing::debug!(
            authenticated = state.session().is_some(),
            "Publishing auth state"
        );
        self.sender.send_replace(state);
    }

    /// Go back to `Loading`, e.g. while a new sign-in is in progress.
    pub fn set_loading(&self) {
        self.sender.send_replace(AuthState::Loading);
    }

    #[must_use]
    pub fn current(&self) -> AuthState {
        self.sender.borrow().clone()
    }

    /// A gate observing this stream.
    #[must_use]
    pub fn gate(&self) -> AuthGate {
        AuthGate {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Read-only view over the session stream.
#[derive(Debug, Clone)]
pub struct AuthGate {
    receiver: watch::Receiver<AuthState>,
}

impl AuthGate {
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.receiver.borrow().clone()
    }

    #[must_use]
    pub fn get_session(&self) -> Option<Session> {
        self.receiver.borrow().session().cloned()
    }

    #[must_use]
    pub fn evaluate(&self) -> Route {
        match self.state() {
            AuthState::Loading => Route::Pending,
            AuthState::Unauthenticated => Route::Login,
            AuthState::Authenticated(session) => Route::Notes(session),
        }
    }

    /// The session, or `NotAuthenticated` while loading or signed out.
    pub fn require_session(&self) -> Result<Session> {
        self.get_session().ok_or(Error::NotAuthenticated)
    }

    /// Wait until the state leaves `Loading` and return the resulting route.
    ///
    /// If the publisher goes away while still loading, resolves to `Login`.
    pub async fn resolved(&mut self) -> Route {
        match self.receiver.wait_for(|state| !state.is_loading()).await {
            Ok(state) => match state.clone() {
                AuthState::Authenticated(session) => Route::Notes(session),
                AuthState::Loading | AuthState::Unauthenticated => Route::Login,
            },
            Err(_) => Route::Login,
        }
    }
}

/// Restore the persisted session through the auth client and publish it.
///
/// Returns the token-bearing session so the caller can authorize the note
/// store. A restore failure publishes `Unauthenticated` before returning the
/// error, so observers never stay stuck in `Loading`.
pub async fn resolve_session<S: SessionPersistence>(
    client: &AuthClient<S>,
    watch: &SessionWatch,
) -> Result<Option<AuthSession>> {
    watch.set_loading();
    match client.restore_session().await {
        Ok(restored) => {
            watch.publish(restored.as_ref().map(Session::from));
            Ok(restored)
        }
        Err(error) => {
            watch.publish(None);
            Err(error.into())
        }
    }
}
