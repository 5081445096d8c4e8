//! Per-profile session persistence in the OS keychain.
//!
//! Test builds swap the keychain for a process-wide map so tests never touch
//! the real credential store.

#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Mutex, OnceLock};

use scrawl_core::auth::{AuthClient, AuthResult, SessionPersistence};
pub use scrawl_core::auth::{AuthError, AuthSession};
use scrawl_core::config::ClientConfig;

#[cfg(not(test))]
const KEYRING_SERVICE_NAME: &str = "scrawl-cli";

pub type CliAuthClient = AuthClient<KeychainSessionStore>;

#[derive(Debug, Clone)]
pub struct KeychainSessionStore {
    account: String,
}

impl KeychainSessionStore {
    pub fn for_profile(profile_name: &str) -> Self {
        Self {
            account: format!("session:{profile_name}"),
        }
    }

    #[cfg(not(test))]
    fn read(&self) -> AuthResult<Option<String>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(Some(raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(not(test))]
    fn write(&self, raw: &str) -> AuthResult<()> {
        self.entry()?
            .set_password(raw)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }

    #[cfg(not(test))]
    fn remove(&self) -> AuthResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(AuthError::SecureStorage(error.to_string())),
        }
    }

    #[cfg(not(test))]
    fn entry(&self) -> AuthResult<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE_NAME, &self.account)
            .map_err(|error| AuthError::SecureStorage(error.to_string()))
    }

    #[cfg(test)]
    fn test_store() -> &'static Mutex<HashMap<String, String>> {
        static STORE: OnceLock<Mutex<HashMap<String, String>>> = OnceLock::new();
        STORE.get_or_init(|| Mutex::new(HashMap::new()))
    }

    #[cfg(test)]
    fn with_test_store<T>(
        &self,
        apply: impl FnOnce(&mut HashMap<String, String>) -> T,
    ) -> AuthResult<T> {
        let mut guard = Self::test_store()
            .lock()
            .map_err(|error| AuthError::SecureStorage(error.to_string()))?;
        Ok(apply(&mut guard))
    }

    #[cfg(test)]
    fn read(&self) -> AuthResult<Option<String>> {
        self.with_test_store(|store| store.get(&self.account).cloned())
    }

    #[cfg(test)]
    fn write(&self, raw: &str) -> AuthResult<()> {
        self.with_test_store(|store| {
            store.insert(self.account.clone(), raw.to_string());
        })
    }

    #[cfg(test)]
    fn remove(&self) -> AuthResult<()> {
        self.with_test_store(|store| {
            store.remove(&self.account);
        })
    }
}

impl SessionPersistence for KeychainSessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        self.read()?
            .map(|raw| serde_json::from_str(&raw).map_err(AuthError::from))
            .transpose()
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        self.write(&serde_json::to_string(session)?)
    }

    fn clear_session(&self) -> AuthResult<()> {
        self.remove()
    }
}

pub fn auth_client(profile_name: &str, config: &ClientConfig) -> AuthResult<CliAuthClient> {
    AuthClient::new(config, KeychainSessionStore::for_profile(profile_name))
}

pub fn load_stored_session(profile_name: &str) -> AuthResult<Option<AuthSession>> {
    KeychainSessionStore::for_profile(profile_name).load_session()
}

pub fn clear_stored_session(profile_name: &str) -> AuthResult<()> {
    KeychainSessionStore::for_profile(profile_name).clear_session()
}

#[cfg(test)]
mod tests {
    use scrawl_core::auth::AuthUser;

    use super::*;

    fn session(user: &str) -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_700_000_000,
            user: AuthUser {
                id: user.to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn sessions_are_isolated_per_profile() {
        let work = KeychainSessionStore::for_profile("auth-test-work");
        let home = KeychainSessionStore::for_profile("auth-test-home");

        work.save_session(&session("u-work")).unwrap();
        assert_eq!(work.load_session().unwrap(), Some(session("u-work")));
        assert_eq!(home.load_session().unwrap(), None);

        clear_stored_session("auth-test-work").unwrap();
        assert_eq!(load_stored_session("auth-test-work").unwrap(), None);
    }

    #[test]
    fn clearing_missing_session_is_ok() {
        clear_stored_session("auth-test-never-saved").unwrap();
    }
}
