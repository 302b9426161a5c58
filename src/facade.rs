use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::credential::{self, Credential};
use crate::error::{AuthError, Result};
use crate::rng::SecureRandom;
use crate::store::{self, CredentialStore};
use crate::totp;

fn now_ms() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| AuthError::ConfigurationError(format!("system clock error: {e}")))
}

/// Single entry point exposing credential creation, code generation, and
/// verification. Carries one [`Config`], one [`SecureRandom`], and an
/// optional credential store resolved at most once (explicit store first,
/// then the process-wide registrar of [`crate::store::register_store`]).
pub struct Authenticator {
    config: Config,
    rng: SecureRandom,
    explicit_store: Option<Box<dyn CredentialStore>>,
    resolved_store: OnceLock<Option<&'static dyn CredentialStore>>,
}

impl Authenticator {
    pub fn builder() -> AuthenticatorBuilder {
        AuthenticatorBuilder::default()
    }

    /// Builds an `Authenticator` with default configuration, a fresh
    /// `SecureRandom`, and store resolution deferred to first use.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    fn store(&self) -> Option<&dyn CredentialStore> {
        if let Some(store) = &self.explicit_store {
            return Some(store.as_ref());
        }
        *self
            .resolved_store
            .get_or_init(store::registered_store)
    }

    /// Generates a new credential without persisting it anywhere.
    pub fn create_credentials(&self) -> Result<Credential> {
        credential::generate(&self.rng, &self.config)
    }

    /// Generates a new credential and saves it via the configured store.
    pub fn create_credentials_for_user(&self, user_name: &str) -> Result<Credential> {
        let credential = self.create_credentials()?;
        let store = self.store().ok_or(AuthError::StoreNotConfigured)?;
        store.save(
            user_name,
            credential.key(),
            credential.validation_code_at_epoch(),
            credential.scratch_codes(),
        )?;
        Ok(credential)
    }

    /// Returns the TOTP code for `secret` at `time_ms` (defaults to now).
    pub fn get_totp(&self, secret: &str, time_ms: Option<u64>) -> Result<u32> {
        let time_ms = time_ms.map(Ok).unwrap_or_else(now_ms)?;
        totp::get_totp(secret, &self.config, time_ms)
    }

    /// Returns the TOTP code for `user_name`'s stored secret at `time_ms`.
    pub fn get_totp_of_user(&self, user_name: &str, time_ms: Option<u64>) -> Result<u32> {
        let secret = self.load_secret(user_name)?;
        self.get_totp(&secret, time_ms)
    }

    /// Verifies `code` against `secret` at `time_ms` (defaults to now),
    /// tolerating clock skew within `config().window_size()`.
    pub fn authorize(&self, secret: &str, code: i64, time_ms: Option<u64>) -> Result<bool> {
        let time_ms = time_ms.map(Ok).unwrap_or_else(now_ms)?;
        totp::verify(secret, code, &self.config, time_ms)
    }

    /// Verifies `code` against `user_name`'s stored secret.
    pub fn authorize_user(&self, user_name: &str, code: i64, time_ms: Option<u64>) -> Result<bool> {
        let secret = self.load_secret(user_name)?;
        self.authorize(&secret, code, time_ms)
    }

    fn load_secret(&self, user_name: &str) -> Result<String> {
        let store = self.store().ok_or(AuthError::StoreNotConfigured)?;
        store.get_secret(user_name)?.ok_or_else(|| {
            tracing::debug!(user_name, "credential store miss");
            AuthError::StoreError(format!("no such user: {user_name}").into())
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Builder for [`Authenticator`].
#[derive(Default)]
pub struct AuthenticatorBuilder {
    config: Option<Config>,
    store: Option<Box<dyn CredentialStore>>,
}

impl AuthenticatorBuilder {
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn store(mut self, store: impl CredentialStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn build(self) -> Result<Authenticator> {
        Ok(Authenticator {
            config: self.config.unwrap_or_default(),
            rng: SecureRandom::new()?,
            explicit_store: self.store,
            resolved_store: OnceLock::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCredentialStore;

    #[test]
    fn create_then_authorize_round_trip() {
        let auth = Authenticator::new().unwrap();
        let credential = auth.create_credentials().unwrap();
        let now = 1_700_000_000_000u64;
        let code = auth.get_totp(credential.key(), Some(now)).unwrap();
        assert!(auth.authorize(credential.key(), code as i64, Some(now)).unwrap());
    }

    #[test]
    fn user_scoped_without_store_fails() {
        let auth = Authenticator::new().unwrap();
        assert!(matches!(
            auth.create_credentials_for_user("alice"),
            Err(AuthError::StoreNotConfigured)
        ));
    }

    #[test]
    fn user_scoped_with_explicit_store_round_trips() {
        let auth = Authenticator::builder()
            .store(InMemoryCredentialStore::new())
            .build()
            .unwrap();
        let credential = auth.create_credentials_for_user("alice").unwrap();
        let now = 1_700_000_000_000u64;
        let code = totp::get_totp(credential.key(), auth.config(), now).unwrap();
        assert!(auth.authorize_user("alice", code as i64, Some(now)).unwrap());
    }

    #[test]
    fn user_scoped_unknown_user_errors() {
        let auth = Authenticator::builder()
            .store(InMemoryCredentialStore::new())
            .build()
            .unwrap();
        assert!(auth.authorize_user("nobody", 123_456, None).is_err());
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Authenticator>();
    }
}
