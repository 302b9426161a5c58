use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use crate::error::{AuthError, Result};

/// Capability an embedding application implements to let this crate load
/// and save per-user secrets. Operations are synchronous, matching the
/// crate's blocking computation model (§5); an embedder fronting an async
/// store is expected to bridge it (e.g. `futures::executor::block_on`) on
/// its side of the boundary.
pub trait CredentialStore: Send + Sync {
    /// Loads the encoded secret for `user_name`.
    ///
    /// Implementations should surface "no such user" as
    /// `Ok(None)`... callers that need a hard failure distinguish it via
    /// `Err(AuthError::StoreError(..))`.
    fn get_secret(&self, user_name: &str) -> Result<Option<String>>;

    /// Persists a freshly minted credential for `user_name`.
    fn save(
        &self,
        user_name: &str,
        encoded_secret: &str,
        validation_code: u32,
        scratch_codes: &[u32],
    ) -> Result<()>;
}

/// Process-wide registrar used for late-bound store discovery, without any
/// reflection or dynamic loading: an embedder calls [`register_store`] once
/// at startup, and any [`crate::Authenticator`] built without an explicit
/// store falls back to whatever is registered here.
static REGISTRY: OnceLock<Box<dyn CredentialStore>> = OnceLock::new();

/// Registers the process-wide credential store, if one has not already been
/// registered. Returns `false` (and leaves the existing registration in
/// place) if called more than once.
pub fn register_store(store: impl CredentialStore + 'static) -> bool {
    REGISTRY.set(Box::new(store)).is_ok()
}

/// Looks up the process-wide store registered via [`register_store`].
pub fn registered_store() -> Option<&'static dyn CredentialStore> {
    REGISTRY.get().map(|boxed| boxed.as_ref())
}

/// An in-memory reference implementation of [`CredentialStore`], useful for
/// tests and as a starting point for embedders wiring in real persistence.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

struct StoredEntry {
    secret: String,
    #[allow(dead_code)]
    validation_code: u32,
    #[allow(dead_code)]
    scratch_codes: Vec<u32>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get_secret(&self, user_name: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AuthError::StoreError("in-memory store lock poisoned".into()))?;
        Ok(entries.get(user_name).map(|e| e.secret.clone()))
    }

    fn save(
        &self,
        user_name: &str,
        encoded_secret: &str,
        validation_code: u32,
        scratch_codes: &[u32],
    ) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuthError::StoreError("in-memory store lock poisoned".into()))?;
        entries.insert(
            user_name.to_string(),
            StoredEntry {
                secret: encoded_secret.to_string(),
                validation_code,
                scratch_codes: scratch_codes.to_vec(),
            },
        );
        Ok(())
    }
}
