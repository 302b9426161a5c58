use std::sync::RwLock;

use rand::rngs::{OsRng, StdRng};
use rand::{RngCore, SeedableRng};

use crate::error::{AuthError, Result};

/// Byte-producing calls allowed before the generator is rebuilt from a fresh
/// OS entropy draw.
const MAX_OPERATIONS: u64 = 1_000_000;

struct RngState {
    rng: StdRng,
    operations: u64,
}

/// Thread-safe source of uniform random bytes with automatic reseeding.
///
/// Multiple threads may call [`SecureRandom::fill_bytes`] concurrently; a
/// reseed (triggered every [`MAX_OPERATIONS`] draws) is mutually exclusive
/// with all draws via the same lock, since every draw mutates the generator
/// in place regardless.
pub struct SecureRandom {
    state: RwLock<RngState>,
}

impl SecureRandom {
    /// Builds a wrapper around the system default algorithm and provider.
    pub fn new() -> Result<Self> {
        Self::with_algorithm(None, None)
    }

    /// Builds a wrapper, validating the (optional) algorithm and provider
    /// names against the set this crate knows how to honor.
    ///
    /// Rust has no JCE-style runtime algorithm/provider registry; these
    /// parameters exist for API parity with embedders migrating from such a
    /// system. Anything other than the defaults below fails with
    /// [`AuthError::ConfigurationError`] rather than being silently ignored.
    pub fn with_algorithm(algorithm: Option<&str>, provider: Option<&str>) -> Result<Self> {
        if let Some(name) = algorithm {
            if !name.eq_ignore_ascii_case("default") && !name.eq_ignore_ascii_case("SHA1PRNG") {
                return Err(AuthError::ConfigurationError(format!(
                    "unknown CSPRNG algorithm: {name}"
                )));
            }
        }
        if let Some(name) = provider {
            if !name.eq_ignore_ascii_case("system") {
                return Err(AuthError::ConfigurationError(format!(
                    "unknown CSPRNG provider: {name}"
                )));
            }
        }

        Ok(SecureRandom {
            state: RwLock::new(RngState {
                rng: Self::seed()?,
                operations: 0,
            }),
        })
    }

    fn seed() -> Result<StdRng> {
        StdRng::from_rng(OsRng)
            .map_err(|e| AuthError::ConfigurationError(format!("failed to seed CSPRNG: {e}")))
    }

    /// Fills `buf` with random bytes, reseeding first if the operation
    /// threshold has been reached.
    pub fn fill_bytes(&self, buf: &mut [u8]) -> Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| AuthError::ConfigurationError("CSPRNG lock poisoned".into()))?;

        if state.operations >= MAX_OPERATIONS {
            state.rng = Self::seed()?;
            state.operations = 0;
            tracing::debug!("CSPRNG reseeded after reaching operation threshold");
        }

        state.rng.fill_bytes(buf);
        state.operations += 1;
        Ok(())
    }

    /// Draws a single fresh 4-byte chunk, used when a scratch-code candidate
    /// is rejected and must be redrawn.
    pub fn next_u32_bytes(&self) -> Result<[u8; 4]> {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf)?;
        Ok(buf)
    }
}

impl Default for SecureRandom {
    fn default() -> Self {
        Self::new().expect("system entropy source must be available")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_requested_length() {
        let rng = SecureRandom::new().unwrap();
        let mut buf = [0u8; 32];
        rng.fill_bytes(&mut buf).unwrap();
        assert_ne!(buf, [0u8; 32]);
    }

    #[test]
    fn rejects_unknown_algorithm() {
        assert!(SecureRandom::with_algorithm(Some("quantum-foo"), None).is_err());
        assert!(SecureRandom::with_algorithm(Some("default"), Some("system")).is_ok());
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SecureRandom>();
    }
}
