use crate::error::{AuthError, Result};

/// HMAC hash function used by the HOTP/TOTP computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HmacHash {
    Sha1,
    Sha256,
    Sha512,
}

impl HmacHash {
    /// The `algorithm` value used in a provisioning URI, without the `Hmac` prefix.
    pub fn uri_name(self) -> &'static str {
        match self {
            HmacHash::Sha1 => "SHA1",
            HmacHash::Sha256 => "SHA256",
            HmacHash::Sha512 => "SHA512",
        }
    }

    /// Output length in bytes of the underlying hash.
    pub(crate) fn output_len(self) -> usize {
        match self {
            HmacHash::Sha1 => 20,
            HmacHash::Sha256 => 32,
            HmacHash::Sha512 => 64,
        }
    }
}

/// Encoding used for the secret key, both on the wire (provisioning URI /
/// credential store) and when decoding a supplied secret for verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRepresentation {
    Base32,
    Base64,
}

/// Immutable parameter bundle shared by every operation in this crate.
///
/// Build one with [`ConfigBuilder`] (via [`Config::builder`]); instances are
/// cheap to clone and safe to share across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    code_digits: u32,
    time_step_ms: u64,
    window_size: u32,
    hmac_hash: HmacHash,
    key_representation: KeyRepresentation,
    key_length_bytes: usize,
    scratch_codes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            code_digits: 6,
            time_step_ms: 30_000,
            window_size: 3,
            hmac_hash: HmacHash::Sha1,
            key_representation: KeyRepresentation::Base32,
            key_length_bytes: 10,
            scratch_codes: 5,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn code_digits(&self) -> u32 {
        self.code_digits
    }

    pub fn code_modulus(&self) -> u32 {
        10u32.pow(self.code_digits)
    }

    pub fn time_step_ms(&self) -> u64 {
        self.time_step_ms
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    pub fn hmac_hash(&self) -> HmacHash {
        self.hmac_hash
    }

    pub fn key_representation(&self) -> KeyRepresentation {
        self.key_representation
    }

    pub fn key_length_bytes(&self) -> usize {
        self.key_length_bytes
    }

    pub fn scratch_codes(&self) -> usize {
        self.scratch_codes
    }
}

/// Named-parameter builder for [`Config`]. Validation happens at `build()`.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    inner: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        ConfigBuilder {
            inner: Config::default(),
        }
    }
}

impl ConfigBuilder {
    pub fn code_digits(mut self, digits: u32) -> Self {
        self.inner.code_digits = digits;
        self
    }

    pub fn time_step_ms(mut self, step_ms: u64) -> Self {
        self.inner.time_step_ms = step_ms;
        self
    }

    pub fn window_size(mut self, window: u32) -> Self {
        self.inner.window_size = window;
        self
    }

    pub fn hmac_hash(mut self, hash: HmacHash) -> Self {
        self.inner.hmac_hash = hash;
        self
    }

    pub fn key_representation(mut self, representation: KeyRepresentation) -> Self {
        self.inner.key_representation = representation;
        self
    }

    pub fn key_length_bytes(mut self, len: usize) -> Self {
        self.inner.key_length_bytes = len;
        self
    }

    pub fn scratch_codes(mut self, count: usize) -> Self {
        self.inner.scratch_codes = count;
        self
    }

    pub fn build(self) -> Result<Config> {
        let cfg = self.inner;

        if !matches!(cfg.code_digits, 6 | 7 | 8) {
            return Err(AuthError::InvalidArgument(format!(
                "code_digits must be 6, 7, or 8 (got {})",
                cfg.code_digits
            )));
        }
        if cfg.time_step_ms == 0 {
            return Err(AuthError::InvalidArgument(
                "time_step_ms must be positive".into(),
            ));
        }
        if cfg.window_size < 1 || cfg.window_size > 17 {
            return Err(AuthError::InvalidArgument(format!(
                "window_size must be in [1, 17] (got {})",
                cfg.window_size
            )));
        }
        if cfg.key_length_bytes < 10 {
            return Err(AuthError::InvalidArgument(format!(
                "key_length_bytes must be at least 10 (got {})",
                cfg.key_length_bytes
            )));
        }

        Ok(cfg)
    }
}
