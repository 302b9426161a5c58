use crate::config::Config;
use crate::error::Result;
use crate::rng::SecureRandom;
use crate::totp;

/// Smallest 8-digit value; candidates below this have a leading zero when
/// rendered and are rejected.
const MIN_SCRATCH_CODE: u32 = 10_000_000;
const SCRATCH_CODE_MODULUS: u32 = 100_000_000;

/// Immutable, once-generated bundle of a TOTP secret and its scratch codes.
///
/// The library holds no reference to a `Credential` beyond the call that
/// created it; persistence is the embedder's responsibility (typically via
/// a [`crate::store::CredentialStore`]).
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    key: String,
    validation_code_at_epoch: u32,
    scratch_codes: Vec<u32>,
    config: Config,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key", &"<redacted>")
            .field("validation_code_at_epoch", &self.validation_code_at_epoch)
            .field("scratch_codes", &vec!["<redacted>"; self.scratch_codes.len()])
            .field("config", &self.config)
            .finish()
    }
}

impl Credential {
    /// The encoded secret, per `config().key_representation()`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The TOTP code this secret would produce at UNIX time 0, kept for
    /// diagnostics and client-side sanity checks.
    pub fn validation_code_at_epoch(&self) -> u32 {
        self.validation_code_at_epoch
    }

    /// Single-use 8-digit recovery codes generated alongside the secret.
    pub fn scratch_codes(&self) -> &[u32] {
        &self.scratch_codes
    }

    /// The configuration this credential was generated under.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Generates one [`Credential`] from a single CSPRNG draw of
/// `key_length_bytes + scratch_codes * 4` bytes, plus one additional 4-byte
/// draw per rejected scratch-code candidate.
pub fn generate(rng: &SecureRandom, config: &Config) -> Result<Credential> {
    let key_len = config.key_length_bytes();
    let mut entropy = vec![0u8; key_len + config.scratch_codes() * 4];
    rng.fill_bytes(&mut entropy)?;

    let raw_secret = &entropy[..key_len];
    let key = totp::encode_secret(raw_secret, config);
    let validation_code_at_epoch = totp::totp_from_raw_secret(raw_secret, config, 0)?;

    let mut scratch_codes = Vec::with_capacity(config.scratch_codes());
    for chunk_index in 0..config.scratch_codes() {
        let start = key_len + chunk_index * 4;
        let mut chunk: [u8; 4] = entropy[start..start + 4].try_into().expect("4-byte chunk");

        let mut candidate = scratch_candidate(&chunk);
        while candidate < MIN_SCRATCH_CODE {
            tracing::debug!("rejected scratch-code candidate with leading zero, redrawing");
            chunk = rng.next_u32_bytes()?;
            candidate = scratch_candidate(&chunk);
        }
        scratch_codes.push(candidate);
    }

    Ok(Credential {
        key,
        validation_code_at_epoch,
        scratch_codes,
        config: config.clone(),
    })
}

fn scratch_candidate(chunk: &[u8; 4]) -> u32 {
    let value = u32::from_be_bytes(*chunk) & 0x7fff_ffff;
    value % SCRATCH_CODE_MODULUS
}
