use base32::Alphabet as Base32Alphabet;

use crate::config::{Config, KeyRepresentation};
use crate::error::{AuthError, Result};
use crate::hmac_engine;

/// Derives the HOTP counter `T = floor(t_ms / time_step_ms)` and encodes it
/// big-endian as the 8-byte HMAC message.
fn counter_bytes(t_ms: u64, time_step_ms: u64) -> [u8; 8] {
    let counter = t_ms / time_step_ms;
    counter.to_be_bytes()
}

/// RFC 4226 §5.3 dynamic truncation, given the raw HMAC output.
fn dynamic_truncate(mac: &[u8], code_modulus: u32) -> u32 {
    let offset = (mac[mac.len() - 1] & 0x0f) as usize;
    let bin_code = ((mac[offset] & 0x7f) as u32) << 24
        | (mac[offset + 1] as u32) << 16
        | (mac[offset + 2] as u32) << 8
        | (mac[offset + 3] as u32);
    bin_code % code_modulus
}

/// Computes the TOTP code for a raw (already-decoded) secret at `t_ms`.
pub(crate) fn totp_from_raw_secret(raw_secret: &[u8], config: &Config, t_ms: u64) -> Result<u32> {
    let message = counter_bytes(t_ms, config.time_step_ms());
    let mac = hmac_engine::hmac(config.hmac_hash(), raw_secret, &message)?;
    Ok(dynamic_truncate(&mac, config.code_modulus()))
}

/// Decodes an encoded secret string per `config`'s key representation.
pub(crate) fn decode_secret(encoded: &str, config: &Config) -> Result<Vec<u8>> {
    match config.key_representation() {
        KeyRepresentation::Base32 => {
            base32::decode(Base32Alphabet::RFC4648 { padding: false }, encoded)
                .or_else(|| base32::decode(Base32Alphabet::RFC4648 { padding: true }, encoded))
                .ok_or_else(|| AuthError::InvalidSecret("malformed base32 secret".into()))
        }
        KeyRepresentation::Base64 => {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(encoded)
                .map_err(|e| AuthError::InvalidSecret(format!("malformed base64 secret: {e}")))
        }
    }
}

/// Encodes a raw secret per `config`'s key representation.
pub(crate) fn encode_secret(raw: &[u8], config: &Config) -> String {
    match config.key_representation() {
        KeyRepresentation::Base32 => {
            base32::encode(Base32Alphabet::RFC4648 { padding: false }, raw)
        }
        KeyRepresentation::Base64 => {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD.encode(raw)
        }
    }
}

/// Returns the TOTP code at `t_ms` for an encoded secret.
pub fn get_totp(secret: &str, config: &Config, t_ms: u64) -> Result<u32> {
    let raw = decode_secret(secret, config)?;
    totp_from_raw_secret(&raw, config, t_ms)
}

/// Offsets (in units of `time_step_ms`) checked around the current counter
/// for a given `window_size`, per the newer (count-based, not radius-based)
/// semantics this crate adopts: `[-floor((window-1)/2), floor(window/2)]`.
fn window_offsets(window_size: u32) -> std::ops::RangeInclusive<i64> {
    let window = window_size as i64;
    let low = -((window - 1) / 2);
    let high = window / 2;
    low..=high
}

/// Verifies a supplied TOTP `code` against `secret` at `t_ms`, tolerating
/// clock skew within `config`'s default window ([`Config::window_size`]).
///
/// Returns `Ok(false)` for a structurally out-of-range code or a non-match;
/// returns `Err` only for misconfiguration (bad window, undecodable secret,
/// unresolvable hash/RNG) per the crate's error propagation policy.
pub fn verify(secret: &str, code: i64, config: &Config, t_ms: u64) -> Result<bool> {
    verify_with_window(secret, code, config, t_ms, config.window_size())
}

/// Verifies a supplied TOTP `code`, overriding the number of intervals
/// checked on each side of `t_ms` (see [`Config::window_size`] for the
/// shared default).
///
/// Implements §4.3.3 exactly: an out-of-range code is rejected before the
/// window is even inspected (no HMAC is ever invoked in that case); a
/// window outside `[1, 17]` is rejected with
/// [`AuthError::InvalidArgument`].
pub fn verify_with_window(
    secret: &str,
    code: i64,
    config: &Config,
    t_ms: u64,
    window: u32,
) -> Result<bool> {
    if code <= 0 || code >= config.code_modulus() as i64 {
        return Ok(false);
    }

    if window < 1 || window > 17 {
        return Err(AuthError::InvalidArgument(format!(
            "window must be in [1, 17] (got {window})"
        )));
    }

    let raw = decode_secret(secret, config)?;
    let code = code as u32;
    let step = config.time_step_ms();
    let base_counter = (t_ms / step) as i64;

    for offset in window_offsets(window) {
        let counter = base_counter + offset;
        if counter < 0 {
            continue;
        }
        let t_candidate = (counter as u64) * step;
        let candidate = totp_from_raw_secret(&raw, config, t_candidate)?;
        if candidate == code {
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HmacHash;

    fn config_with(digits: u32, hash: HmacHash) -> Config {
        Config::builder()
            .code_digits(digits)
            .hmac_hash(hash)
            .time_step_ms(30_000)
            .build()
            .unwrap()
    }

    fn base32_of_ascii(s: &str) -> String {
        base32::encode(Base32Alphabet::RFC4648 { padding: false }, s.as_bytes())
    }

    // RFC 6238 Appendix B, SHA1, 8 digits, T = 59.
    #[test]
    fn rfc6238_vector_s1() {
        let secret = base32_of_ascii("12345678901234567890");
        let cfg = config_with(8, HmacHash::Sha1);
        let code = get_totp(&secret, &cfg, 59_000).unwrap();
        assert_eq!(code, 94_287_082);
    }

    // RFC 6238 Appendix B, SHA1, 8 digits, T = 1111111109.
    #[test]
    fn rfc6238_vector_s2() {
        let secret = base32_of_ascii("12345678901234567890");
        let cfg = config_with(8, HmacHash::Sha1);
        let code = get_totp(&secret, &cfg, 1_111_111_109_000).unwrap();
        assert_eq!(code, 7_081_804);
    }

    // RFC 6238 Appendix B, SHA256, 8 digits, T = 59.
    #[test]
    fn rfc6238_vector_s3() {
        let secret = base32_of_ascii("12345678901234567890123456789012");
        let cfg = config_with(8, HmacHash::Sha256);
        let code = get_totp(&secret, &cfg, 59_000).unwrap();
        assert_eq!(code, 46_119_246);
    }

    #[test]
    fn round_trip_any_time_any_window() {
        let secret = base32_of_ascii("12345678901234567890");
        let cfg = config_with(6, HmacHash::Sha1);
        for t in [0u64, 1_000, 1_700_000_000_000] {
            let code = get_totp(&secret, &cfg, t).unwrap();
            assert!(verify(&secret, code as i64, &cfg, t).unwrap());
        }
    }

    #[test]
    fn window_centeredness() {
        let secret = base32_of_ascii("12345678901234567890");
        let step = 30_000u64;
        let base_t = 1_700_000_000_000u64 - (1_700_000_000_000u64 % step);
        let cfg = config_with(6, HmacHash::Sha1);
        let cfg_w4 = Config::builder()
            .time_step_ms(step)
            .window_size(4)
            .build()
            .unwrap();

        for k in -2i64..=3 {
            let t_shifted = (base_t as i64 + k * step as i64) as u64;
            let code = get_totp(&secret, &cfg, base_t).unwrap();
            // window=3 accepts k in [-1, 1]
            let accepted_w3 = verify(&secret, code as i64, &cfg, t_shifted).unwrap();
            assert_eq!(accepted_w3, (-1..=1).contains(&k));
            // window=4 accepts k in [-1, 2]
            let accepted_w4 = verify(&secret, code as i64, &cfg_w4, t_shifted).unwrap();
            assert_eq!(accepted_w4, (-1..=2).contains(&k));
        }
    }

    #[test]
    fn rejects_out_of_range_codes_without_error() {
        let secret = base32_of_ascii("12345678901234567890");
        let cfg = config_with(6, HmacHash::Sha1);
        assert_eq!(verify(&secret, 0, &cfg, 0).unwrap(), false);
        assert_eq!(
            verify(&secret, cfg.code_modulus() as i64, &cfg, 0).unwrap(),
            false
        );
    }

    #[test]
    fn rejects_bad_window_with_error() {
        let secret = base32_of_ascii("12345678901234567890");
        let cfg = config_with(6, HmacHash::Sha1);
        let code = get_totp(&secret, &cfg, 0).unwrap();
        assert!(verify_with_window(&secret, code as i64, &cfg, 0, 0).is_err());
        assert!(verify_with_window(&secret, code as i64, &cfg, 0, 18).is_err());
        assert!(verify_with_window(&secret, code as i64, &cfg, 0, 17).is_ok());
    }

    #[test]
    fn range_property_holds_for_generated_codes() {
        let secret = base32_of_ascii("12345678901234567890");
        for digits in [6u32, 7, 8] {
            let cfg = config_with(digits, HmacHash::Sha1);
            for t in [0u64, 59_000, 123_456_789_000] {
                let code = get_totp(&secret, &cfg, t).unwrap();
                assert!(code < cfg.code_modulus());
            }
        }
    }

    #[test]
    fn rejects_malformed_secret() {
        let cfg = config_with(6, HmacHash::Sha1);
        assert!(get_totp("not valid base32!!!", &cfg, 0).is_err());
    }
}
