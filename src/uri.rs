use percent_encoding::{AsciiSet, CONTROLS};
use url::form_urlencoded;

use crate::config::Config;
use crate::error::{AuthError, Result};

/// Characters a path segment may contain unescaped per RFC 3986 `pchar`:
/// unreserved, sub-delims, `:`, and `@`. Everything else — including space —
/// is percent-encoded.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

fn encode_path_segment(s: &str) -> String {
    percent_encoding::utf8_percent_encode(s, PATH_SEGMENT).to_string()
}

fn encode_query_value(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

/// Builds the `otpauth://totp/...` provisioning URI of §4.6/§6.
///
/// `encoded_secret` is the already-encoded secret string (e.g. a
/// [`crate::Credential::key`]). `issuer` and `account_name` must not contain
/// `':'`; `account_name` must be non-empty. Parameters are emitted in the
/// fixed order `secret`, `issuer` (if present), `algorithm`, `digits`,
/// `period`.
pub fn build_uri(
    config: &Config,
    encoded_secret: &str,
    issuer: Option<&str>,
    account_name: &str,
) -> Result<String> {
    if account_name.is_empty() {
        return Err(AuthError::InvalidArgument(
            "account_name must not be empty".into(),
        ));
    }
    if account_name.contains(':') {
        return Err(AuthError::InvalidArgument(
            "account_name must not contain ':'".into(),
        ));
    }
    if let Some(issuer) = issuer {
        if issuer.contains(':') {
            return Err(AuthError::InvalidArgument(
                "issuer must not contain ':'".into(),
            ));
        }
    }

    let label = match issuer {
        Some(issuer) => format!(
            "{}:{}",
            encode_path_segment(issuer),
            encode_path_segment(account_name)
        ),
        None => encode_path_segment(account_name),
    };

    let mut uri = format!("otpauth://totp/{label}?secret={encoded_secret}");
    if let Some(issuer) = issuer {
        uri.push_str("&issuer=");
        uri.push_str(&encode_query_value(issuer));
    }
    uri.push_str("&algorithm=");
    uri.push_str(config.hmac_hash().uri_name());
    uri.push_str("&digits=");
    uri.push_str(&config.code_digits().to_string());
    uri.push_str("&period=");
    uri.push_str(&(config.time_step_ms() / 1000).to_string());

    Ok(uri)
}

/// Default QR-wrapper endpoint. Deprecated by its provider since 2019; kept
/// for interoperability with existing clients. Prefer
/// [`wrap_as_qr_url_with_template`] with a provider of your own.
pub const DEFAULT_QR_TEMPLATE: &str =
    "https://chart.googleapis.com/chart?chs=200x200&chld=M%7C0&cht=qr&chl={uri}";

/// Wraps an `otpauth://...` URI as a Google Charts QR-code image URL.
pub fn wrap_as_qr_url(otpauth_uri: &str) -> String {
    wrap_as_qr_url_with_template(otpauth_uri, DEFAULT_QR_TEMPLATE)
}

/// Wraps an `otpauth://...` URI using a caller-supplied template containing
/// the literal placeholder `{uri}`, percent-encoding the otpauth URI as a
/// single query value before substitution.
pub fn wrap_as_qr_url_with_template(otpauth_uri: &str, template: &str) -> String {
    let encoded = encode_query_value(otpauth_uri);
    template.replace("{uri}", &encoded)
}
