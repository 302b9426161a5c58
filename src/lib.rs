//! totp-core: a server-side TOTP/HOTP library
//!
//! This crate implements:
//! - [RFC 6238](https://datatracker.ietf.org/doc/html/rfc6238) — TOTP: Time-Based One-Time Password Algorithm
//! - [RFC 4226](https://datatracker.ietf.org/doc/html/rfc4226) — HOTP: HMAC-Based One-Time Password Algorithm
//! - [RFC 4648](https://datatracker.ietf.org/doc/html/rfc4648) — Base-N Encodings (secret/scratch-code framing)
//!
//! It provisions per-user shared secrets, derives and verifies TOTP codes
//! with clock-skew tolerance, generates single-use scratch codes, and emits
//! `otpauth://totp/...` provisioning URIs. Persistent storage, transport of
//! the provisioning URI, and QR-image rendering are treated as the
//! embedder's responsibility — see [`store::CredentialStore`].
//!
//! The [`Authenticator`] facade is the entry point most callers want;
//! [`totp`] and [`credential`] expose the lower-level primitives for
//! callers who need to vary window or time at each call.

mod config;
mod credential;
mod error;
mod facade;
mod hmac_engine;
mod rng;
mod store;
mod totp;
mod uri;

pub use config::{Config, ConfigBuilder, HmacHash, KeyRepresentation};
pub use credential::Credential;
pub use error::{AuthError, Result};
pub use facade::{Authenticator, AuthenticatorBuilder};
pub use rng::SecureRandom;
pub use store::{register_store, registered_store, CredentialStore, InMemoryCredentialStore};
pub use totp::{get_totp, verify, verify_with_window};
pub use uri::{build_uri, wrap_as_qr_url, wrap_as_qr_url_with_template, DEFAULT_QR_TEMPLATE};
