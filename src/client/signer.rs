//! Remote signer trait and the Turnkey adapter.
//!
//! Signing is delegated to an external custodial service: the pipeline sends
//! the final 32-byte digest and receives a recoverable `(v, r, s)` triple.
//! No private key material crosses this boundary in either direction, and a
//! failed signing request is never retried — by then the nonce it was issued
//! for must be treated as consumed.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, SigningError};
use crate::types::{RecoverableSignature, StacksPublicKey};

// ============================================================================
// RemoteSigner trait
// ============================================================================

/// A service that signs raw payloads on behalf of a custodied key.
///
/// `payload_hex` is the 0x-prefixed hex of a digest that is already final;
/// implementations must not hash it again. `sign_with` names the custodied
/// public key that should produce the signature.
pub trait RemoteSigner: Send + Sync {
    /// Sign a raw payload, returning the recoverable signature.
    fn sign_payload<'a>(
        &'a self,
        payload_hex: &'a str,
        sign_with: &'a StacksPublicKey,
    ) -> Pin<Box<dyn Future<Output = Result<RecoverableSignature, SigningError>> + Send + 'a>>;
}

/// Implement `RemoteSigner` for `Arc<dyn RemoteSigner>` for convenience.
impl RemoteSigner for Arc<dyn RemoteSigner> {
    fn sign_payload<'a>(
        &'a self,
        payload_hex: &'a str,
        sign_with: &'a StacksPublicKey,
    ) -> Pin<Box<dyn Future<Output = Result<RecoverableSignature, SigningError>> + Send + 'a>> {
        (**self).sign_payload(payload_hex, sign_with)
    }
}

// ============================================================================
// TurnkeySigner
// ============================================================================

/// Connection settings for the Turnkey raw-payload signing API.
#[derive(Clone, Debug)]
pub struct TurnkeyConfig {
    /// Service base URL, e.g. `https://api.turnkey.com`.
    pub base_url: String,
    /// Organization that owns the custodied keys.
    pub organization_id: String,
    /// API token presented as a bearer credential.
    pub api_token: String,
}

impl TurnkeyConfig {
    /// Load from `TURNKEY_BASE_URL`, `TURNKEY_ORGANIZATION_ID` and
    /// `TURNKEY_API_TOKEN`.
    pub fn from_env() -> Result<Self, Error> {
        Ok(Self {
            base_url: require_env("TURNKEY_BASE_URL")?,
            organization_id: require_env("TURNKEY_ORGANIZATION_ID")?,
            api_token: require_env("TURNKEY_API_TOKEN")?,
        })
    }
}

fn require_env(name: &str) -> Result<String, Error> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{name} is not set")))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignRawPayloadRequest<'a> {
    organization_id: &'a str,
    sign_with: String,
    payload: &'a str,
    encoding: &'static str,
    hash_function: &'static str,
}

#[derive(Deserialize)]
struct SignRawPayloadResponse {
    v: String,
    r: String,
    s: String,
}

/// Adapter for Turnkey's raw-payload signing endpoint.
pub struct TurnkeySigner {
    config: TurnkeyConfig,
    http: reqwest::Client,
}

impl TurnkeySigner {
    /// Create a signer from connection settings.
    pub fn new(config: TurnkeyConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    async fn sign_raw(
        &self,
        payload_hex: &str,
        sign_with: &StacksPublicKey,
    ) -> Result<RecoverableSignature, SigningError> {
        let url = format!("{}/public/v1/submit/sign_raw_payload", self.config.base_url);
        debug!(sign_with = %sign_with, "requesting raw-payload signature");

        let request = SignRawPayloadRequest {
            organization_id: &self.config.organization_id,
            sign_with: sign_with.to_hex(),
            payload: payload_hex,
            // The payload is already the final digest: no re-hash.
            encoding: "PAYLOAD_ENCODING_HEXADECIMAL",
            hash_function: "HASH_FUNCTION_NO_OP",
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_token)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SigningError::Denied {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SignRawPayloadResponse =
            serde_json::from_str(&body).map_err(|e| SigningError::MalformedResponse(e.to_string()))?;
        let signature = parse_signature(&parsed.v, &parsed.r, &parsed.s)?;
        debug!(
            recovery_id = signature.recovery_id,
            r = %hex::encode(&signature.r[..4]),
            s = %hex::encode(&signature.s[..4]),
            "signature received"
        );
        Ok(signature)
    }
}

impl RemoteSigner for TurnkeySigner {
    fn sign_payload<'a>(
        &'a self,
        payload_hex: &'a str,
        sign_with: &'a StacksPublicKey,
    ) -> Pin<Box<dyn Future<Output = Result<RecoverableSignature, SigningError>> + Send + 'a>> {
        Box::pin(self.sign_raw(payload_hex, sign_with))
    }
}

impl std::fmt::Debug for TurnkeySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnkeySigner")
            .field("base_url", &self.config.base_url)
            .field("organization_id", &self.config.organization_id)
            .finish()
    }
}

// ============================================================================
// Response parsing
// ============================================================================

/// Assemble the signer's hex fields into a recoverable signature:
/// `v` is one byte, `r` and `s` are left-padded to 32 bytes.
fn parse_signature(v: &str, r: &str, s: &str) -> Result<RecoverableSignature, SigningError> {
    let recovery_id = u8::from_str_radix(v.strip_prefix("0x").unwrap_or(v), 16)
        .ok()
        .filter(|id| *id <= 3)
        .ok_or_else(|| SigningError::InvalidField {
            field: "v",
            value: v.to_string(),
        })?;
    Ok(RecoverableSignature {
        recovery_id,
        r: parse_component("r", r)?,
        s: parse_component("s", s)?,
    })
}

fn parse_component(field: &'static str, value: &str) -> Result<[u8; 32], SigningError> {
    let trimmed = value.strip_prefix("0x").unwrap_or(value);
    if trimmed.len() > 64 {
        return Err(SigningError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    let padded = format!("{trimmed:0>64}");
    let bytes = hex::decode(&padded).map_err(|_| SigningError::InvalidField {
        field,
        value: value.to_string(),
    })?;
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}
