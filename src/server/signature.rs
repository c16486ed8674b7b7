//! Request signatures.
//!
//! `/resolve` and `/xmltv` make the server fetch arbitrary URLs, so when a
//! key is configured callers must send a hex HMAC-SHA256 over the URL (or
//! over the EPG body). Without a key every request is accepted.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct SigningKey {
    mac: Option<HmacSha256>,
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = if self.mac.is_some() {
            "[REDACTED]"
        } else {
            "[DISABLED]"
        };
        f.debug_struct("SigningKey").field("key", &state).finish()
    }
}

impl SigningKey {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        let mac = HmacSha256::new_from_slice(key.as_ref()).expect("HMAC accepts keys of any size");
        Self { mac: Some(mac) }
    }

    pub fn disabled() -> Self {
        Self { mac: None }
    }

    /// Key from `TVGRAB_SIGNING_KEY`, hex-decoded when it looks like hex.
    pub fn from_env() -> Self {
        match std::env::var("TVGRAB_SIGNING_KEY") {
            Ok(key) if !key.is_empty() => {
                tracing::info!("Request signature validation is enabled");
                let bytes = hex::decode(&key).unwrap_or_else(|_| key.into_bytes());
                Self::new(bytes)
            }
            _ => {
                tracing::warn!(
                    "TVGRAB_SIGNING_KEY is not set, anyone can make this server fetch any URL"
                );
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.mac.is_some()
    }

    /// Hex signature of `payload`; empty when signing is disabled.
    pub fn sign(&self, payload: &[u8]) -> String {
        match &self.mac {
            Some(mac) => {
                let mut mac = mac.clone();
                mac.update(payload);
                hex::encode(mac.finalize().into_bytes())
            }
            None => String::new(),
        }
    }

    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> bool {
        let Some(mac) = &self.mac else {
            return true;
        };
        let Some(bytes) = signature.and_then(|s| hex::decode(s).ok()) else {
            return false;
        };

        let mut mac = mac.clone();
        mac.update(payload);
        mac.verify_slice(&bytes).is_ok()
    }

    /// Like [`verify`](Self::verify), as a `Result` for handlers.
    pub fn require(&self, payload: &[u8], signature: Option<&str>) -> Result<()> {
        if self.verify(payload, signature) {
            Ok(())
        } else {
            Err(Error::InvalidSignature)
        }
    }
}
