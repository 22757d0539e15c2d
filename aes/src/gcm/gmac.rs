//! GMAC: GCM with an empty message, authenticating AAD only.

use super::AesGcm;
use crate::config::AesConfig;
use crate::error::Result;

/// GMAC keyed state.
#[derive(Debug)]
pub struct Gmac {
    gcm: AesGcm,
}

impl Gmac {
    pub fn new(key: &[u8]) -> Result<Self> {
        Self::with_config(key, AesConfig::default())
    }

    pub fn with_config(key: &[u8], config: AesConfig) -> Result<Self> {
        Ok(Self {
            gcm: AesGcm::with_config(key, config)?,
        })
    }

    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        self.gcm.set_key(key)
    }

    /// Tag `aad` under `iv`, writing `tag.len()` bytes.
    pub fn compute(&self, iv: &[u8], aad: &[u8], tag: &mut [u8]) -> Result<()> {
        self.gcm.encrypt(&mut [], &[], iv, tag, aad)
    }

    /// Check `tag` over `aad`; `AuthenticationFailed` on mismatch.
    pub fn verify(&self, iv: &[u8], aad: &[u8], tag: &[u8]) -> Result<()> {
        self.gcm.decrypt(&mut [], &[], iv, tag, aad)
    }
}

/// One-shot GMAC verification.
pub fn gmac_verify(key: &[u8], iv: &[u8], aad: &[u8], tag: &[u8]) -> Result<()> {
    Gmac::new(key)?.verify(iv, aad, tag)
}
