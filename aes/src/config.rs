//! Runtime configuration for the AES engine.
//!
//! Behaviour that would otherwise hang off build flags is chosen here once,
//! when a cipher object is created.

use crate::cipher::Backend;
use crate::error::{AesError, Result};
use crate::ghash::GhashMethod;
use crate::{BLOCK_SIZE, MAX_AUTH_TAG_SZ, MIN_AUTH_TAG_SZ};

/// How ECB/CBC report input that is not a whole number of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// Report [`AesError::BadLength`].
    #[default]
    BadLength,
    /// Report [`AesError::BadFuncArg`].
    BadFuncArg,
}

impl LengthPolicy {
    pub(crate) fn check(self, len: usize) -> Result<()> {
        if len.is_multiple_of(BLOCK_SIZE) {
            return Ok(());
        }
        match self {
            LengthPolicy::BadLength => Err(AesError::BadLength(len)),
            LengthPolicy::BadFuncArg => Err(AesError::BadFuncArg(
                "length is not a multiple of the block size",
            )),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AesConfig {
    /// Error kind for ECB/CBC length violations.
    pub length_policy: LengthPolicy,
    /// Shortest GCM/GMAC tag accepted, in bytes.
    pub min_tag_len: usize,
    /// Pin a block backend, or `None` to detect.
    pub backend: Option<Backend>,
    /// Pin a GHASH method, or `None` to detect.
    pub ghash: Option<GhashMethod>,
}

impl Default for AesConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AesConfig {
    /// Defaults: `BadLength`, 12-byte minimum tag, detected backends.
    pub const fn new() -> Self {
        Self {
            length_policy: LengthPolicy::BadLength,
            min_tag_len: MIN_AUTH_TAG_SZ,
            backend: None,
            ghash: None,
        }
    }

    pub const fn with_length_policy(mut self, policy: LengthPolicy) -> Self {
        self.length_policy = policy;
        self
    }

    pub const fn with_min_tag_len(mut self, len: usize) -> Self {
        self.min_tag_len = len;
        self
    }

    pub const fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub const fn with_ghash(mut self, method: GhashMethod) -> Self {
        self.ghash = Some(method);
        self
    }

    /// Check the configuration can be honoured on this machine.
    pub fn validate(&self) -> Result<()> {
        if !(4..=MAX_AUTH_TAG_SZ).contains(&self.min_tag_len) {
            return Err(AesError::BadFuncArg("minimum tag length must be 4..=16"));
        }
        if let Some(backend) = self.backend {
            if !backend.is_available() {
                return Err(AesError::BadFuncArg("block backend not available"));
            }
        }
        if let Some(method) = self.ghash {
            if !method.is_available() {
                return Err(AesError::BadFuncArg("GHASH method not available"));
            }
        }
        Ok(())
    }

    pub(crate) fn resolve_backend(&self) -> Backend {
        self.backend.unwrap_or_else(Backend::detect)
    }

    pub(crate) fn resolve_ghash(&self) -> GhashMethod {
        self.ghash.unwrap_or_else(GhashMethod::detect)
    }

    /// Tag length accepted by GCM and GMAC under this configuration.
    pub(crate) fn check_gcm_tag_len(&self, len: usize) -> Result<()> {
        if len < self.min_tag_len || len > MAX_AUTH_TAG_SZ {
            return Err(AesError::BadFuncArg("GCM tag length out of range"));
        }
        Ok(())
    }
}
