//! AES-GCM authenticated encryption (NIST SP 800-38D).
//!
//! [`AesGcm`] seals and opens whole messages, [`GcmStream`] processes a
//! message in pieces, and [`Gmac`] authenticates AAD alone.

mod gmac;
mod stream;

pub use gmac::{gmac_verify, Gmac};
pub use stream::{GcmStream, StreamState};

use zeroize::Zeroize;

use crate::cipher::{Aes, Direction};
use crate::config::AesConfig;
use crate::error::{AesError, Result};
use crate::ghash::{ghash_block, GhashKey};
use crate::modes::check_buffers;
use crate::util::{ct_eq, inc32, xor_in_place};
use crate::{Block, BLOCK_SIZE, GCM_NONCE_MID_SZ};

/// Longest plaintext GCM allows under one IV: 2^39 - 256 bits.
pub const GCM_MAX_MESSAGE_LEN: u64 = (1 << 36) - 32;

/// AES-GCM keyed state.
///
/// The hash subkey `H = E_K(0^128)` is derived once when the key is set.
#[derive(Debug)]
pub struct AesGcm {
    pub(crate) aes: Aes,
    pub(crate) ghash: GhashKey,
}

fn hash_key(aes: &Aes) -> GhashKey {
    let mut h = [0u8; BLOCK_SIZE];
    aes.encrypt_in_place(&mut h);
    let key = GhashKey::new(&h, aes.config().resolve_ghash());
    h.zeroize();
    key
}

impl AesGcm {
    pub fn new(key: &[u8]) -> Result<Self> {
        Self::with_config(key, AesConfig::default())
    }

    pub fn with_config(key: &[u8], config: AesConfig) -> Result<Self> {
        let aes = Aes::with_config(key, None, Direction::Encrypt, config)?;
        let ghash = hash_key(&aes);
        Ok(Self { aes, ghash })
    }

    /// Replace the key; the old schedule and `H` are zeroed.
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        self.aes.set_key(key, None, Direction::Encrypt)?;
        self.ghash = hash_key(&self.aes);
        Ok(())
    }

    pub fn config(&self) -> &AesConfig {
        self.aes.config()
    }

    /// Encrypt `input` into `out` and write a tag of `tag.len()` bytes.
    pub fn encrypt(
        &self,
        out: &mut [u8],
        input: &[u8],
        iv: &[u8],
        tag: &mut [u8],
        aad: &[u8],
    ) -> Result<()> {
        self.check_args(out, input, iv, tag.len())?;

        let j0 = self.initial_counter(iv);
        let out = &mut out[..input.len()];
        out.copy_from_slice(input);
        let mut ctr = j0;
        inc32(&mut ctr);
        self.aes.ctr_xor(&mut ctr, out, inc32);

        let mut s = self.tag_block(&j0, aad, out);
        tag.copy_from_slice(&s[..tag.len()]);
        s.zeroize();
        ctr.zeroize();
        Ok(())
    }

    /// Verify `tag` over `aad` and `input`, then decrypt into `out`.
    ///
    /// The tag is checked before any plaintext is produced. On mismatch the
    /// first `input.len()` bytes of `out` are zeroed and
    /// [`AesError::AuthenticationFailed`] is returned.
    pub fn decrypt(
        &self,
        out: &mut [u8],
        input: &[u8],
        iv: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<()> {
        self.check_args(out, input, iv, tag.len())?;

        let j0 = self.initial_counter(iv);
        let mut s = self.tag_block(&j0, aad, input);
        let ok = ct_eq(&s[..tag.len()], tag);
        s.zeroize();
        let out = &mut out[..input.len()];
        if !ok {
            out.fill(0);
            log::debug!("[KPIO AES] GCM tag mismatch");
            return Err(AesError::AuthenticationFailed);
        }

        out.copy_from_slice(input);
        let mut ctr = j0;
        inc32(&mut ctr);
        self.aes.ctr_xor(&mut ctr, out, inc32);
        ctr.zeroize();
        Ok(())
    }

    fn check_args(&self, out: &[u8], input: &[u8], iv: &[u8], tag_len: usize) -> Result<()> {
        if iv.is_empty() {
            return Err(AesError::BadFuncArg("GCM IV must not be empty"));
        }
        self.config().check_gcm_tag_len(tag_len)?;
        check_buffers(out, input)?;
        if input.len() as u64 > GCM_MAX_MESSAGE_LEN {
            return Err(AesError::BadFuncArg("GCM message too long"));
        }
        self.aes.check_rounds()
    }

    /// `J0`: `IV || 0^31 || 1` for a 12-byte IV, `GHASH(IV)` otherwise.
    pub(crate) fn initial_counter(&self, iv: &[u8]) -> Block {
        let mut j0 = [0u8; BLOCK_SIZE];
        if iv.len() == GCM_NONCE_MID_SZ {
            j0[..GCM_NONCE_MID_SZ].copy_from_slice(iv);
            j0[BLOCK_SIZE - 1] = 1;
            j0
        } else {
            ghash_block(&self.ghash, &[], iv)
        }
    }

    /// `GHASH(A, C) ^ E(J0)`.
    fn tag_block(&self, j0: &Block, aad: &[u8], ciphertext: &[u8]) -> Block {
        let mut s = ghash_block(&self.ghash, aad, ciphertext);
        let mut mask = *j0;
        self.aes.encrypt_in_place(&mut mask);
        xor_in_place(&mut s, &mask);
        mask.zeroize();
        s
    }
}
