//! Streaming AES-GCM.
//!
//! A message is fed through any number of `*_update` calls and closed by
//! the matching `*_final`, after which the stream is re-armed with the same
//! nonce (or, for counter nonces, the next one) and ready for the next
//! message.
//!
//! Plaintext returned by [`GcmStream::decrypt_update`] is provisional: it
//! must not be acted on until [`GcmStream::decrypt_final`] has verified the
//! tag.

use core::fmt;

use zeroize::Zeroize;

use super::{AesGcm, GCM_MAX_MESSAGE_LEN};
use crate::cipher::Direction;
use crate::config::AesConfig;
use crate::error::{AesError, Result};
use crate::ghash::GhashAccumulator;
use crate::modes::check_buffers;
use crate::util::{ct_eq, inc32, inc_be, xor_in_place};
use crate::{Block, BLOCK_SIZE, GCM_NONCE_MID_SZ};

/// Longest nonce a stream caches for re-arming.
pub const MAX_STREAM_IV_SZ: usize = BLOCK_SIZE;

/// Lifecycle of a [`GcmStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// No key.
    Uninitialized,
    /// Key set, waiting for a nonce.
    KeySet,
    /// Key and nonce set; updates are accepted.
    Ready,
}

/// Incremental AES-GCM.
pub struct GcmStream {
    gcm: Option<AesGcm>,
    config: AesConfig,
    nonce: [u8; MAX_STREAM_IV_SZ],
    nonce_len: usize,
    counter_nonce: bool,
    invocations: u64,
    armed: bool,
    e_j0: Block,
    ghash: GhashAccumulator,
    message: Option<Direction>,
}

impl fmt::Debug for GcmStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GcmStream")
            .field("state", &self.state())
            .field("nonce_len", &self.nonce_len)
            .field("counter_nonce", &self.counter_nonce)
            .field("invocations", &self.invocations)
            .finish_non_exhaustive()
    }
}

impl Default for GcmStream {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GcmStream {
    fn drop(&mut self) {
        self.nonce.zeroize();
        self.e_j0.zeroize();
    }
}

impl GcmStream {
    pub fn new() -> Self {
        Self {
            gcm: None,
            config: AesConfig::default(),
            nonce: [0; MAX_STREAM_IV_SZ],
            nonce_len: 0,
            counter_nonce: false,
            invocations: 0,
            armed: false,
            e_j0: [0; BLOCK_SIZE],
            ghash: GhashAccumulator::new(),
            message: None,
        }
    }

    pub fn with_config(config: AesConfig) -> Result<Self> {
        config.validate()?;
        let mut stream = Self::new();
        stream.config = config;
        Ok(stream)
    }

    pub fn state(&self) -> StreamState {
        match (&self.gcm, self.armed) {
            (None, _) => StreamState::Uninitialized,
            (Some(_), false) => StreamState::KeySet,
            (Some(_), true) => StreamState::Ready,
        }
    }

    /// Set the key, the nonce, or both.
    ///
    /// A new key discards the previous schedule and `H`. A new nonce is
    /// cached; with `iv == None` the cached nonce is reused. Either way any
    /// message in progress is abandoned and the stream is re-armed if it
    /// has both a key and a nonce.
    pub fn init(&mut self, key: Option<&[u8]>, iv: Option<&[u8]>) -> Result<()> {
        if let Some(iv) = iv {
            if iv.is_empty() || iv.len() > MAX_STREAM_IV_SZ {
                return Err(AesError::BadFuncArg("stream IV must be 1..=16 bytes"));
            }
        }
        if let Some(key) = key {
            match self.gcm.as_mut() {
                Some(gcm) => gcm.set_key(key)?,
                None => self.gcm = Some(AesGcm::with_config(key, self.config)?),
            }
            self.invocations = 0;
        }
        if let Some(iv) = iv {
            self.load_nonce(iv, false);
        }
        self.arm();
        Ok(())
    }

    /// Use a 12-byte nonce that advances by one (big-endian) after every
    /// [`encrypt_final`](Self::encrypt_final), so consecutive messages
    /// under this key never share a nonce.
    pub fn set_counter_iv(&mut self, iv: &[u8; GCM_NONCE_MID_SZ]) {
        self.load_nonce(iv, true);
        self.arm();
    }

    /// Nonce the next (or current) message uses.
    pub fn current_iv(&self) -> &[u8] {
        &self.nonce[..self.nonce_len]
    }

    /// Messages started under the current counter nonce sequence.
    pub fn invocations(&self) -> u64 {
        self.invocations
    }

    /// Hash `aad`, encrypt `input` into `out` and hash the ciphertext.
    pub fn encrypt_update(&mut self, out: &mut [u8], input: &[u8], aad: &[u8]) -> Result<()> {
        self.check_update(out, input, aad, Direction::Encrypt)?;
        self.begin(Direction::Encrypt)?;

        let gcm = self.gcm.as_mut().ok_or(AesError::MissingKey)?;
        self.ghash.update_aad(&gcm.ghash, aad)?;
        let out = &mut out[..input.len()];
        out.copy_from_slice(input);
        gcm.aes.apply_keystream(out);
        self.ghash.update_ciphertext(&gcm.ghash, out);
        Ok(())
    }

    /// Write the tag and re-arm for the next message.
    pub fn encrypt_final(&mut self, tag: &mut [u8]) -> Result<()> {
        self.check_final(tag.len(), Direction::Encrypt)?;
        self.begin(Direction::Encrypt)?;

        let mut s = self.finish_tag()?;
        tag.copy_from_slice(&s[..tag.len()]);
        s.zeroize();
        if self.counter_nonce {
            inc_be(&mut self.nonce[..GCM_NONCE_MID_SZ]);
        }
        self.arm();
        Ok(())
    }

    /// Hash `aad` and the ciphertext `input`, then decrypt into `out`.
    pub fn decrypt_update(&mut self, out: &mut [u8], input: &[u8], aad: &[u8]) -> Result<()> {
        self.check_update(out, input, aad, Direction::Decrypt)?;
        self.begin(Direction::Decrypt)?;

        let gcm = self.gcm.as_mut().ok_or(AesError::MissingKey)?;
        self.ghash.update_aad(&gcm.ghash, aad)?;
        self.ghash.update_ciphertext(&gcm.ghash, input);
        let out = &mut out[..input.len()];
        out.copy_from_slice(input);
        gcm.aes.apply_keystream(out);
        Ok(())
    }

    /// Verify `tag` in constant time and re-arm. Returns
    /// [`AesError::AuthenticationFailed`] on mismatch.
    pub fn decrypt_final(&mut self, tag: &[u8]) -> Result<()> {
        self.check_final(tag.len(), Direction::Decrypt)?;
        self.begin(Direction::Decrypt)?;

        let mut s = self.finish_tag()?;
        let ok = ct_eq(&s[..tag.len()], tag);
        s.zeroize();
        self.arm();
        if !ok {
            log::debug!("[KPIO AES] GCM stream tag mismatch");
            return Err(AesError::AuthenticationFailed);
        }
        Ok(())
    }

    fn check_ready(&self) -> Result<()> {
        match self.state() {
            StreamState::Uninitialized => Err(AesError::MissingKey),
            StreamState::KeySet => Err(AesError::MissingIv),
            StreamState::Ready => Ok(()),
        }
    }

    fn check_direction(&self, direction: Direction) -> Result<()> {
        match self.message {
            Some(current) if current != direction => {
                Err(AesError::BadFuncArg("message direction changed mid-stream"))
            }
            _ => Ok(()),
        }
    }

    fn check_update(
        &self,
        out: &[u8],
        input: &[u8],
        aad: &[u8],
        direction: Direction,
    ) -> Result<()> {
        self.check_ready()?;
        self.check_direction(direction)?;
        check_buffers(out, input)?;
        if !aad.is_empty() && self.ghash.ciphertext_len() > 0 {
            return Err(AesError::BadFuncArg("AAD supplied after message data"));
        }
        let total = self.ghash.ciphertext_len().saturating_add(input.len() as u64);
        if total > GCM_MAX_MESSAGE_LEN {
            return Err(AesError::BadFuncArg("GCM message too long"));
        }
        Ok(())
    }

    fn check_final(&self, tag_len: usize, direction: Direction) -> Result<()> {
        self.check_ready()?;
        self.check_direction(direction)?;
        self.config.check_gcm_tag_len(tag_len)
    }

    /// Mark the start of a message. Encryption under a counter nonce counts
    /// one invocation per message.
    fn begin(&mut self, direction: Direction) -> Result<()> {
        if self.message.is_some() {
            return Ok(());
        }
        if direction == Direction::Encrypt && self.counter_nonce {
            self.invocations = self
                .invocations
                .checked_add(1)
                .ok_or(AesError::GcmOverflow)?;
        }
        self.message = Some(direction);
        Ok(())
    }

    fn finish_tag(&mut self) -> Result<Block> {
        let gcm = self.gcm.as_ref().ok_or(AesError::MissingKey)?;
        let mut s = self.ghash.finish(&gcm.ghash);
        xor_in_place(&mut s, &self.e_j0);
        Ok(s)
    }

    fn load_nonce(&mut self, iv: &[u8], counter: bool) {
        self.nonce.zeroize();
        self.nonce[..iv.len()].copy_from_slice(iv);
        self.nonce_len = iv.len();
        self.counter_nonce = counter;
        self.invocations = 0;
    }

    /// Reset per-message state from the cached nonce: `J0`, `E(J0)`, the
    /// counter, an empty GHASH and no cached keystream.
    fn arm(&mut self) {
        self.message = None;
        self.ghash.zeroize();
        self.e_j0.zeroize();
        self.armed = false;

        let Some(gcm) = self.gcm.as_mut() else {
            return;
        };
        if self.nonce_len == 0 {
            return;
        }

        let mut j0 = gcm.initial_counter(&self.nonce[..self.nonce_len]);
        let mut e_j0 = j0;
        gcm.aes.encrypt_in_place(&mut e_j0);
        self.e_j0 = e_j0;
        inc32(&mut j0);
        gcm.aes.set_iv(Some(&j0));
        j0.zeroize();
        e_j0.zeroize();
        self.armed = true;
        log::debug!("[KPIO AES] GCM stream armed, {}-byte nonce", self.nonce_len);
    }

    #[cfg(test)]
    fn force_invocations(&mut self, n: u64) {
        self.invocations = n;
    }
}
