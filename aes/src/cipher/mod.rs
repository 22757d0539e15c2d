//! Block cipher core: key setup, backend selection and single-block
//! transforms.

mod armv8;
mod key_schedule;
mod soft;
mod tables;

use core::fmt;

use spin::Once;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub use armv8::Armv8;
pub use key_schedule::KeySchedule;
pub use soft::Software;

use crate::config::AesConfig;
use crate::error::{AesError, Result};
use crate::util::{inc32, xor_in_place};
use crate::{Block, BLOCK_SIZE};

/// Which way a key schedule runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// A block-cipher implementation.
///
/// Chaining modes and AEAD constructions are written once against this
/// trait. `set_key` has a default; backends only differ in how a block
/// is transformed.
pub trait BlockBackend {
    /// Build the round keys for `key`.
    fn set_key(&self, key: &[u8], direction: Direction) -> Result<KeySchedule> {
        KeySchedule::expand(key, direction)
    }

    /// Encrypt one block in place with an encryption schedule.
    fn encrypt_block(&self, schedule: &KeySchedule, block: &mut Block);

    /// Decrypt one block in place with a decryption schedule.
    fn decrypt_block(&self, schedule: &KeySchedule, block: &mut Block);
}

/// Available block backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Portable table implementation.
    Software,
    /// ARMv8 Crypto Extensions.
    Armv8,
}

static DETECTED: Once<Backend> = Once::new();

impl Backend {
    /// Pick the fastest backend this CPU supports. Decided once per process.
    pub fn detect() -> Backend {
        *DETECTED.call_once(|| {
            let backend = if armv8::available() {
                Backend::Armv8
            } else {
                Backend::Software
            };
            log::info!("[KPIO AES] Block backend: {:?}", backend);
            backend
        })
    }

    pub fn is_available(self) -> bool {
        match self {
            Backend::Software => true,
            Backend::Armv8 => armv8::available(),
        }
    }
}

impl BlockBackend for Backend {
    #[inline]
    fn encrypt_block(&self, schedule: &KeySchedule, block: &mut Block) {
        match self {
            Backend::Software => Software.encrypt_block(schedule, block),
            Backend::Armv8 => Armv8.encrypt_block(schedule, block),
        }
    }

    #[inline]
    fn decrypt_block(&self, schedule: &KeySchedule, block: &mut Block) {
        match self {
            Backend::Software => Software.decrypt_block(schedule, block),
            Backend::Armv8 => Armv8.decrypt_block(schedule, block),
        }
    }
}

/// AES cipher state.
///
/// Holds one key schedule plus the 16-byte register the chaining modes
/// carry between calls (CBC IV, CTR counter) and the CTR keystream left
/// over from a partial block.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Aes {
    schedule: KeySchedule,
    #[zeroize(skip)]
    direction: Direction,
    #[zeroize(skip)]
    backend: Backend,
    #[zeroize(skip)]
    config: AesConfig,
    pub(crate) reg: Block,
    pub(crate) tmp: Block,
    pub(crate) left: usize,
}

impl fmt::Debug for Aes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aes")
            .field("rounds", &self.schedule.rounds())
            .field("direction", &self.direction)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

impl Aes {
    /// Set up a cipher with the default configuration.
    pub fn new(key: &[u8], iv: Option<&Block>, direction: Direction) -> Result<Self> {
        Self::with_config(key, iv, direction, AesConfig::default())
    }

    pub fn with_config(
        key: &[u8],
        iv: Option<&Block>,
        direction: Direction,
        config: AesConfig,
    ) -> Result<Self> {
        config.validate()?;
        let backend = config.resolve_backend();
        let schedule = backend.set_key(key, direction)?;
        log::debug!(
            "[KPIO AES] Key set: {} rounds, {:?}, {:?}",
            schedule.rounds(),
            direction,
            backend
        );

        let mut aes = Self {
            schedule,
            direction,
            backend,
            config,
            reg: [0; BLOCK_SIZE],
            tmp: [0; BLOCK_SIZE],
            left: 0,
        };
        aes.set_iv(iv);
        Ok(aes)
    }

    /// Replace the key. The previous schedule and keystream cache are
    /// zeroed; on error the old key stays in place.
    pub fn set_key(&mut self, key: &[u8], iv: Option<&Block>, direction: Direction) -> Result<()> {
        let schedule = self.backend.set_key(key, direction)?;
        self.schedule.zeroize();
        self.schedule = schedule;
        self.direction = direction;
        self.set_iv(iv);
        log::debug!(
            "[KPIO AES] Re-keyed: {} rounds, {:?}",
            self.schedule.rounds(),
            direction
        );
        Ok(())
    }

    /// Load the register, or zero it when `iv` is `None`. Any CTR keystream
    /// left from a previous partial block is discarded.
    pub fn set_iv(&mut self, iv: Option<&Block>) {
        match iv {
            Some(iv) => self.reg = *iv,
            None => self.reg.zeroize(),
        }
        self.tmp.zeroize();
        self.left = 0;
    }

    /// Current register (next CBC IV or CTR counter).
    pub fn iv(&self) -> &Block {
        &self.reg
    }

    pub fn rounds(&self) -> usize {
        self.schedule.rounds()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn config(&self) -> &AesConfig {
        &self.config
    }

    /// Encrypt a single block.
    pub fn encrypt_block(&self, input: &Block, output: &mut Block) -> Result<()> {
        self.require(Direction::Encrypt)?;
        self.check_rounds()?;
        *output = *input;
        self.encrypt_in_place(output);
        Ok(())
    }

    /// Decrypt a single block. Needs a [`Direction::Decrypt`] schedule.
    pub fn decrypt_block(&self, input: &Block, output: &mut Block) -> Result<()> {
        self.require_decrypt()?;
        self.check_rounds()?;
        *output = *input;
        self.decrypt_in_place(output);
        Ok(())
    }

    pub(crate) fn require(&self, direction: Direction) -> Result<()> {
        if self.direction != direction {
            return Err(match direction {
                Direction::Encrypt => AesError::BadFuncArg("key schedule is set up for decryption"),
                Direction::Decrypt => AesError::BadFuncArg("key schedule is set up for encryption"),
            });
        }
        Ok(())
    }

    pub(crate) fn require_decrypt(&self) -> Result<()> {
        if !cfg!(feature = "aes-decrypt") {
            return Err(AesError::DecryptionNotSupported);
        }
        self.require(Direction::Decrypt)
    }

    pub(crate) fn check_rounds(&self) -> Result<()> {
        self.schedule.check_rounds()
    }

    #[inline]
    pub(crate) fn encrypt_in_place(&self, block: &mut Block) {
        self.backend.encrypt_block(&self.schedule, block);
    }

    #[inline]
    pub(crate) fn decrypt_in_place(&self, block: &mut Block) {
        self.backend.decrypt_block(&self.schedule, block);
    }

    /// Counter-mode keystream over `buf` starting at `counter`, advancing
    /// the counter with `increment` after every block. Keeps no leftover.
    pub(crate) fn ctr_xor(
        &self,
        counter: &mut Block,
        buf: &mut [u8],
        increment: impl Fn(&mut Block),
    ) {
        for chunk in buf.chunks_mut(BLOCK_SIZE) {
            let mut ks = *counter;
            self.encrypt_in_place(&mut ks);
            xor_in_place(chunk, &ks);
            increment(counter);
            ks.zeroize();
        }
    }

    /// CTR over the register with the leftover-keystream cache.
    pub(crate) fn apply_keystream(&mut self, buf: &mut [u8]) {
        let mut pos = 0;
        while self.left > 0 && pos < buf.len() {
            buf[pos] ^= self.tmp[BLOCK_SIZE - self.left];
            self.left -= 1;
            pos += 1;
        }
        if self.left == 0 {
            self.tmp.zeroize();
        }

        for chunk in buf[pos..].chunks_mut(BLOCK_SIZE) {
            let mut ks = self.reg;
            self.backend.encrypt_block(&self.schedule, &mut ks);
            inc32(&mut self.reg);
            xor_in_place(chunk, &ks);
            if chunk.len() < BLOCK_SIZE {
                self.tmp = ks;
                self.left = BLOCK_SIZE - chunk.len();
            }
            ks.zeroize();
        }
    }

    #[cfg(test)]
    pub(crate) fn schedule_mut(&mut self) -> &mut KeySchedule {
        &mut self.schedule
    }
}
