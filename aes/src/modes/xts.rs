//! XTS-AES (IEEE 1619) with ciphertext stealing.

use zeroize::Zeroize;

use super::check_buffers;
use crate::cipher::{Aes, Direction};
use crate::config::AesConfig;
use crate::error::{AesError, Result};
use crate::util::{load_block, xor_in_place};
use crate::{Block, BLOCK_SIZE};

/// Multiply the tweak by `x` in GF(2^128), little-endian byte order.
#[inline(always)]
fn mul_x(tweak: &mut Block) {
    let v = u128::from_le_bytes(*tweak);
    let carry = 0u128.wrapping_sub(v >> 127) & 0x87;
    *tweak = ((v << 1) ^ carry).to_le_bytes();
}

/// XTS cipher: a data key and a tweak key.
#[derive(Debug)]
pub struct XtsAes {
    data: Aes,
    tweak: Aes,
}

impl XtsAes {
    /// `key` is the data key followed by the tweak key: 32 bytes for
    /// AES-128-XTS, 64 for AES-256-XTS.
    pub fn new(key: &[u8], direction: Direction) -> Result<Self> {
        Self::with_config(key, direction, AesConfig::default())
    }

    pub fn with_config(key: &[u8], direction: Direction, config: AesConfig) -> Result<Self> {
        let half = match key.len() {
            32 | 64 => key.len() / 2,
            n => return Err(AesError::BadKeySize(n)),
        };
        let data = Aes::with_config(&key[..half], None, direction, config)?;
        let tweak = Aes::with_config(&key[half..], None, Direction::Encrypt, config)?;
        Ok(Self { data, tweak })
    }

    pub fn direction(&self) -> Direction {
        self.data.direction()
    }

    /// Encrypt a data unit of at least one block under `tweak`.
    pub fn encrypt(&self, out: &mut [u8], input: &[u8], tweak: &Block) -> Result<()> {
        self.check(out, input)?;
        self.data.require(Direction::Encrypt)?;

        let mut t = self.start_tweak(tweak);
        let tail = input.len() % BLOCK_SIZE;
        let full = input.len() / BLOCK_SIZE - usize::from(tail != 0);

        for i in 0..full {
            let range = i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE;
            let mut block = load_block(&input[range.clone()]);
            self.encrypt_unit(&mut block, &t);
            out[range].copy_from_slice(&block);
            mul_x(&mut t);
        }

        if tail != 0 {
            let base = full * BLOCK_SIZE;
            let mut cc = load_block(&input[base..base + BLOCK_SIZE]);
            self.encrypt_unit(&mut cc, &t);
            mul_x(&mut t);

            let mut pp = cc;
            pp[..tail].copy_from_slice(&input[base + BLOCK_SIZE..]);
            out[base + BLOCK_SIZE..base + BLOCK_SIZE + tail].copy_from_slice(&cc[..tail]);
            self.encrypt_unit(&mut pp, &t);
            out[base..base + BLOCK_SIZE].copy_from_slice(&pp);
            cc.zeroize();
        }
        t.zeroize();
        Ok(())
    }

    /// Decrypt a data unit of at least one block under `tweak`.
    pub fn decrypt(&self, out: &mut [u8], input: &[u8], tweak: &Block) -> Result<()> {
        self.check(out, input)?;
        self.data.require_decrypt()?;

        let mut t = self.start_tweak(tweak);
        let tail = input.len() % BLOCK_SIZE;
        let full = input.len() / BLOCK_SIZE - usize::from(tail != 0);

        for i in 0..full {
            let range = i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE;
            let mut block = load_block(&input[range.clone()]);
            self.decrypt_unit(&mut block, &t);
            out[range].copy_from_slice(&block);
            block.zeroize();
            mul_x(&mut t);
        }

        if tail != 0 {
            let base = full * BLOCK_SIZE;
            let mut next = t;
            mul_x(&mut next);

            let mut pp = load_block(&input[base..base + BLOCK_SIZE]);
            self.decrypt_unit(&mut pp, &next);

            let mut cc = pp;
            cc[..tail].copy_from_slice(&input[base + BLOCK_SIZE..]);
            out[base + BLOCK_SIZE..base + BLOCK_SIZE + tail].copy_from_slice(&pp[..tail]);
            self.decrypt_unit(&mut cc, &t);
            out[base..base + BLOCK_SIZE].copy_from_slice(&cc);
            pp.zeroize();
            cc.zeroize();
            next.zeroize();
        }
        t.zeroize();
        Ok(())
    }

    /// Encrypt with the sector number as a little-endian tweak.
    pub fn encrypt_sector(&self, out: &mut [u8], input: &[u8], sector: u64) -> Result<()> {
        self.encrypt(out, input, &sector_tweak(sector))
    }

    /// Decrypt with the sector number as a little-endian tweak.
    pub fn decrypt_sector(&self, out: &mut [u8], input: &[u8], sector: u64) -> Result<()> {
        self.decrypt(out, input, &sector_tweak(sector))
    }

    fn check(&self, out: &[u8], input: &[u8]) -> Result<()> {
        if input.len() < BLOCK_SIZE {
            return Err(AesError::BadFuncArg("XTS needs at least one full block"));
        }
        check_buffers(out, input)?;
        self.data.check_rounds()?;
        self.tweak.check_rounds()
    }

    fn start_tweak(&self, tweak: &Block) -> Block {
        let mut t = *tweak;
        self.tweak.encrypt_in_place(&mut t);
        t
    }

    #[inline]
    fn encrypt_unit(&self, block: &mut Block, t: &Block) {
        xor_in_place(block, t);
        self.data.encrypt_in_place(block);
        xor_in_place(block, t);
    }

    #[inline]
    fn decrypt_unit(&self, block: &mut Block, t: &Block) {
        xor_in_place(block, t);
        self.data.decrypt_in_place(block);
        xor_in_place(block, t);
    }
}

fn sector_tweak(sector: u64) -> Block {
    let mut tweak = [0u8; BLOCK_SIZE];
    tweak[..8].copy_from_slice(&sector.to_le_bytes());
    tweak
}
