//! AES key expansion (FIPS-197 section 5.2).

use zeroize::{Zeroize, ZeroizeOnDrop};

use super::tables::{inv_mix_word, sub_word, RCON};
use super::Direction;
use crate::error::{AesError, Result};
use crate::MAX_ROUNDS;

/// Expanded round keys.
///
/// Group `r` holds the four words XORed into the state at round `r`. A
/// decryption schedule is stored for the equivalent inverse cipher: groups
/// reversed and InvMixColumns applied to every group except the first and
/// last.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeySchedule {
    round_keys: [[u32; 4]; MAX_ROUNDS + 1],
    rounds: usize,
}

impl KeySchedule {
    /// Expand a 16, 24 or 32 byte key.
    pub fn expand(key: &[u8], direction: Direction) -> Result<Self> {
        let nk = match key.len() {
            16 => 4,
            24 => 6,
            32 => 8,
            n => return Err(AesError::BadKeySize(n)),
        };
        if direction == Direction::Decrypt && !cfg!(feature = "aes-decrypt") {
            return Err(AesError::DecryptionNotSupported);
        }

        let rounds = nk + 6;
        let total = 4 * (rounds + 1);
        let mut w = [0u32; 4 * (MAX_ROUNDS + 1)];

        for (i, chunk) in key.chunks_exact(4).enumerate() {
            w[i] = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        for i in nk..total {
            let mut temp = w[i - 1];
            if i % nk == 0 {
                temp = sub_word(temp.rotate_left(8)) ^ ((RCON[i / nk - 1] as u32) << 24);
            } else if nk > 6 && i % nk == 4 {
                temp = sub_word(temp);
            }
            w[i] = w[i - nk] ^ temp;
        }

        let mut schedule = Self {
            round_keys: [[0u32; 4]; MAX_ROUNDS + 1],
            rounds,
        };
        for (r, group) in schedule.round_keys[..=rounds].iter_mut().enumerate() {
            group.copy_from_slice(&w[4 * r..4 * r + 4]);
        }
        w.zeroize();

        if direction == Direction::Decrypt {
            schedule.invert();
        }
        Ok(schedule)
    }

    fn invert(&mut self) {
        let n = self.rounds;
        self.round_keys[..=n].reverse();
        for group in &mut self.round_keys[1..n] {
            for word in group.iter_mut() {
                *word = inv_mix_word(*word);
            }
        }
    }

    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Round-key groups `0..=rounds`.
    pub fn round_keys(&self) -> &[[u32; 4]] {
        &self.round_keys[..=self.rounds.min(MAX_ROUNDS)]
    }

    /// Round key `r` as the 16 bytes XORed into the state.
    #[inline]
    pub fn round_key_bytes(&self, r: usize) -> [u8; 16] {
        let mut out = [0u8; 16];
        for (c, word) in self.round_keys[r].iter().enumerate() {
            out[4 * c..4 * c + 4].copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    /// Reject round counts the transforms do not implement.
    pub fn check_rounds(&self) -> Result<()> {
        match self.rounds {
            10 | 12 | 14 => Ok(()),
            n => Err(AesError::KeyUsage(n)),
        }
    }

    #[cfg(test)]
    pub(crate) fn force_rounds(&mut self, rounds: usize) {
        self.rounds = rounds;
    }
}
