//! Portable software AES.
//!
//! The state is 16 bytes in input order, i.e. column-major: byte `r + 4c`
//! is row `r` of column `c`. There are no data-dependent branches; S-box
//! reads are indexed by state bytes, so the usual cache-timing caveats of
//! table AES apply on hardware without an accelerated path.

use super::key_schedule::KeySchedule;
use super::tables::{inv_mix_column, mix_column, INV_SBOX, SBOX};
use super::BlockBackend;
use crate::Block;

/// Table-based software backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Software;

#[inline(always)]
fn add_round_key(state: &mut Block, rk: &[u32; 4]) {
    for (c, word) in rk.iter().enumerate() {
        for (s, k) in state[4 * c..4 * c + 4].iter_mut().zip(word.to_be_bytes()) {
            *s ^= k;
        }
    }
}

#[inline(always)]
fn sub_bytes(state: &mut Block) {
    for b in state.iter_mut() {
        *b = SBOX[*b as usize];
    }
}

#[inline(always)]
fn inv_sub_bytes(state: &mut Block) {
    for b in state.iter_mut() {
        *b = INV_SBOX[*b as usize];
    }
}

#[inline(always)]
fn shift_rows(state: &mut Block) {
    let old = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[r + 4 * c] = old[r + 4 * ((c + r) % 4)];
        }
    }
}

#[inline(always)]
fn inv_shift_rows(state: &mut Block) {
    let old = *state;
    for c in 0..4 {
        for r in 1..4 {
            state[r + 4 * c] = old[r + 4 * ((c + 4 - r) % 4)];
        }
    }
}

#[inline(always)]
fn mix_columns(state: &mut Block) {
    for col in state.chunks_exact_mut(4) {
        let mut c = [col[0], col[1], col[2], col[3]];
        mix_column(&mut c);
        col.copy_from_slice(&c);
    }
}

#[inline(always)]
fn inv_mix_columns(state: &mut Block) {
    for col in state.chunks_exact_mut(4) {
        let mut c = [col[0], col[1], col[2], col[3]];
        inv_mix_column(&mut c);
        col.copy_from_slice(&c);
    }
}

impl BlockBackend for Software {
    fn encrypt_block(&self, schedule: &KeySchedule, block: &mut Block) {
        let rk = schedule.round_keys();
        let rounds = rk.len() - 1;

        add_round_key(block, &rk[0]);
        for key in &rk[1..rounds] {
            sub_bytes(block);
            shift_rows(block);
            mix_columns(block);
            add_round_key(block, key);
        }
        sub_bytes(block);
        shift_rows(block);
        add_round_key(block, &rk[rounds]);
    }

    // Equivalent inverse cipher: the schedule already carries reversed,
    // InvMixColumns-adjusted round keys.
    fn decrypt_block(&self, schedule: &KeySchedule, block: &mut Block) {
        let rk = schedule.round_keys();
        let rounds = rk.len() - 1;

        add_round_key(block, &rk[0]);
        for key in &rk[1..rounds] {
            inv_sub_bytes(block);
            inv_shift_rows(block);
            inv_mix_columns(block);
            add_round_key(block, key);
        }
        inv_sub_bytes(block);
        inv_shift_rows(block);
        add_round_key(block, &rk[rounds]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::Direction;
    use hex_literal::hex;

    fn encrypt(key: &[u8], pt: Block) -> Block {
        let ks = KeySchedule::expand(key, Direction::Encrypt).unwrap();
        let mut block = pt;
        Software.encrypt_block(&ks, &mut block);
        block
    }

    #[test]
    fn test_fips197_appendix_c() {
        let pt = hex!("00112233445566778899aabbccddeeff");
        let key = hex!("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f");
        assert_eq!(
            encrypt(&key[..16], pt),
            hex!("69c4e0d86a7b0430d8cdb78070b4c55a")
        );
        assert_eq!(
            encrypt(&key[..24], pt),
            hex!("dda97ca4864cdfe06eaf70a0ec0d7191")
        );
        assert_eq!(encrypt(&key, pt), hex!("8ea2b7ca516745bfeafc49904b496089"));
    }

    #[cfg(feature = "aes-decrypt")]
    #[test]
    fn test_equivalent_inverse_cipher() {
        let key = hex!("000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f");
        for len in [16, 24, 32] {
            let ks = KeySchedule::expand(&key[..len], Direction::Decrypt).unwrap();
            let pt = hex!("00112233445566778899aabbccddeeff");
            let mut block = encrypt(&key[..len], pt);
            Software.decrypt_block(&ks, &mut block);
            assert_eq!(block, pt);
        }
    }

    #[test]
    fn test_shift_rows_inverse() {
        let mut state: Block = core::array::from_fn(|i| i as u8);
        shift_rows(&mut state);
        assert_eq!(state[1], 5);
        assert_eq!(state[2], 10);
        assert_eq!(state[3], 15);
        inv_shift_rows(&mut state);
        assert_eq!(state, core::array::from_fn::<u8, 16, _>(|i| i as u8));
    }
}
