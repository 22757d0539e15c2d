//! Byte helpers shared by the modes and AEAD layers.

use subtle::ConstantTimeEq;

use crate::{Block, BLOCK_SIZE};

/// Compare two byte strings without early exit.
///
/// Slices of different length compare unequal; the length itself is not
/// treated as secret.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    bool::from(a.ct_eq(b))
}

/// `dst[i] ^= src[i]` over the shorter of the two.
pub(crate) fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Copy a full block out of a slice of exactly `BLOCK_SIZE` bytes.
pub(crate) fn load_block(chunk: &[u8]) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(chunk);
    block
}

/// Increment the last 4 bytes of `ctr` as a big-endian 32-bit counter.
pub(crate) fn inc32(ctr: &mut Block) {
    let c = u32::from_be_bytes([ctr[12], ctr[13], ctr[14], ctr[15]]);
    ctr[12..16].copy_from_slice(&c.wrapping_add(1).to_be_bytes());
}

/// Increment the whole buffer as a big-endian integer, wrapping to zero.
pub(crate) fn inc_be(buf: &mut [u8]) {
    for byte in buf.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}
