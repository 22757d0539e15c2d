//! GHASH over GF(2^128) (NIST SP 800-38D section 6.4).
//!
//! Field elements use the GCM bit order: the coefficient of `x^0` is the
//! most significant bit of byte 0. Loaded as a big-endian `u128`, that is
//! bit 127, so multiplying by `x` is a right shift and the reduction
//! polynomial `x^128 + x^7 + x^2 + x + 1` folds back in as `0xE1 << 120`.
//!
//! Three multipliers produce identical results:
//!
//! - `Bitwise`: shift-and-add over all 128 bits with masks instead of
//!   branches.
//! - `Table4Bit`: Shoup's 4-bit method over a 16-entry table `M0` of
//!   `H * i`. Every lookup scans the whole table under a mask so the
//!   access pattern does not depend on the data.
//! - `Pmull`: ARMv8 carry-less multiply (aarch64 only).

use core::fmt;

use spin::Once;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{AesError, Result};
use crate::util::xor_in_place;
use crate::{Block, BLOCK_SIZE};

const R: u128 = 0xE1 << 120;

/// Multiplication strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhashMethod {
    Bitwise,
    Table4Bit,
    Pmull,
}

static DETECTED: Once<GhashMethod> = Once::new();

impl GhashMethod {
    /// Carry-less multiply when the CPU has it, the 4-bit table otherwise.
    pub fn detect() -> GhashMethod {
        *DETECTED.call_once(|| {
            let method = if pmull::available() {
                GhashMethod::Pmull
            } else {
                GhashMethod::Table4Bit
            };
            log::trace!("[KPIO AES] GHASH method: {:?}", method);
            method
        })
    }

    pub fn is_available(self) -> bool {
        match self {
            GhashMethod::Bitwise | GhashMethod::Table4Bit => true,
            GhashMethod::Pmull => pmull::available(),
        }
    }
}

/// `v * x`.
#[inline(always)]
const fn mul_x(v: u128) -> u128 {
    (v >> 1) ^ (R & 0u128.wrapping_sub(v & 1))
}

/// Reduction of the four bits shifted out when multiplying by `x^4`,
/// indexed by the low nibble before the shift.
const R4: [u128; 16] = {
    let mut table = [0u128; 16];
    let mut n = 0;
    while n < 16 {
        let mut acc = 0u128;
        let mut b = 0;
        while b < 4 {
            if (n >> b) & 1 != 0 {
                acc ^= R >> (3 - b);
            }
            b += 1;
        }
        table[n] = acc;
        n += 1;
    }
    table
};

/// All-ones when `a == b`, zero otherwise, without branching.
#[inline(always)]
fn eq_mask(a: usize, b: usize) -> u128 {
    let d = (a ^ b) as u64;
    let nonzero = (d | d.wrapping_neg()) >> 63;
    (nonzero as u128).wrapping_sub(1)
}

#[inline(always)]
fn select(table: &[u128; 16], index: usize) -> u128 {
    let mut out = 0u128;
    for (i, entry) in table.iter().enumerate() {
        out |= entry & eq_mask(i, index);
    }
    out
}

fn mul_bitwise(x: u128, h: u128) -> u128 {
    let mut z = 0u128;
    let mut v = h;
    for i in 0..128 {
        let bit = (x >> (127 - i)) & 1;
        z ^= v & 0u128.wrapping_sub(bit);
        v = mul_x(v);
    }
    z
}

/// Build `M0[i] = H * i` for every 4-bit `i` (bit 3 of `i` is `x^0`).
fn generate_m0(h: u128) -> [u128; 16] {
    let mut m0 = [0u128; 16];
    m0[8] = h;
    m0[4] = mul_x(m0[8]);
    m0[2] = mul_x(m0[4]);
    m0[1] = mul_x(m0[2]);
    for i in [2usize, 4, 8] {
        for j in 1..i {
            m0[i + j] = m0[i] ^ m0[j];
        }
    }
    m0
}

fn mul_table(x: &Block, m0: &[u128; 16]) -> u128 {
    let mut z = 0u128;
    for &byte in x.iter().rev() {
        for nibble in [byte & 0x0f, byte >> 4] {
            let shifted = select(&R4, (z & 0x0f) as usize);
            z = (z >> 4) ^ shifted;
            z ^= select(m0, nibble as usize);
        }
    }
    z
}

/// `x = x * h`, constant-time shift-and-add.
pub fn gmult(x: &mut Block, h: &Block) {
    let z = mul_bitwise(u128::from_be_bytes(*x), u128::from_be_bytes(*h));
    *x = z.to_be_bytes();
}

/// Hash subkey `H` with the precomputation its method needs.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct GhashKey {
    h: u128,
    m0: [u128; 16],
    #[zeroize(skip)]
    method: GhashMethod,
}

impl fmt::Debug for GhashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GhashKey")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

impl GhashKey {
    /// Prepare `h` for `method`. A `Pmull` request on a CPU without the
    /// instruction is served by the 4-bit table.
    pub fn new(h: &Block, method: GhashMethod) -> Self {
        let method = if method.is_available() {
            method
        } else {
            GhashMethod::Table4Bit
        };
        let h = u128::from_be_bytes(*h);
        let m0 = match method {
            GhashMethod::Table4Bit => generate_m0(h),
            _ => [0u128; 16],
        };
        Self { h, m0, method }
    }

    pub fn method(&self) -> GhashMethod {
        self.method
    }

    /// `x = x * H`.
    pub fn mul(&self, x: &mut Block) {
        let z = match self.method {
            GhashMethod::Bitwise => mul_bitwise(u128::from_be_bytes(*x), self.h),
            GhashMethod::Table4Bit => mul_table(x, &self.m0),
            GhashMethod::Pmull => pmull::mul(u128::from_be_bytes(*x), self.h),
        };
        *x = z.to_be_bytes();
    }

    /// Absorb `data` zero-padded to a whole number of blocks.
    fn absorb_padded(&self, y: &mut Block, data: &[u8]) {
        for chunk in data.chunks(BLOCK_SIZE) {
            xor_in_place(y, chunk);
            self.mul(y);
        }
    }

    fn absorb_lengths(&self, y: &mut Block, aad_len: u64, ct_len: u64) {
        let mut block = [0u8; BLOCK_SIZE];
        block[..8].copy_from_slice(&aad_len.wrapping_mul(8).to_be_bytes());
        block[8..].copy_from_slice(&ct_len.wrapping_mul(8).to_be_bytes());
        xor_in_place(y, &block);
        self.mul(y);
    }
}

/// One-shot GHASH of `aad` and `ciphertext`, each zero-padded, followed by
/// the length block. The first `out.len()` bytes (at most 16) are written.
pub fn ghash(key: &GhashKey, aad: &[u8], ciphertext: &[u8], out: &mut [u8]) -> Result<()> {
    if out.len() > BLOCK_SIZE {
        return Err(AesError::BadFuncArg("GHASH output longer than a block"));
    }
    let mut y = ghash_block(key, aad, ciphertext);
    out.copy_from_slice(&y[..out.len()]);
    y.zeroize();
    Ok(())
}

pub(crate) fn ghash_block(key: &GhashKey, aad: &[u8], ciphertext: &[u8]) -> Block {
    let mut y = [0u8; BLOCK_SIZE];
    key.absorb_padded(&mut y, aad);
    key.absorb_padded(&mut y, ciphertext);
    key.absorb_lengths(&mut y, aad.len() as u64, ciphertext.len() as u64);
    y
}

/// Incremental GHASH.
///
/// Bytes may arrive in pieces of any size; a partial block is held until
/// it fills or the phase changes. All AAD must come before the first
/// ciphertext byte.
#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct GhashAccumulator {
    y: Block,
    partial: Block,
    over: usize,
    aad_len: u64,
    ct_len: u64,
}

impl GhashAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb more AAD and ciphertext.
    pub fn update(&mut self, key: &GhashKey, aad: &[u8], ciphertext: &[u8]) -> Result<()> {
        self.update_aad(key, aad)?;
        self.update_ciphertext(key, ciphertext);
        Ok(())
    }

    /// Absorb AAD. Fails once any ciphertext has been absorbed.
    pub fn update_aad(&mut self, key: &GhashKey, aad: &[u8]) -> Result<()> {
        if aad.is_empty() {
            return Ok(());
        }
        if self.ct_len > 0 {
            return Err(AesError::BadFuncArg("AAD supplied after ciphertext"));
        }
        self.absorb(key, aad);
        self.aad_len += aad.len() as u64;
        Ok(())
    }

    /// Absorb ciphertext, closing the AAD phase on the first byte.
    pub fn update_ciphertext(&mut self, key: &GhashKey, ciphertext: &[u8]) {
        if ciphertext.is_empty() {
            return;
        }
        if self.ct_len == 0 {
            self.flush(key);
        }
        self.absorb(key, ciphertext);
        self.ct_len += ciphertext.len() as u64;
    }

    pub fn aad_len(&self) -> u64 {
        self.aad_len
    }

    pub fn ciphertext_len(&self) -> u64 {
        self.ct_len
    }

    /// Pad, hash the length block and return `S`. The accumulator is reset.
    pub fn finish(&mut self, key: &GhashKey) -> Block {
        self.flush(key);
        let mut y = self.y;
        key.absorb_lengths(&mut y, self.aad_len, self.ct_len);
        self.zeroize();
        y
    }

    fn absorb(&mut self, key: &GhashKey, mut data: &[u8]) {
        if self.over > 0 {
            let take = (BLOCK_SIZE - self.over).min(data.len());
            self.partial[self.over..self.over + take].copy_from_slice(&data[..take]);
            self.over += take;
            data = &data[take..];
            if self.over < BLOCK_SIZE {
                return;
            }
            xor_in_place(&mut self.y, &self.partial);
            key.mul(&mut self.y);
            self.over = 0;
        }

        let mut chunks = data.chunks_exact(BLOCK_SIZE);
        for chunk in &mut chunks {
            xor_in_place(&mut self.y, chunk);
            key.mul(&mut self.y);
        }
        let rest = chunks.remainder();
        self.partial[..rest.len()].copy_from_slice(rest);
        self.over = rest.len();
    }

    fn flush(&mut self, key: &GhashKey) {
        if self.over == 0 {
            return;
        }
        self.partial[self.over..].fill(0);
        xor_in_place(&mut self.y, &self.partial);
        key.mul(&mut self.y);
        self.partial.zeroize();
        self.over = 0;
    }
}

mod pmull {
    //! Carry-less multiply with PMULL.
    //!
    //! Operands are bit-reversed into the ordinary polynomial order, the
    //! 256-bit product is formed with three 64x64 multiplies (Karatsuba)
    //! and reduced, then the result is reversed back.

    pub(super) fn available() -> bool {
        #[cfg(all(target_arch = "aarch64", feature = "armv8"))]
        {
            #[cfg(feature = "std")]
            {
                std::arch::is_aarch64_feature_detected!("pmull")
            }
            #[cfg(not(feature = "std"))]
            {
                cfg!(target_feature = "aes")
            }
        }
        #[cfg(not(all(target_arch = "aarch64", feature = "armv8")))]
        {
            false
        }
    }

    /// Reduce a 256-bit product modulo `x^128 + x^7 + x^2 + x + 1`.
    #[cfg(any(all(target_arch = "aarch64", feature = "armv8"), test))]
    #[inline(always)]
    pub(super) fn reduce(hi: u128, lo: u128) -> u128 {
        let t = hi ^ (hi << 1) ^ (hi << 2) ^ (hi << 7);
        let ov = (hi >> 127) ^ (hi >> 126) ^ (hi >> 121);
        lo ^ t ^ ov ^ (ov << 1) ^ (ov << 2) ^ (ov << 7)
    }

    pub(super) fn mul(x: u128, h: u128) -> u128 {
        #[cfg(all(target_arch = "aarch64", feature = "armv8"))]
        {
            if available() {
                // SAFETY: PMULL support was detected above.
                return unsafe { imp::mul(x, h) };
            }
        }
        super::mul_bitwise(x, h)
    }

    #[cfg(all(target_arch = "aarch64", feature = "armv8"))]
    mod imp {
        use core::arch::aarch64::vmull_p64;

        #[target_feature(enable = "aes,neon")]
        pub(super) unsafe fn mul(x: u128, h: u128) -> u128 {
            let a = x.reverse_bits();
            let b = h.reverse_bits();
            let (a1, a0) = ((a >> 64) as u64, a as u64);
            let (b1, b0) = ((b >> 64) as u64, b as u64);

            let lo = vmull_p64(a0, b0);
            let hi = vmull_p64(a1, b1);
            let mid = vmull_p64(a0 ^ a1, b0 ^ b1) ^ lo ^ hi;

            let lo = lo ^ (mid << 64);
            let hi = hi ^ (mid >> 64);
            super::reduce(hi, lo).reverse_bits()
        }
    }
}
