//! Compile-time AES tables and byte-level column arithmetic.
//!
//! The S-boxes are derived at build time from the GF(2^8) inverse and the
//! affine map, so no hand-typed table can drift from the definition.

/// Multiply by `x` in GF(2^8) modulo x^8 + x^4 + x^3 + x + 1.
#[inline(always)]
pub(crate) const fn xtime(b: u8) -> u8 {
    (b << 1) ^ (0u8.wrapping_sub(b >> 7) & 0x1b)
}

const fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut p = 0u8;
    let mut i = 0;
    while i < 8 {
        p ^= a & 0u8.wrapping_sub(b & 1);
        a = xtime(a);
        b >>= 1;
        i += 1;
    }
    p
}

/// `a^254`, which is `a^-1` for non-zero `a` and 0 for 0.
const fn gf_inv(a: u8) -> u8 {
    let mut result = 1u8;
    let mut base = a;
    let mut e = 254u8;
    while e > 0 {
        if e & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        e >>= 1;
    }
    result
}

const fn build_sbox() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let b = gf_inv(i as u8);
        table[i] = b
            ^ b.rotate_left(1)
            ^ b.rotate_left(2)
            ^ b.rotate_left(3)
            ^ b.rotate_left(4)
            ^ 0x63;
        i += 1;
    }
    table
}

const fn build_inv_sbox(sbox: &[u8; 256]) -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        table[sbox[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Forward S-box.
pub(crate) const SBOX: [u8; 256] = build_sbox();

/// Inverse S-box.
pub(crate) const INV_SBOX: [u8; 256] = build_inv_sbox(&SBOX);

/// Key-expansion round constants.
pub(crate) const RCON: [u8; 10] = [0x01, 0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x1b, 0x36];

/// MixColumns on one column (rows 0..3).
#[inline(always)]
pub(crate) fn mix_column(col: &mut [u8; 4]) {
    let [a0, a1, a2, a3] = *col;
    let t = a0 ^ a1 ^ a2 ^ a3;
    col[0] = a0 ^ t ^ xtime(a0 ^ a1);
    col[1] = a1 ^ t ^ xtime(a1 ^ a2);
    col[2] = a2 ^ t ^ xtime(a2 ^ a3);
    col[3] = a3 ^ t ^ xtime(a3 ^ a0);
}

/// InvMixColumns on one column, as a pre-multiplication followed by
/// MixColumns.
#[inline(always)]
pub(crate) fn inv_mix_column(col: &mut [u8; 4]) {
    let u = xtime(xtime(col[0] ^ col[2]));
    let v = xtime(xtime(col[1] ^ col[3]));
    col[0] ^= u;
    col[1] ^= v;
    col[2] ^= u;
    col[3] ^= v;
    mix_column(col);
}

/// Apply the S-box to each byte of a big-endian word.
#[inline(always)]
pub(crate) fn sub_word(w: u32) -> u32 {
    let b = w.to_be_bytes();
    u32::from_be_bytes([
        SBOX[b[0] as usize],
        SBOX[b[1] as usize],
        SBOX[b[2] as usize],
        SBOX[b[3] as usize],
    ])
}

/// InvMixColumns on a round-key word.
#[inline(always)]
pub(crate) fn inv_mix_word(w: u32) -> u32 {
    let mut col = w.to_be_bytes();
    inv_mix_column(&mut col);
    u32::from_be_bytes(col)
}
