//! Counter mode.
//!
//! The register is the counter block. Its last four bytes count up as a
//! big-endian 32-bit integer and wrap without touching the first twelve.

use super::check_buffers;
use crate::cipher::{Aes, Direction};
use crate::error::Result;

impl Aes {
    /// XOR `input` with the keystream into `out`. Any length is accepted;
    /// keystream bytes left over from a partial block are used first on
    /// the next call. Decryption is the same operation, so the schedule is
    /// always an encryption schedule.
    pub fn ctr_encrypt(&mut self, out: &mut [u8], input: &[u8]) -> Result<()> {
        check_buffers(out, input)?;
        self.require(Direction::Encrypt)?;
        self.check_rounds()?;

        let out = &mut out[..input.len()];
        out.copy_from_slice(input);
        self.apply_keystream(out);
        Ok(())
    }

    /// In-place variant of [`Aes::ctr_encrypt`].
    pub fn ctr_encrypt_in_place(&mut self, buf: &mut [u8]) -> Result<()> {
        self.require(Direction::Encrypt)?;
        self.check_rounds()?;
        self.apply_keystream(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AesError;
    use crate::Block;
    use hex_literal::hex;

    const KEY: [u8; 16] = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    const CTR: Block = hex!("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff");
    const PT: [u8; 64] = hex!(
        "6bc1bee22e409f96e93d7e117393172a"
        "ae2d8a571e03ac9c9eb76fac45af8e51"
        "30c81c46a35ce411e5fbc1191a0a52ef"
        "f69f2445df4f9b17ad2b417be66c3710"
    );
    const CT: [u8; 64] = hex!(
        "874d6191b620e3261bef6864990db6ce"
        "9806f66b7970fdff8617187bb9fffdff"
        "5ae4df3edbd5d35e5b4f09020db03eab"
        "1e031dda2fbe03d1792170a0f3009cee"
    );

    #[test]
    fn test_ctr_sp800_38a() {
        let mut aes = Aes::new(&KEY, Some(&CTR), Direction::Encrypt).unwrap();
        let mut out = [0u8; 64];
        aes.ctr_encrypt(&mut out, &PT).unwrap();
        assert_eq!(out, CT);
    }

    #[test]
    fn test_ctr_partial_blocks_continue() {
        let mut aes = Aes::new(&KEY, Some(&CTR), Direction::Encrypt).unwrap();
        let mut out = [0u8; 64];
        let cuts = [0usize, 5, 21, 22, 40, 64];
        for w in cuts.windows(2) {
            aes.ctr_encrypt(&mut out[w[0]..w[1]], &PT[w[0]..w[1]]).unwrap();
        }
        assert_eq!(out, CT);
    }

    #[test]
    fn test_ctr_in_place_round_trip() {
        let mut buf = PT;
        let mut aes = Aes::new(&KEY, Some(&CTR), Direction::Encrypt).unwrap();
        aes.ctr_encrypt_in_place(&mut buf[..7]).unwrap();
        aes.ctr_encrypt_in_place(&mut buf[7..]).unwrap();
        assert_eq!(buf, CT);

        aes.set_iv(Some(&CTR));
        aes.ctr_encrypt_in_place(&mut buf).unwrap();
        assert_eq!(buf, PT);
    }

    #[test]
    fn test_ctr_counter_wraps_low_32_bits() {
        let start = hex!("0102030405060708090a0b0cffffffff");
        let mut aes = Aes::new(&KEY, Some(&start), Direction::Encrypt).unwrap();
        let mut ks = [0u8; 32];
        aes.ctr_encrypt_in_place(&mut ks).unwrap();

        let wrapped = hex!("0102030405060708090a0b0c00000000");
        let mut expected = [0u8; 16];
        aes.encrypt_block(&wrapped, &mut expected).unwrap();
        assert_eq!(&ks[16..], &expected);
        assert_eq!(aes.iv(), &hex!("0102030405060708090a0b0c00000001"));
    }

    #[test]
    fn test_set_iv_discards_leftover() {
        let mut aes = Aes::new(&KEY, Some(&CTR), Direction::Encrypt).unwrap();
        let mut out = [0u8; 64];
        aes.ctr_encrypt(&mut out[..3], &PT[..3]).unwrap();
        aes.set_iv(Some(&CTR));
        aes.ctr_encrypt(&mut out, &PT).unwrap();
        assert_eq!(out, CT);
    }

    #[test]
    fn test_ctr_short_output() {
        let mut aes = Aes::new(&KEY, Some(&CTR), Direction::Encrypt).unwrap();
        let mut out = [0u8; 3];
        assert!(matches!(
            aes.ctr_encrypt(&mut out, &PT[..4]),
            Err(AesError::BadFuncArg(_))
        ));
    }
}
