//! Cipher block chaining mode.

use zeroize::Zeroize;

use super::check_buffers;
use crate::cipher::{Aes, Direction};
use crate::error::Result;
use crate::util::{load_block, xor_in_place};
use crate::BLOCK_SIZE;

impl Aes {
    /// CBC-encrypt whole blocks, chaining from and updating the register.
    pub fn cbc_encrypt(&mut self, out: &mut [u8], input: &[u8]) -> Result<()> {
        check_buffers(out, input)?;
        self.require(Direction::Encrypt)?;
        self.config().length_policy.check(input.len())?;
        self.check_rounds()?;

        let mut reg = self.reg;
        for (o, i) in out.chunks_exact_mut(BLOCK_SIZE).zip(input.chunks_exact(BLOCK_SIZE)) {
            xor_in_place(&mut reg, i);
            self.encrypt_in_place(&mut reg);
            o.copy_from_slice(&reg);
        }
        self.reg = reg;
        Ok(())
    }

    /// CBC-decrypt whole blocks. The register ends as the last ciphertext
    /// block so a following call continues the chain.
    pub fn cbc_decrypt(&mut self, out: &mut [u8], input: &[u8]) -> Result<()> {
        check_buffers(out, input)?;
        self.require_decrypt()?;
        self.config().length_policy.check(input.len())?;
        self.check_rounds()?;

        let mut prev = self.reg;
        for (o, i) in out.chunks_exact_mut(BLOCK_SIZE).zip(input.chunks_exact(BLOCK_SIZE)) {
            let cipher = load_block(i);
            let mut block = cipher;
            self.decrypt_in_place(&mut block);
            xor_in_place(&mut block, &prev);
            o.copy_from_slice(&block);
            block.zeroize();
            prev = cipher;
        }
        self.reg = prev;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AesError;
    use hex_literal::hex;

    const KEY: [u8; 16] = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    const IV: [u8; 16] = hex!("000102030405060708090a0b0c0d0e0f");
    const PT: [u8; 64] = hex!(
        "6bc1bee22e409f96e93d7e117393172a"
        "ae2d8a571e03ac9c9eb76fac45af8e51"
        "30c81c46a35ce411e5fbc1191a0a52ef"
        "f69f2445df4f9b17ad2b417be66c3710"
    );
    const CT: [u8; 64] = hex!(
        "7649abac8119b246cee98e9b12e9197d"
        "5086cb9b507219ee95db113a917678b2"
        "73bed6b8e3c1743b7116e69e22229516"
        "3ff1caa1681fac09120eca307586e1a7"
    );

    #[test]
    fn test_cbc_sp800_38a() {
        let mut aes = Aes::new(&KEY, Some(&IV), Direction::Encrypt).unwrap();
        let mut out = [0u8; 64];
        aes.cbc_encrypt(&mut out, &PT).unwrap();
        assert_eq!(out, CT);
        assert_eq!(aes.iv(), &CT[48..64]);
    }

    #[test]
    fn test_cbc_chains_across_calls() {
        let mut aes = Aes::new(&KEY, Some(&IV), Direction::Encrypt).unwrap();
        let mut out = [0u8; 64];
        aes.cbc_encrypt(&mut out[..16], &PT[..16]).unwrap();
        aes.cbc_encrypt(&mut out[16..], &PT[16..]).unwrap();
        assert_eq!(out, CT);
    }

    #[test]
    fn test_cbc_zero_iv_zero_plaintext() {
        let key = hex!("000102030405060708090a0b0c0d0e0f");
        let mut aes = Aes::new(&key, None, Direction::Encrypt).unwrap();
        let mut out = [0u8; 32];
        aes.cbc_encrypt(&mut out, &[0u8; 32]).unwrap();
        assert_eq!(
            out,
            hex!("c6a13b37878f5b826f4f8162a1c8d879" "af9d9926f7dac87192b1c4143ad98958")
        );
    }

    #[cfg(feature = "aes-decrypt")]
    #[test]
    fn test_cbc_decrypt_sp800_38a() {
        let mut aes = Aes::new(&KEY, Some(&IV), Direction::Decrypt).unwrap();
        let mut out = [0u8; 64];
        aes.cbc_decrypt(&mut out[..32], &CT[..32]).unwrap();
        aes.cbc_decrypt(&mut out[32..], &CT[32..]).unwrap();
        assert_eq!(out, PT);
    }

    #[test]
    fn test_cbc_rejects_partial_block() {
        let mut aes = Aes::new(&KEY, Some(&IV), Direction::Encrypt).unwrap();
        let mut out = [0u8; 64];
        assert_eq!(
            aes.cbc_encrypt(&mut out, &PT[..33]),
            Err(AesError::BadLength(33))
        );
        // register untouched by the failed call
        assert_eq!(aes.iv(), &IV);
    }

    #[test]
    fn test_cbc_empty_is_noop() {
        let mut aes = Aes::new(&KEY, Some(&IV), Direction::Encrypt).unwrap();
        aes.cbc_encrypt(&mut [], &[]).unwrap();
        assert_eq!(aes.iv(), &IV);
    }

    #[test]
    fn test_cbc_encrypt_needs_encrypt_schedule() {
        if !cfg!(feature = "aes-decrypt") {
            return;
        }
        let mut aes = Aes::new(&KEY, Some(&IV), Direction::Decrypt).unwrap();
        let mut out = [0u8; 16];
        assert!(matches!(
            aes.cbc_encrypt(&mut out, &PT[..16]),
            Err(AesError::BadFuncArg(_))
        ));
    }
}
