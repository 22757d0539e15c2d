//! Electronic codebook mode.

use super::check_buffers;
use crate::cipher::{Aes, Direction};
use crate::error::Result;
use crate::util::load_block;
use crate::BLOCK_SIZE;

impl Aes {
    /// Encrypt each block independently. `input` must be a whole number of
    /// blocks.
    pub fn ecb_encrypt(&self, out: &mut [u8], input: &[u8]) -> Result<()> {
        check_buffers(out, input)?;
        self.require(Direction::Encrypt)?;
        self.config().length_policy.check(input.len())?;
        self.check_rounds()?;

        for (o, i) in out.chunks_exact_mut(BLOCK_SIZE).zip(input.chunks_exact(BLOCK_SIZE)) {
            let mut block = load_block(i);
            self.encrypt_in_place(&mut block);
            o.copy_from_slice(&block);
        }
        Ok(())
    }

    /// Decrypt each block independently.
    pub fn ecb_decrypt(&self, out: &mut [u8], input: &[u8]) -> Result<()> {
        check_buffers(out, input)?;
        self.require_decrypt()?;
        self.config().length_policy.check(input.len())?;
        self.check_rounds()?;

        for (o, i) in out.chunks_exact_mut(BLOCK_SIZE).zip(input.chunks_exact(BLOCK_SIZE)) {
            let mut block = load_block(i);
            self.decrypt_in_place(&mut block);
            o.copy_from_slice(&block);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AesConfig, LengthPolicy};
    use crate::error::AesError;
    use hex_literal::hex;

    const KEY: [u8; 16] = hex!("2b7e151628aed2a6abf7158809cf4f3c");
    const PT: [u8; 64] = hex!(
        "6bc1bee22e409f96e93d7e117393172a"
        "ae2d8a571e03ac9c9eb76fac45af8e51"
        "30c81c46a35ce411e5fbc1191a0a52ef"
        "f69f2445df4f9b17ad2b417be66c3710"
    );
    const CT: [u8; 64] = hex!(
        "3ad77bb40d7a3660a89ecaf32466ef97"
        "f5d3d58503b9699de785895a96fdbaaf"
        "43b1cd7f598ece23881b00e3ed030688"
        "7b0c785e27e8ad3f8223207104725dd4"
    );

    #[test]
    fn test_ecb_sp800_38a() {
        let aes = Aes::new(&KEY, None, Direction::Encrypt).unwrap();
        let mut out = [0u8; 64];
        aes.ecb_encrypt(&mut out, &PT).unwrap();
        assert_eq!(out, CT);
    }

    #[cfg(feature = "aes-decrypt")]
    #[test]
    fn test_ecb_decrypt_sp800_38a() {
        let aes = Aes::new(&KEY, None, Direction::Decrypt).unwrap();
        let mut out = [0u8; 64];
        aes.ecb_decrypt(&mut out, &CT).unwrap();
        assert_eq!(out, PT);
    }

    #[test]
    fn test_ecb_length_policy() {
        let aes = Aes::new(&KEY, None, Direction::Encrypt).unwrap();
        let mut out = [0u8; 64];
        assert_eq!(
            aes.ecb_encrypt(&mut out, &PT[..20]),
            Err(AesError::BadLength(20))
        );

        let config = AesConfig::new().with_length_policy(LengthPolicy::BadFuncArg);
        let aes = Aes::with_config(&KEY, None, Direction::Encrypt, config).unwrap();
        assert!(matches!(
            aes.ecb_encrypt(&mut out, &PT[..20]),
            Err(AesError::BadFuncArg(_))
        ));
    }

    #[test]
    fn test_ecb_short_output() {
        let aes = Aes::new(&KEY, None, Direction::Encrypt).unwrap();
        let mut out = [0u8; 16];
        assert!(matches!(
            aes.ecb_encrypt(&mut out, &PT),
            Err(AesError::BadFuncArg(_))
        ));
    }

    #[test]
    fn test_ecb_empty_input() {
        let aes = Aes::new(&KEY, None, Direction::Encrypt).unwrap();
        let mut out = [0u8; 0];
        assert_eq!(aes.ecb_encrypt(&mut out, &[]), Ok(()));
    }
}
