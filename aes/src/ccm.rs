//! AES-CCM (NIST SP 800-38C, RFC 3610).
//!
//! CBC-MAC over `B0 || encoded AAD || plaintext`, then CTR encryption with
//! counter blocks `A_i`. `A_0` masks the tag; data uses `A_1` onwards.

use zeroize::Zeroize;

use crate::cipher::{Aes, Direction};
use crate::config::AesConfig;
use crate::error::{AesError, Result};
use crate::modes::check_buffers;
use crate::util::{ct_eq, inc_be, xor_in_place};
use crate::{Block, BLOCK_SIZE};

/// Shortest CCM nonce.
pub const CCM_NONCE_MIN_SZ: usize = 7;
/// Longest CCM nonce.
pub const CCM_NONCE_MAX_SZ: usize = 13;

/// Accept even tag lengths from 4 to 16.
pub fn check_tag_size(len: usize) -> Result<()> {
    match len {
        4 | 6 | 8 | 10 | 12 | 14 | 16 => Ok(()),
        _ => Err(AesError::BadFuncArg("CCM tag length must be even, 4..=16")),
    }
}

/// Running CBC-MAC with implicit zero padding.
struct CbcMac<'a> {
    aes: &'a Aes,
    x: Block,
    fill: usize,
}

impl<'a> CbcMac<'a> {
    fn new(aes: &'a Aes) -> Self {
        Self {
            aes,
            x: [0; BLOCK_SIZE],
            fill: 0,
        }
    }

    fn absorb(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let take = (BLOCK_SIZE - self.fill).min(data.len());
            xor_in_place(&mut self.x[self.fill..self.fill + take], &data[..take]);
            self.fill += take;
            data = &data[take..];
            if self.fill == BLOCK_SIZE {
                self.aes.encrypt_in_place(&mut self.x);
                self.fill = 0;
            }
        }
    }

    /// Close the current block as if zero-padded.
    fn pad(&mut self) {
        if self.fill > 0 {
            self.aes.encrypt_in_place(&mut self.x);
            self.fill = 0;
        }
    }

    fn finish(mut self) -> Block {
        self.pad();
        let out = self.x;
        self.x.zeroize();
        out
    }
}

/// AES-CCM keyed state.
#[derive(Debug)]
pub struct AesCcm {
    aes: Aes,
}

impl AesCcm {
    pub fn new(key: &[u8]) -> Result<Self> {
        Self::with_config(key, AesConfig::default())
    }

    pub fn with_config(key: &[u8], config: AesConfig) -> Result<Self> {
        Ok(Self {
            aes: Aes::with_config(key, None, Direction::Encrypt, config)?,
        })
    }

    /// Replace the key; the old schedule is zeroed.
    pub fn set_key(&mut self, key: &[u8]) -> Result<()> {
        self.aes.set_key(key, None, Direction::Encrypt)
    }

    /// Encrypt `input` into `out` and write a `tag.len()`-byte tag.
    pub fn encrypt(
        &self,
        out: &mut [u8],
        input: &[u8],
        nonce: &[u8],
        tag: &mut [u8],
        aad: &[u8],
    ) -> Result<()> {
        self.check_args(out, input, nonce, tag.len(), aad)?;

        let mut mac = self.mac(nonce, aad, input, tag.len());
        let mut a = counter_block(nonce);
        let mut s0 = a;
        self.aes.encrypt_in_place(&mut s0);
        xor_in_place(&mut mac, &s0);
        tag.copy_from_slice(&mac[..tag.len()]);

        let len_sz = BLOCK_SIZE - 1 - nonce.len();
        let out = &mut out[..input.len()];
        out.copy_from_slice(input);
        inc_be(&mut a[BLOCK_SIZE - len_sz..]);
        self.aes
            .ctr_xor(&mut a, out, |ctr| inc_be(&mut ctr[BLOCK_SIZE - len_sz..]));

        mac.zeroize();
        s0.zeroize();
        a.zeroize();
        Ok(())
    }

    /// Decrypt `input` into `out` and verify `tag`.
    ///
    /// On mismatch the first `input.len()` bytes of `out` are zeroed and
    /// [`AesError::AuthenticationFailed`] is returned.
    pub fn decrypt(
        &self,
        out: &mut [u8],
        input: &[u8],
        nonce: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<()> {
        self.check_args(out, input, nonce, tag.len(), aad)?;

        let len_sz = BLOCK_SIZE - 1 - nonce.len();
        let out = &mut out[..input.len()];
        out.copy_from_slice(input);
        let mut a = counter_block(nonce);
        let mut s0 = a;
        self.aes.encrypt_in_place(&mut s0);
        inc_be(&mut a[BLOCK_SIZE - len_sz..]);
        self.aes
            .ctr_xor(&mut a, out, |ctr| inc_be(&mut ctr[BLOCK_SIZE - len_sz..]));

        let mut mac = self.mac(nonce, aad, out, tag.len());
        xor_in_place(&mut mac, &s0);
        let ok = ct_eq(&mac[..tag.len()], tag);
        mac.zeroize();
        s0.zeroize();
        a.zeroize();

        if !ok {
            out.zeroize();
            log::debug!("[KPIO AES] CCM tag mismatch");
            return Err(AesError::AuthenticationFailed);
        }
        Ok(())
    }

    fn check_args(
        &self,
        out: &[u8],
        input: &[u8],
        nonce: &[u8],
        tag_len: usize,
        aad: &[u8],
    ) -> Result<()> {
        if !(CCM_NONCE_MIN_SZ..=CCM_NONCE_MAX_SZ).contains(&nonce.len()) {
            return Err(AesError::BadFuncArg("CCM nonce must be 7..=13 bytes"));
        }
        check_tag_size(tag_len)?;
        check_buffers(out, input)?;

        let len_sz = BLOCK_SIZE - 1 - nonce.len();
        if len_sz < 8 && (input.len() as u64) >> (8 * len_sz) != 0 {
            return Err(AesError::BadFuncArg("CCM message too long for nonce size"));
        }
        if aad.len() as u64 > u64::from(u32::MAX) {
            return Err(AesError::BadFuncArg("CCM AAD too long"));
        }
        self.aes.check_rounds()
    }

    /// CBC-MAC of `B0`, the length-prefixed AAD and `payload`.
    fn mac(&self, nonce: &[u8], aad: &[u8], payload: &[u8], tag_len: usize) -> Block {
        let len_sz = BLOCK_SIZE - 1 - nonce.len();

        let mut b0 = [0u8; BLOCK_SIZE];
        let adata = if aad.is_empty() { 0 } else { 0x40 };
        b0[0] = adata | (((tag_len - 2) / 2) as u8) << 3 | (len_sz - 1) as u8;
        b0[1..1 + nonce.len()].copy_from_slice(nonce);
        let len = (payload.len() as u64).to_be_bytes();
        b0[BLOCK_SIZE - len_sz..].copy_from_slice(&len[8 - len_sz..]);

        let mut mac = CbcMac::new(&self.aes);
        mac.absorb(&b0);
        b0.zeroize();

        if !aad.is_empty() {
            let mut header = [0u8; 6];
            let header_len = if aad.len() <= 0xFEFF {
                header[..2].copy_from_slice(&(aad.len() as u16).to_be_bytes());
                2
            } else {
                header[0] = 0xFF;
                header[1] = 0xFE;
                header[2..].copy_from_slice(&(aad.len() as u32).to_be_bytes());
                6
            };
            mac.absorb(&header[..header_len]);
            mac.absorb(aad);
            mac.pad();
        }

        mac.absorb(payload);
        mac.finish()
    }
}

/// `A_0`: flags `L - 1`, the nonce, and a zero counter.
fn counter_block(nonce: &[u8]) -> Block {
    let len_sz = BLOCK_SIZE - 1 - nonce.len();
    let mut a = [0u8; BLOCK_SIZE];
    a[0] = (len_sz - 1) as u8;
    a[1..1 + nonce.len()].copy_from_slice(nonce);
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn test_rfc3610_packet_vector_1() {
        let ccm = AesCcm::new(&hex!("c0c1c2c3c4c5c6c7c8c9cacbcccdcecf")).unwrap();
        let nonce = hex!("00000003020100a0a1a2a3a4a5");
        let aad = hex!("0001020304050607");
        let pt = hex!("08090a0b0c0d0e0f101112131415161718191a1b1c1d1e");
        let mut ct = [0u8; 23];
        let mut tag = [0u8; 8];
        ccm.encrypt(&mut ct, &pt, &nonce, &mut tag, &aad).unwrap();
        assert_eq!(ct, hex!("588c979a61c663d2f066d0c2c0f989806d5f6b61dac384"));
        assert_eq!(tag, hex!("17e8d12cfdf926e0"));

        let mut back = [0u8; 23];
        ccm.decrypt(&mut back, &ct, &nonce, &tag, &aad).unwrap();
        assert_eq!(back, pt);
    }

    #[test]
    fn test_sp800_38c_example_1() {
        let ccm = AesCcm::new(&hex!("404142434445464748494a4b4c4d4e4f")).unwrap();
        let mut ct = [0u8; 4];
        let mut tag = [0u8; 4];
        ccm.encrypt(
            &mut ct,
            &hex!("20212223"),
            &hex!("10111213141516"),
            &mut tag,
            &hex!("0001020304050607"),
        )
        .unwrap();
        assert_eq!(ct, hex!("7162015b"));
        assert_eq!(tag, hex!("4dac255d"));
    }

    #[test]
    fn test_tamper_zeroes_output() {
        let ccm = AesCcm::new(&[0x42u8; 16]).unwrap();
        let nonce = [1u8; 12];
        let pt = [0x33u8; 40];
        let mut ct = [0u8; 40];
        let mut tag = [0u8; 16];
        ccm.encrypt(&mut ct, &pt, &nonce, &mut tag, b"hdr").unwrap();

        tag[0] ^= 1;
        let mut back = [0xffu8; 40];
        assert_eq!(
            ccm.decrypt(&mut back, &ct, &nonce, &tag, b"hdr"),
            Err(AesError::AuthenticationFailed)
        );
        assert_eq!(back, [0u8; 40]);
    }

    #[test]
    fn test_check_tag_size() {
        for len in [4, 6, 8, 10, 12, 14, 16] {
            assert!(check_tag_size(len).is_ok());
        }
        for len in [0, 2, 3, 5, 15, 17, 18] {
            assert!(check_tag_size(len).is_err());
        }
    }

    #[test]
    fn test_nonce_and_length_bounds() {
        let ccm = AesCcm::new(&[0u8; 16]).unwrap();
        let mut tag = [0u8; 8];
        assert!(ccm.encrypt(&mut [], &[], &[0u8; 6], &mut tag, &[]).is_err());
        assert!(ccm.encrypt(&mut [], &[], &[0u8; 14], &mut tag, &[]).is_err());
        assert!(ccm.encrypt(&mut [], &[], &[0u8; 13], &mut tag, &[]).is_ok());

        // 13-byte nonce leaves a 2-byte length field
        let big = [0u8; 0x1_0000];
        let mut out = [0u8; 0x1_0000];
        assert!(matches!(
            ccm.encrypt(&mut out, &big, &[0u8; 13], &mut tag, &[]),
            Err(AesError::BadFuncArg(_))
        ));
        assert_eq!(
            ccm.encrypt(&mut out, &big, &[0u8; 12], &mut tag, &[]),
            Ok(())
        );
    }

    #[test]
    fn test_aad_length_prefix_known_answer() {
        // 0xFEFF bytes still takes the 2-byte prefix; 0xFF00 switches to
        // 0xFFFE followed by a 4-byte length.
        let ccm = AesCcm::new(&[0x24u8; 32]).unwrap();
        let nonce = [9u8; 11];
        let pt = [0x11u8; 31];
        let aad = [0x5au8; 0xFF00];
        let expected_ct = hex!("2e7fbdbfe17e20041c898ceb01a179a1" "eaf90d537954e9a508cd5e77a8e62d");
        let cases = [
            (0xFEFF, hex!("e606857d376f2f4a5ea5")),
            (0xFF00, hex!("6940237dd5374f66e530")),
        ];
        for (aad_len, expected_tag) in cases {
            let mut ct = [0u8; 31];
            let mut tag = [0u8; 10];
            ccm.encrypt(&mut ct, &pt, &nonce, &mut tag, &aad[..aad_len]).unwrap();
            assert_eq!(ct, expected_ct);
            assert_eq!(tag, expected_tag, "AAD length {:#x}", aad_len);

            let mut back = [0u8; 31];
            ccm.decrypt(&mut back, &ct, &nonce, &tag, &aad[..aad_len]).unwrap();
            assert_eq!(back, pt);
        }
    }
}
