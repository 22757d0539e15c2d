//! ARMv8 Crypto Extensions backend.
//!
//! AESE/AESMC for encryption and AESD/AESIMC for decryption over the same
//! key schedule the software path uses. On other targets, or when the CPU
//! lacks the extension, every call falls through to [`Software`].

use super::key_schedule::KeySchedule;
use super::soft::Software;
use super::BlockBackend;
use crate::Block;

/// Hardware AES backend for aarch64.
#[derive(Debug, Clone, Copy, Default)]
pub struct Armv8;

/// Whether the AES instructions can be used on this CPU.
pub fn available() -> bool {
    #[cfg(all(target_arch = "aarch64", feature = "armv8"))]
    {
        imp::has_aes()
    }
    #[cfg(not(all(target_arch = "aarch64", feature = "armv8")))]
    {
        false
    }
}

impl BlockBackend for Armv8 {
    fn encrypt_block(&self, schedule: &KeySchedule, block: &mut Block) {
        #[cfg(all(target_arch = "aarch64", feature = "armv8"))]
        {
            if available() {
                // SAFETY: the aes feature was detected above.
                unsafe { imp::encrypt(schedule, block) };
                return;
            }
        }
        Software.encrypt_block(schedule, block)
    }

    fn decrypt_block(&self, schedule: &KeySchedule, block: &mut Block) {
        #[cfg(all(target_arch = "aarch64", feature = "armv8"))]
        {
            if available() {
                // SAFETY: the aes feature was detected above.
                unsafe { imp::decrypt(schedule, block) };
                return;
            }
        }
        Software.decrypt_block(schedule, block)
    }
}

#[cfg(all(target_arch = "aarch64", feature = "armv8"))]
mod imp {
    use core::arch::aarch64::*;

    use crate::cipher::KeySchedule;
    use crate::Block;

    pub(super) fn has_aes() -> bool {
        #[cfg(feature = "std")]
        {
            std::arch::is_aarch64_feature_detected!("aes")
        }
        #[cfg(not(feature = "std"))]
        {
            cfg!(target_feature = "aes")
        }
    }

    #[inline(always)]
    unsafe fn load_round_key(schedule: &KeySchedule, r: usize) -> uint8x16_t {
        let bytes = schedule.round_key_bytes(r);
        // SAFETY: `bytes` is 16 readable bytes.
        unsafe { vld1q_u8(bytes.as_ptr()) }
    }

    #[target_feature(enable = "aes,neon")]
    pub(super) unsafe fn encrypt(schedule: &KeySchedule, block: &mut Block) {
        let rounds = schedule.rounds();
        // SAFETY: `block` is 16 readable and writable bytes, the caller
        // guarantees the aes feature.
        unsafe {
            let mut state = vld1q_u8(block.as_ptr());
            for r in 0..rounds - 1 {
                state = vaeseq_u8(state, load_round_key(schedule, r));
                state = vaesmcq_u8(state);
            }
            state = vaeseq_u8(state, load_round_key(schedule, rounds - 1));
            state = veorq_u8(state, load_round_key(schedule, rounds));
            vst1q_u8(block.as_mut_ptr(), state);
        }
    }

    #[target_feature(enable = "aes,neon")]
    pub(super) unsafe fn decrypt(schedule: &KeySchedule, block: &mut Block) {
        let rounds = schedule.rounds();
        // SAFETY: as in `encrypt`.
        unsafe {
            let mut state = vld1q_u8(block.as_ptr());
            for r in 0..rounds - 1 {
                state = vaesdq_u8(state, load_round_key(schedule, r));
                state = vaesimcq_u8(state);
            }
            state = vaesdq_u8(state, load_round_key(schedule, rounds - 1));
            state = veorq_u8(state, load_round_key(schedule, rounds));
            vst1q_u8(block.as_mut_ptr(), state);
        }
    }
}
