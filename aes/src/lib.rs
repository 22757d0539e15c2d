//! KPIO AES Engine
//!
//! AES block cipher with chaining modes and authenticated encryption for the
//! KPIO operating system. Pure Rust, `no_std`, no allocation.
//!
//! # Architecture
//!
//! The engine is organized leaf to root:
//!
//! - `cipher`: key schedule and single-block transforms behind the
//!   [`BlockBackend`] trait (portable software tables, ARMv8 Crypto Extensions)
//! - `modes`: ECB, CBC, CTR and XTS over multi-block buffers
//! - `ghash`: GF(2^128) multiplication and the GHASH accumulator
//! - `gcm`: AES-GCM one-shot and streaming, plus GMAC
//! - `ccm`: AES-CCM (CBC-MAC then CTR)
//!
//! Secret material (round keys, hash subkeys, keystream caches, MAC scratch)
//! is zeroed on drop and on re-key.

#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "std", not(test)))]
extern crate std;

pub mod ccm;
pub mod cipher;
pub mod config;
pub mod error;
pub mod gcm;
pub mod ghash;
pub mod modes;
pub mod util;

pub use ccm::{check_tag_size, AesCcm};
pub use cipher::{Aes, Backend, BlockBackend, Direction, KeySchedule};
pub use config::{AesConfig, LengthPolicy};
pub use error::{AesError, Result};
pub use gcm::{gmac_verify, AesGcm, GcmStream, Gmac, StreamState};
pub use ghash::{ghash, gmult, GhashAccumulator, GhashKey, GhashMethod};
pub use modes::XtsAes;
pub use util::ct_eq;

/// AES block size in bytes.
pub const BLOCK_SIZE: usize = 16;

/// One AES block.
pub type Block = [u8; BLOCK_SIZE];

/// Largest round count (AES-256).
pub const MAX_ROUNDS: usize = 14;

/// Standard GCM nonce length.
pub const GCM_NONCE_MID_SZ: usize = 12;

/// Default lower bound on GCM tag length.
pub const MIN_AUTH_TAG_SZ: usize = 12;

/// Longest GCM tag.
pub const MAX_AUTH_TAG_SZ: usize = 16;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Aes, AesCcm, AesConfig, AesError, AesGcm, Direction, GcmStream, Gmac, XtsAes, BLOCK_SIZE,
    };
}
