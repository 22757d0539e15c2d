//! AES engine error type.

/// Errors produced by the AES engine.
///
/// Every fallible operation reports one of these instead of panicking.
/// Argument checks run before any cipher state is touched, so an error
/// never leaves a half-updated register behind.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AesError {
    /// Invalid argument combination, undersized buffer, or unsupported size.
    #[error("bad argument: {0}")]
    BadFuncArg(&'static str),

    /// Key length is not one the operation accepts.
    #[error("bad key size: {0} bytes")]
    BadKeySize(usize),

    /// ECB/CBC input is not a whole number of blocks.
    #[error("length {0} is not a multiple of the AES block size")]
    BadLength(usize),

    /// AEAD tag did not verify.
    #[error("authentication tag mismatch")]
    AuthenticationFailed,

    /// Key schedule carries a round count other than 10, 12 or 14.
    #[error("key schedule has unsupported round count {0}")]
    KeyUsage(usize),

    /// Decryption was requested but the `aes-decrypt` feature is disabled.
    #[error("decryption support is not compiled in")]
    DecryptionNotSupported,

    /// Streaming GCM used before a key was set.
    #[error("no key has been set")]
    MissingKey,

    /// Streaming GCM used before a nonce was set.
    #[error("no IV has been set")]
    MissingIv,

    /// Counter-nonce invocation counter is exhausted for this key.
    #[error("GCM invocation counter overflow")]
    GcmOverflow,
}

/// Result alias used across the crate.
pub type Result<T> = core::result::Result<T, AesError>;
