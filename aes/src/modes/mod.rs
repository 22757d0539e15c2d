//! Chaining modes over multi-block buffers.
//!
//! ECB, CBC and CTR are methods on [`Aes`](crate::Aes) and use its
//! register; XTS needs a second key and has its own [`XtsAes`] type.
//!
//! Every mode writes `input.len()` bytes to the front of `out` and fails
//! with `BadFuncArg` if `out` is shorter than `input`.

mod cbc;
mod ctr;
mod ecb;
mod xts;

pub use xts::XtsAes;

use crate::error::{AesError, Result};

pub(crate) fn check_buffers(out: &[u8], input: &[u8]) -> Result<()> {
    if out.len() < input.len() {
        return Err(AesError::BadFuncArg("output buffer shorter than input"));
    }
    Ok(())
}
