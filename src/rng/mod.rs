//! Secure randomness - entropy sources, buffering and unbiased sampling

mod buffer;
mod sampler;

pub use buffer::BUFFER_SIZE;
pub use sampler::UnbiasedSampler;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{KeyspaceError, Result};

/// Source of cryptographically secure random bytes
///
/// Implementations must fill the whole destination or fail; a short read is
/// an error. The sampler never retries a failed fill.
pub trait EntropySource: Send {
    /// Fill `dest` entirely with random bytes
    fn fill(&mut self, dest: &mut [u8]) -> Result<()>;

    /// Name used in logs
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Operating system CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&mut self, dest: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            tracing::warn!(source = "os", error = %e, bytes = dest.len(), "Entropy read failed");
            KeyspaceError::from(e)
        })
    }

    fn name(&self) -> &'static str {
        "os"
    }
}
