//! Keyspace - exact enumeration and unbiased sampling of fixed-length strings
//!
//! Two engines share one charset model:
//!
//! - [`Odometer`] walks every string of a given length in lexicographic
//!   order and can jump to any 1-indexed location, however large.
//! - [`UnbiasedSampler`] draws uniformly distributed indices from a
//!   buffered secure random source.
//!
//! [`PasswordGenerator`], [`PassphraseGenerator`] and [`PasswordSequencer`]
//! build on them.

pub mod error;
pub mod password;
pub mod rng;
pub mod space;
pub mod types;

// Re-export commonly used types
pub use error::{KeyspaceError, Result};
pub use types::{
    GeneratorConfig, PassphraseConfig, SamplerSnapshot, SamplerStats, SequencerConfig,
};

// Re-export main functionality
pub use password::{PassphraseGenerator, PasswordGenerator, PasswordSequencer, StreamSummary};
pub use rng::{EntropySource, OsEntropy, UnbiasedSampler};
pub use space::{Charset, Odometer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() -> Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();
    Ok(())
}
