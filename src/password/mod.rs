//! Password builders on top of the core
//!
//! The generator draws random passwords through an [`UnbiasedSampler`], and
//! the passphrase generator draws distinct words from a caller-supplied list
//! through the same sampler. The sequencer walks every password of a space
//! in order through an [`Odometer`].
//!
//! [`UnbiasedSampler`]: crate::rng::UnbiasedSampler
//! [`Odometer`]: crate::space::Odometer

mod generator;
mod passphrase;
mod sequencer;

pub use generator::PasswordGenerator;
pub use passphrase::{PassphraseGenerator, MIN_DICTIONARY_WORDS, MIN_NUM_WORDS};
pub use sequencer::{PasswordSequencer, StreamSummary};
