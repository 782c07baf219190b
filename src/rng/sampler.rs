//! Unbiased integer sampling and shuffling over a shared secure buffer

use std::sync::Arc;

use parking_lot::Mutex;

use super::buffer::SecureBuffer;
use super::{EntropySource, OsEntropy};
use crate::error::{KeyspaceError, Result};
use crate::types::{SamplerSnapshot, SamplerStats};

/// Sequences up to this length draw all swap indices in one buffered read
const SHORT_SHUFFLE: usize = 256;

/// How a draw over `[0, n)` turns raw bytes into a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    /// One byte reduced mod n. Bias is at most `(256 mod n) / 256`.
    Byte,
    /// Four big-endian bytes, rejected at or above `limit`
    Rejection { limit: u64 },
    /// Four bytes reduced mod n with no rejection; biased, used when
    /// `n >= 2^32` leaves no multiple of n below `2^32`
    Wide,
}

impl Strategy {
    fn for_range(n: usize) -> Result<Self> {
        if n <= 1 {
            return Err(KeyspaceError::invalid_range(n));
        }
        if n <= 256 {
            return Ok(Self::Byte);
        }

        let space = 1u64 << 32;
        let n = n as u64;
        if n < space {
            Ok(Self::Rejection {
                limit: space / n * n,
            })
        } else {
            Ok(Self::Wide)
        }
    }

    fn width(self) -> usize {
        match self {
            Self::Byte => 1,
            Self::Rejection { .. } | Self::Wide => 4,
        }
    }

    /// Map raw bytes to a value, or `None` if the draw must be rejected
    fn select(self, raw: &[u8], n: usize) -> Option<usize> {
        match self {
            Self::Byte => Some(raw[0] as usize % n),
            Self::Rejection { limit } => {
                let value = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as u64;
                (value < limit).then(|| (value % n as u64) as usize)
            }
            Self::Wide => {
                let value = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as u64;
                Some((value % n as u64) as usize)
            }
        }
    }
}

/// Draws uniformly distributed integers from a secure entropy source
///
/// The random byte buffer sits behind one lock that is held only while
/// bytes are copied out or refilled; rejection loops run unlocked.
pub struct UnbiasedSampler {
    buffer: Mutex<SecureBuffer>,
    stats: Arc<SamplerStats>,
}

impl UnbiasedSampler {
    /// Create a sampler over the operating system CSPRNG
    pub fn new() -> Self {
        Self::with_source(OsEntropy)
    }

    /// Create a sampler over a custom entropy source
    pub fn with_source<S>(source: S) -> Self
    where
        S: EntropySource + 'static,
    {
        let stats = Arc::new(SamplerStats::new());
        Self {
            buffer: Mutex::new(SecureBuffer::new(Box::new(source), Arc::clone(&stats))),
            stats,
        }
    }

    /// Fill `dest` with secure random bytes
    pub fn fill_bytes(&self, dest: &mut [u8]) -> Result<()> {
        self.buffer.lock().read(dest)
    }

    /// Draw a value uniformly from `[0, n)`
    ///
    /// Fails with `InvalidRange` when `n <= 1`. Ranges up to 256 use a
    /// single byte; ranges below `2^32` use rejection sampling and are exactly
    /// uniform; larger ranges use a single 4-byte draw.
    pub fn sample(&self, n: usize) -> Result<usize> {
        let strategy = Strategy::for_range(n)?;
        self.draw(strategy, n)
    }

    /// Draw `count` independent values from `[0, n)`
    ///
    /// Bytes for every draw are fetched up front in one read; only
    /// rejected draws go back to the buffer.
    pub fn sample_many(&self, n: usize, count: usize) -> Result<Vec<usize>> {
        let strategy = Strategy::for_range(n)?;
        let width = strategy.width();

        let mut raw = vec![0u8; width * count];
        self.fill_bytes(&mut raw)?;
        self.stats.add_draws(count as u64);

        let mut values = Vec::with_capacity(count);
        for chunk in raw.chunks_exact(width) {
            let value = match strategy.select(chunk, n) {
                Some(value) => value,
                None => {
                    self.stats.increment_rejections();
                    self.redraw(strategy, n)?
                }
            };
            values.push(value);
        }
        Ok(values)
    }

    /// Fisher-Yates shuffle, from the last index down to 1
    pub fn shuffle<T>(&self, items: &mut [T]) -> Result<()> {
        let len = items.len();
        if len < 2 {
            return Ok(());
        }

        if len <= SHORT_SHUFFLE {
            // every range i+1 is at most 256, so one byte per swap
            let mut raw = vec![0u8; len - 1];
            self.fill_bytes(&mut raw)?;
            self.stats.add_draws(raw.len() as u64);
            for (i, byte) in (1..len).rev().zip(raw) {
                let j = byte as usize % (i + 1);
                items.swap(i, j);
            }
            return Ok(());
        }

        for i in (1..len).rev() {
            let j = self.sample(i + 1)?;
            items.swap(i, j);
        }
        Ok(())
    }

    /// Counters for bytes served, refills and rejections
    pub fn stats(&self) -> SamplerSnapshot {
        self.stats.snapshot()
    }

    fn draw(&self, strategy: Strategy, n: usize) -> Result<usize> {
        self.stats.add_draws(1);
        self.redraw(strategy, n)
    }

    fn redraw(&self, strategy: Strategy, n: usize) -> Result<usize> {
        let mut raw = [0u8; 4];
        let raw = &mut raw[..strategy.width()];
        loop {
            self.fill_bytes(raw)?;
            match strategy.select(raw, n) {
                Some(value) => return Ok(value),
                None => self.stats.increment_rejections(),
            }
        }
    }
}

impl Default for UnbiasedSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UnbiasedSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnbiasedSampler")
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}
