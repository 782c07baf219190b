//! String spaces - charsets and the odometer that walks them

mod odometer;

pub use odometer::Odometer;

use std::collections::HashSet;
use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::{KeyspaceError, Result};
use crate::rng::UnbiasedSampler;

/// Lowercase letters (a-z)
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
/// Uppercase letters (A-Z)
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
/// Decimal digits (0-9)
pub const NUMBERS: &str = "0123456789";
/// Symbols accepted by most password policies
pub const SYMBOLS: &str = "!@#$%^&*()-_=+";
/// Uppercase then lowercase letters
pub const ALPHABETS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
/// Letters then digits
pub const ALPHANUMERIC: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
/// Letters, digits, then symbols
pub const ALL_CHARS: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

/// Look-alike characters removed by [`Charset::without_ambiguity`]
const AMBIGUOUS: &[char] = &['O', '0', 'l', 'I'];

/// Ordered, duplicate-free set of symbols
///
/// The position of a symbol is its digit value when the charset is used as a
/// numeral system by [`Odometer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    symbols: Vec<char>,
}

impl Charset {
    /// Create a charset from a string, rejecting empty input and duplicates
    pub fn new(symbols: &str) -> Result<Self> {
        Self::from_symbols(symbols.chars().collect())
    }

    /// Create a charset from a list of symbols
    pub fn from_symbols(symbols: Vec<char>) -> Result<Self> {
        if symbols.is_empty() {
            return Err(KeyspaceError::EmptyCharset);
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for &symbol in &symbols {
            if !seen.insert(symbol) {
                return Err(KeyspaceError::DuplicateSymbol { symbol });
            }
        }

        Ok(Self { symbols })
    }

    /// Lowercase letters
    pub fn lowercase() -> Self {
        Self::builtin(LOWERCASE)
    }

    /// Uppercase letters
    pub fn uppercase() -> Self {
        Self::builtin(UPPERCASE)
    }

    /// Decimal digits
    pub fn numbers() -> Self {
        Self::builtin(NUMBERS)
    }

    /// Password symbols
    pub fn symbols_set() -> Self {
        Self::builtin(SYMBOLS)
    }

    /// Letters and digits
    pub fn alphanumeric() -> Self {
        Self::builtin(ALPHANUMERIC)
    }

    /// Letters, digits and symbols
    pub fn all_chars() -> Self {
        Self::builtin(ALL_CHARS)
    }

    fn builtin(symbols: &'static str) -> Self {
        Self {
            symbols: symbols.chars().collect(),
        }
    }

    /// Build a charset from arbitrary input, dropping repeated symbols
    ///
    /// The first occurrence of each symbol keeps its position.
    pub fn without_duplicates(symbols: &str) -> Result<Self> {
        let mut seen = HashSet::new();
        let unique: Vec<char> = symbols.chars().filter(|c| seen.insert(*c)).collect();
        Self::from_symbols(unique)
    }

    /// Remove look-alike characters (`O`, `0`, `l`, `I`)
    pub fn without_ambiguity(&self) -> Result<Self> {
        self.filter(|c| !AMBIGUOUS.contains(&c))
            .ok_or(KeyspaceError::EmptyCharset)
    }

    /// Keep only the symbols matching `pred`, or `None` if nothing matches
    pub fn filter<F>(&self, pred: F) -> Option<Self>
    where
        F: Fn(char) -> bool,
    {
        let symbols: Vec<char> = self.symbols.iter().copied().filter(|c| pred(*c)).collect();
        if symbols.is_empty() {
            None
        } else {
            Some(Self { symbols })
        }
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.symbols.contains(&symbol)
    }

    /// Number of symbols, the base of the numeral system
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false; kept for API symmetry with collections
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn symbols(&self) -> &[char] {
        &self.symbols
    }

    pub fn symbol(&self, index: usize) -> Option<char> {
        self.symbols.get(index).copied()
    }

    /// Size of the space of strings of `length` symbols, `len^length`
    ///
    /// A zero length yields zero, not one: there is nothing to enumerate.
    pub fn max_combinations(&self, length: usize) -> BigUint {
        if length == 0 {
            return BigUint::zero();
        }
        num_traits::pow(BigUint::from(self.symbols.len()), length)
    }

    /// Return a copy with the symbols reordered by the given sampler
    pub fn shuffled(&self, sampler: &UnbiasedSampler) -> Result<Self> {
        let mut symbols = self.symbols.clone();
        sampler.shuffle(&mut symbols)?;
        Ok(Self { symbols })
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self::alphanumeric()
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.symbols {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Charset {
    type Err = KeyspaceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}
