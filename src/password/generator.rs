//! Random password generator with per-class minimums

use std::sync::Arc;

use crate::error::{KeyspaceError, Result};
use crate::requirements_error;
use crate::rng::UnbiasedSampler;
use crate::space::{Charset, SYMBOLS};
use crate::types::GeneratorConfig;

/// Generates random passwords that satisfy character class rules
///
/// Minimum lowercase, uppercase and symbol counts are filled first, the
/// rest comes from non-symbol characters, and the result is shuffled.
#[derive(Debug, Clone)]
pub struct PasswordGenerator {
    config: GeneratorConfig,
    charset: Charset,
    lower: Option<Charset>,
    upper: Option<Charset>,
    symbols: Option<Charset>,
    non_symbols: Option<Charset>,
    sampler: Arc<UnbiasedSampler>,
}

impl PasswordGenerator {
    /// Create a generator, rejecting rules the charset cannot satisfy
    pub fn new(config: GeneratorConfig, sampler: Arc<UnbiasedSampler>) -> Result<Self> {
        let charset = Charset::new(&config.charset)?;
        if config.length == 0 {
            return Err(KeyspaceError::ZeroLength);
        }

        let lower = charset.filter(char::is_lowercase);
        let upper = charset.filter(char::is_uppercase);
        let symbols = charset.filter(|c| SYMBOLS.contains(c));
        let non_symbols = charset.filter(|c| !SYMBOLS.contains(c));

        let length = config.length;
        if config.min_lower > 0 && lower.is_none() {
            return Err(requirements_error!("found no lower-case characters to use in charset"));
        }
        if config.min_lower > length {
            return Err(requirements_error!(
                "minimum number of lower-case characters ({}) is longer than the password ({})",
                config.min_lower,
                length
            ));
        }
        if config.min_upper > 0 && upper.is_none() {
            return Err(requirements_error!("found no upper-case characters to use in charset"));
        }
        if config.min_upper > length {
            return Err(requirements_error!(
                "minimum number of upper-case characters ({}) is longer than the password ({})",
                config.min_upper,
                length
            ));
        }
        if (config.min_symbols > 0 || config.max_symbols > 0) && symbols.is_none() {
            return Err(requirements_error!("found no symbols to use in charset"));
        }
        if config.min_symbols > length {
            return Err(requirements_error!(
                "minimum number of symbols ({}) is longer than the password ({})",
                config.min_symbols,
                length
            ));
        }
        if config.min_lower + config.min_upper + config.min_symbols > length {
            return Err(requirements_error!(
                "minimum lower-case + upper-case + symbols is longer than the password ({})",
                length
            ));
        }
        if non_symbols.is_none() && config.min_symbols < length {
            return Err(requirements_error!(
                "charset has only symbols but fewer than {} are required",
                length
            ));
        }

        tracing::debug!(
            charset_len = charset.len(),
            length = length,
            min_lower = config.min_lower,
            min_upper = config.min_upper,
            min_symbols = config.min_symbols,
            max_symbols = config.max_symbols,
            "Password generator created"
        );

        Ok(Self {
            config,
            charset,
            lower,
            upper,
            symbols,
            non_symbols,
            sampler,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    /// Generate one password
    pub fn generate(&self) -> Result<String> {
        let mut password = Vec::with_capacity(self.config.length);

        self.fill(&mut password, self.lower.as_ref(), self.config.min_lower)?;
        self.fill(&mut password, self.upper.as_ref(), self.config.min_upper)?;
        let num_symbols = self.num_symbols()?;
        self.fill(&mut password, self.symbols.as_ref(), num_symbols)?;
        let remaining = self.config.length - password.len();
        self.fill(&mut password, self.non_symbols.as_ref(), remaining)?;

        self.sampler.shuffle(&mut password)?;
        Ok(password.into_iter().collect())
    }

    /// Generate `count` passwords
    pub fn generate_many(&self, count: usize) -> Result<Vec<String>> {
        (0..count).map(|_| self.generate()).collect()
    }

    /// Append up to `count` characters from `set`, never past the length
    fn fill(&self, password: &mut Vec<char>, set: Option<&Charset>, count: usize) -> Result<()> {
        let count = count.min(self.config.length - password.len());
        if count == 0 {
            return Ok(());
        }
        let Some(set) = set else {
            return Err(KeyspaceError::EmptyCharset);
        };

        let symbols = set.symbols();
        if symbols.len() == 1 {
            password.extend(std::iter::repeat(symbols[0]).take(count));
            return Ok(());
        }
        for idx in self.sampler.sample_many(symbols.len(), count)? {
            password.push(symbols[idx]);
        }
        Ok(())
    }

    fn num_symbols(&self) -> Result<usize> {
        let (min, max) = (self.config.min_symbols, self.config.max_symbols);
        if max <= min {
            return Ok(min);
        }
        Ok(min + self.sampler.sample(max - min + 1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::{ALL_CHARS, LOWERCASE, NUMBERS};

    fn generator(config: GeneratorConfig) -> Result<PasswordGenerator> {
        PasswordGenerator::new(config, Arc::new(UnbiasedSampler::new()))
    }

    #[test]
    fn test_default_generation() {
        let gen = generator(GeneratorConfig::default()).unwrap();
        let charset = gen.charset().clone();
        for password in gen.generate_many(50).unwrap() {
            assert_eq!(password.chars().count(), 12);
            assert!(password.chars().all(|c| charset.contains(c)));
        }
    }

    #[test]
    fn test_minimums_respected() {
        let config = GeneratorConfig {
            charset: ALL_CHARS.to_string(),
            length: 12,
            min_lower: 3,
            min_upper: 2,
            ..Default::default()
        }
        .with_symbols(2, 4);
        let gen = generator(config).unwrap();

        for password in gen.generate_many(100).unwrap() {
            let lower = password.chars().filter(|c| c.is_lowercase()).count();
            let upper = password.chars().filter(|c| c.is_uppercase()).count();
            let symbols = password.chars().filter(|c| SYMBOLS.contains(*c)).count();
            assert!(lower >= 3, "{}", password);
            assert!(upper >= 2, "{}", password);
            assert!((2..=4).contains(&symbols), "{}", password);
        }
    }

    #[test]
    fn test_no_symbols_by_default() {
        let config = GeneratorConfig {
            charset: ALL_CHARS.to_string(),
            ..Default::default()
        };
        let gen = generator(config).unwrap();
        for password in gen.generate_many(50).unwrap() {
            assert!(!password.chars().any(|c| SYMBOLS.contains(c)));
        }
    }

    #[test]
    fn test_single_symbol_class() {
        let config = GeneratorConfig {
            charset: "a!".to_string(),
            length: 4,
            ..Default::default()
        }
        .with_symbols(1, 1);
        let gen = generator(config).unwrap();
        let mut password: Vec<char> = gen.generate().unwrap().chars().collect();
        password.sort_unstable();
        assert_eq!(password, vec!['!', 'a', 'a', 'a']);
    }

    #[test]
    fn test_rule_validation() {
        let cases = vec![
            GeneratorConfig {
                charset: NUMBERS.to_string(),
                min_lower: 1,
                ..Default::default()
            },
            GeneratorConfig {
                charset: LOWERCASE.to_string(),
                min_upper: 1,
                ..Default::default()
            },
            GeneratorConfig {
                charset: LOWERCASE.to_string(),
                ..Default::default()
            }
            .with_symbols(1, 2),
            GeneratorConfig {
                min_lower: 13,
                ..Default::default()
            },
            GeneratorConfig {
                min_lower: 6,
                min_upper: 7,
                ..Default::default()
            },
            GeneratorConfig {
                charset: "!@".to_string(),
                ..Default::default()
            },
        ];
        for config in cases {
            let err = generator(config.clone()).unwrap_err();
            assert!(
                matches!(err, KeyspaceError::Requirements { .. }),
                "{:?} -> {:?}",
                config,
                err
            );
        }
    }

    #[test]
    fn test_symbol_range_without_symbols_rejected() {
        let config = GeneratorConfig {
            charset: LOWERCASE.to_string(),
            ..Default::default()
        }
        .with_symbols(0, 3);
        assert!(matches!(
            generator(config).unwrap_err(),
            KeyspaceError::Requirements { .. }
        ));

        // an optional symbol range over a charset that has symbols still works
        let config = GeneratorConfig {
            charset: ALL_CHARS.to_string(),
            ..Default::default()
        }
        .with_symbols(0, 3);
        let gen = generator(config).unwrap();
        for password in gen.generate_many(200).unwrap() {
            let symbols = password.chars().filter(|c| SYMBOLS.contains(*c)).count();
            assert!(symbols <= 3, "{}", password);
        }
    }

    #[test]
    fn test_basic_errors() {
        let empty = GeneratorConfig {
            charset: String::new(),
            ..Default::default()
        };
        assert_eq!(generator(empty).unwrap_err(), KeyspaceError::EmptyCharset);

        let zero = GeneratorConfig {
            length: 0,
            ..Default::default()
        };
        assert_eq!(generator(zero).unwrap_err(), KeyspaceError::ZeroLength);
    }
}
