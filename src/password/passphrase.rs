//! Random passphrases drawn from a word list

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{KeyspaceError, Result};
use crate::rng::UnbiasedSampler;
use crate::types::PassphraseConfig;

/// Fewest words a passphrase may have
pub const MIN_NUM_WORDS: usize = 2;

/// Fewest usable words a dictionary must offer
pub const MIN_DICTIONARY_WORDS: usize = 256;

/// Generates passphrases of distinct dictionary words
///
/// The dictionary is trimmed, de-duplicated and restricted to the configured
/// word-length range once, at construction.
#[derive(Debug, Clone)]
pub struct PassphraseGenerator {
    config: PassphraseConfig,
    dictionary: Vec<String>,
    sampler: Arc<UnbiasedSampler>,
}

impl PassphraseGenerator {
    pub fn new(
        config: PassphraseConfig,
        words: Vec<String>,
        sampler: Arc<UnbiasedSampler>,
    ) -> Result<Self> {
        let (min, max) = (config.word_len_min, config.word_len_max);
        if min < 1 || min > max {
            return Err(KeyspaceError::WordLengthInvalid { min, max });
        }

        let mut seen = HashSet::new();
        let dictionary: Vec<String> = words
            .into_iter()
            .map(|word| word.trim().to_string())
            .filter(|word| (min..=max).contains(&word.chars().count()))
            .filter(|word| seen.insert(word.clone()))
            .collect();
        if dictionary.len() < MIN_DICTIONARY_WORDS {
            return Err(KeyspaceError::DictionaryTooSmall {
                found: dictionary.len(),
                min: MIN_DICTIONARY_WORDS,
            });
        }

        if config.num_words < MIN_NUM_WORDS {
            return Err(KeyspaceError::NumWordsInvalid { min: MIN_NUM_WORDS });
        }
        if config.num_words > dictionary.len() {
            return Err(KeyspaceError::requirements(format!(
                "{} distinct words requested from a dictionary of {}",
                config.num_words,
                dictionary.len()
            )));
        }

        tracing::debug!(
            dictionary = dictionary.len(),
            num_words = config.num_words,
            capitalize = config.capitalize,
            with_number = config.with_number,
            "Passphrase generator created"
        );

        Ok(Self {
            config,
            dictionary,
            sampler,
        })
    }

    pub fn config(&self) -> &PassphraseConfig {
        &self.config
    }

    /// Usable words after filtering
    pub fn dictionary_len(&self) -> usize {
        self.dictionary.len()
    }

    /// Generate one passphrase
    pub fn generate(&self) -> Result<String> {
        let mut picked: Vec<usize> = Vec::with_capacity(self.config.num_words);
        while picked.len() < self.config.num_words {
            let idx = self.sampler.sample(self.dictionary.len())?;
            if !picked.contains(&idx) {
                picked.push(idx);
            }
        }

        let mut words: Vec<String> = picked
            .into_iter()
            .map(|idx| {
                let word = &self.dictionary[idx];
                if self.config.capitalize {
                    capitalize(word)
                } else {
                    word.clone()
                }
            })
            .collect();

        if self.config.with_number {
            let idx = self.sampler.sample(words.len())?;
            let digit = self.sampler.sample(10)?;
            words[idx].push_str(&digit.to_string());
        }

        Ok(words.join(&self.config.separator))
    }

    /// Generate `count` passphrases
    pub fn generate_many(&self, count: usize) -> Result<Vec<String>> {
        (0..count).map(|_| self.generate()).collect()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
