//! Integration tests for keyspace

use keyspace::{
    space::{ALL_CHARS, NUMBERS},
    Charset, EntropySource, GeneratorConfig, KeyspaceError, Odometer, PassphraseConfig,
    PassphraseGenerator, PasswordGenerator, PasswordSequencer, SequencerConfig, UnbiasedSampler,
};
use num_bigint::BigUint;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

/// Yields 0, 1, 2, ... wrapping at 256
struct Counting(u8);

impl EntropySource for Counting {
    fn fill(&mut self, dest: &mut [u8]) -> keyspace::Result<()> {
        for b in dest.iter_mut() {
            *b = self.0;
            self.0 = self.0.wrapping_add(1);
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

#[test]
fn test_library_init() {
    assert!(keyspace::init().is_ok());
    assert!(!keyspace::VERSION.is_empty());
}

#[test]
fn test_odometer_enumerates_whole_space_in_order() {
    let odometer = Odometer::new(Charset::new("xyz").unwrap(), 3, false).unwrap();
    let mut seen = vec![odometer.render()];
    while odometer.increment() {
        seen.push(odometer.render());
    }

    assert_eq!(seen.len(), 27);
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);
    assert_eq!(seen.first().map(String::as_str), Some("xxx"));
    assert_eq!(seen.last().map(String::as_str), Some("zzz"));
    assert_eq!(odometer.location(), BigUint::from(27u32));
}

#[test]
fn test_odometer_location_round_trip_on_big_space() {
    let odometer = Odometer::new(Charset::all_chars(), 40, false).unwrap();
    assert!(!odometer.is_fast_path());

    let target: BigUint = "123456789012345678901234567890123456789".parse().unwrap();
    let value = odometer.goto_location(&target).unwrap();
    assert_eq!(value.chars().count(), 40);

    let other = Odometer::new(Charset::all_chars(), 40, false).unwrap();
    other.seek(&value).unwrap();
    assert_eq!(other.location(), target);
}

#[test]
fn test_odometer_shared_between_threads() {
    let odometer = Arc::new(Odometer::new(Charset::new(NUMBERS).unwrap(), 6, false).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let odometer = Arc::clone(&odometer);
            thread::spawn(move || {
                for _ in 0..1000 {
                    assert!(odometer.increment());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(odometer.location(), BigUint::from(4001u32));
    assert_eq!(odometer.render(), "004000");
}

#[test]
fn test_sampler_shared_between_threads() {
    let sampler = Arc::new(UnbiasedSampler::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let sampler = Arc::clone(&sampler);
            thread::spawn(move || {
                for _ in 0..500 {
                    assert!(sampler.sample(1000).unwrap() < 1000);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = sampler.stats();
    assert_eq!(stats.draws, 2000);
    assert!(stats.refills >= 1);
}

#[test]
fn test_custom_entropy_source() {
    let sampler = UnbiasedSampler::with_source(Counting(0));
    let values = sampler.sample_many(10, 12).unwrap();
    assert_eq!(values, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0, 1]);
}

#[test]
fn test_generator_with_shared_sampler() {
    let sampler = Arc::new(UnbiasedSampler::new());
    let config = GeneratorConfig {
        charset: ALL_CHARS.to_string(),
        length: 20,
        min_lower: 2,
        min_upper: 2,
        ..Default::default()
    }
    .with_symbols(1, 3);

    let generator = PasswordGenerator::new(config, Arc::clone(&sampler)).unwrap();
    let passwords = generator.generate_many(25).unwrap();
    assert_eq!(passwords.len(), 25);
    for password in &passwords {
        assert_eq!(password.chars().count(), 20);
    }
    assert!(sampler.stats().bytes_served > 0);
}

#[test]
fn test_passphrase_generator_draws_from_injected_sampler() {
    let sampler = Arc::new(UnbiasedSampler::with_source(Counting(0)));
    let words: Vec<String> = (0..256).map(|i| format!("w{:03}", i)).collect();
    let config = PassphraseConfig {
        num_words: 3,
        capitalize: false,
        with_number: false,
        ..Default::default()
    };

    let generator = PassphraseGenerator::new(config, words, Arc::clone(&sampler)).unwrap();
    assert_eq!(generator.dictionary_len(), 256);
    assert_eq!(generator.generate().unwrap(), "w000-w001-w002");
    assert_eq!(sampler.stats().draws, 3);
}

#[test]
fn test_config_files_round_trip() {
    let dir = TempDir::new().unwrap();

    let generator_path = dir.path().join("nested").join("generator.json");
    let config = GeneratorConfig {
        length: 24,
        min_upper: 3,
        ..Default::default()
    };
    config.save(&generator_path).unwrap();
    assert_eq!(GeneratorConfig::load(&generator_path).unwrap(), config);

    let sequencer_path = dir.path().join("sequencer.json");
    let config = SequencerConfig {
        charset: "ab".to_string(),
        length: 3,
        rollover: true,
    };
    config.save(&sequencer_path).unwrap();
    assert_eq!(SequencerConfig::load(&sequencer_path).unwrap(), config);
}

#[test]
fn test_config_load_errors() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.json");
    assert!(matches!(
        GeneratorConfig::load(&missing),
        Err(KeyspaceError::Io { .. })
    ));

    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        SequencerConfig::load(&broken),
        Err(KeyspaceError::Parse { .. })
    ));
}

#[tokio::test]
async fn test_sequencer_stream_from_location() {
    let sequencer = PasswordSequencer::new(SequencerConfig {
        charset: "01".to_string(),
        length: 4,
        rollover: false,
    })
    .unwrap();
    sequencer.goto(&BigUint::from(14u32)).unwrap();

    let (tx, mut rx) = mpsc::channel(4);
    let (_cancel_tx, cancel) = watch::channel(false);
    let collector = tokio::spawn(async move {
        let mut values = Vec::new();
        while let Some(value) = rx.recv().await {
            values.push(value);
        }
        values
    });

    let summary = sequencer.stream(tx, None, &cancel).await.unwrap();
    let values = collector.await.unwrap();

    assert_eq!(summary.sent, 3);
    assert_eq!(values, vec!["1101", "1110", "1111"]);
    assert!(!sequencer.has_next());
}

#[tokio::test]
async fn test_sequencer_stream_cancelled_midway() {
    let sequencer = PasswordSequencer::new(SequencerConfig {
        charset: NUMBERS.to_string(),
        length: 6,
        rollover: false,
    })
    .unwrap();

    let (tx, mut rx) = mpsc::channel(1);
    let (cancel_tx, cancel) = watch::channel(false);
    let consumer = tokio::spawn(async move {
        let mut received = 0u64;
        while rx.recv().await.is_some() {
            received += 1;
            if received == 5 {
                cancel_tx.send(true).unwrap();
            }
        }
        received
    });

    let summary = sequencer.stream(tx, None, &cancel).await.unwrap();
    let received = consumer.await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.sent, received);
    assert!(summary.sent >= 5 && summary.sent < 1_000_000);
}
