//! Keyspace - password generation and exhaustive enumeration
//!
//! A small CLI over the keyspace library: random passwords with class
//! minimums, passphrases from a word list, ordered walks over a whole string
//! space, and space sizes.

use keyspace::{
    error::KeyspaceError,
    types::{GeneratorConfig, PassphraseConfig, SequencerConfig},
    Charset, PassphraseGenerator, PasswordGenerator, PasswordSequencer, Result, UnbiasedSampler,
};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use std::env;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Default number of passwords printed by `sequence`
const DEFAULT_SEQUENCE_COUNT: u32 = 10;

/// Exit status for bad input
const EXIT_USAGE: i32 = 1;

/// Exit status when the system failed (entropy source, files)
const EXIT_ENVIRONMENT: i32 = 2;

#[tokio::main]
async fn main() {
    // Initialize the library
    if let Err(e) = keyspace::init() {
        fail(&e);
    }

    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() || args[0] == "--help" || args[0] == "-h" {
        print_help();
        return;
    }
    if args[0] == "--version" || args[0] == "-V" {
        println!("keyspace {}", keyspace::VERSION);
        return;
    }

    if let Err(e) = run(&args[0], &args[1..]).await {
        fail(&e);
    }
}

fn fail(e: &KeyspaceError) -> ! {
    eprintln!("{}", e.user_message());
    if e.is_environmental() {
        process::exit(EXIT_ENVIRONMENT);
    }
    process::exit(EXIT_USAGE);
}

async fn run(command: &str, rest: &[String]) -> Result<()> {
    let options = Options::parse(rest)?;
    match command {
        "generate" => run_generate(&options),
        "passphrase" => run_passphrase(&options),
        "sequence" => run_sequence(&options).await,
        "space" => run_space(&options),
        other => Err(KeyspaceError::cli(format!("unknown command '{}'", other))),
    }
}

/// Flags shared by all subcommands
#[derive(Debug, Default)]
struct Options {
    charset: Option<String>,
    length: Option<usize>,
    count: Option<BigUint>,
    min_lower: Option<usize>,
    min_upper: Option<usize>,
    symbols: Option<(usize, usize)>,
    config: Option<PathBuf>,
    from: Option<BigUint>,
    start: Option<String>,
    dictionary: Option<PathBuf>,
    words: Option<usize>,
    word_length: Option<(usize, usize)>,
    separator: Option<String>,
    capitalize: Option<bool>,
    with_number: Option<bool>,
    rollover: bool,
    no_ambiguous: bool,
}

impl Options {
    fn parse(args: &[String]) -> Result<Self> {
        let mut options = Self::default();
        let mut iter = args.iter();

        while let Some(flag) = iter.next() {
            match flag.as_str() {
                "--rollover" => options.rollover = true,
                "--no-ambiguous" => options.no_ambiguous = true,
                "--charset" | "-c" => options.charset = Some(value(flag, iter.next())?.to_string()),
                "--length" | "-l" => options.length = Some(number(flag, iter.next())?),
                "--count" | "-n" => options.count = Some(number(flag, iter.next())?),
                "--min-lower" => options.min_lower = Some(number(flag, iter.next())?),
                "--min-upper" => options.min_upper = Some(number(flag, iter.next())?),
                "--symbols" => options.symbols = Some(bounds(flag, value(flag, iter.next())?)?),
                "--config" => options.config = Some(PathBuf::from(value(flag, iter.next())?)),
                "--from" => options.from = Some(number(flag, iter.next())?),
                "--start" => options.start = Some(value(flag, iter.next())?.to_string()),
                "--dictionary" => {
                    options.dictionary = Some(PathBuf::from(value(flag, iter.next())?))
                }
                "--words" | "-w" => options.words = Some(number(flag, iter.next())?),
                "--word-length" => {
                    options.word_length = Some(bounds(flag, value(flag, iter.next())?)?)
                }
                "--separator" => options.separator = Some(value(flag, iter.next())?.to_string()),
                "--capitalize" => options.capitalize = Some(true),
                "--no-capitalize" => options.capitalize = Some(false),
                "--with-number" => options.with_number = Some(true),
                "--no-number" => options.with_number = Some(false),
                other => return Err(KeyspaceError::cli(format!("unknown option '{}'", other))),
            }
        }

        Ok(options)
    }

    /// Resolve `--charset`, honoring `--no-ambiguous`
    fn charset_override(&self, base: &str) -> Result<String> {
        let raw = self.charset.as_deref().unwrap_or(base);
        let charset = Charset::without_duplicates(raw)?;
        let charset = if self.no_ambiguous {
            charset.without_ambiguity()?
        } else {
            charset
        };
        Ok(charset.to_string())
    }
}

fn value<'a>(flag: &str, next: Option<&'a String>) -> Result<&'a str> {
    next.map(String::as_str)
        .ok_or_else(|| KeyspaceError::cli(format!("{} needs a value", flag)))
}

fn number<T: std::str::FromStr>(flag: &str, next: Option<&String>) -> Result<T> {
    let raw = value(flag, next)?;
    raw.parse().map_err(|_| {
        KeyspaceError::cli(format!("{} expects a non-negative number, got '{}'", flag, raw))
    })
}

/// Parse `MIN:MAX` or a single `N` meaning exactly N
fn bounds(flag: &str, raw: &str) -> Result<(usize, usize)> {
    let parse = |s: &str| {
        s.trim()
            .parse::<usize>()
            .map_err(|_| KeyspaceError::cli(format!("{} expects MIN:MAX, got '{}'", flag, raw)))
    };
    match raw.split_once(':') {
        Some((min, max)) => Ok((parse(min)?, parse(max)?)),
        None => {
            let n = parse(raw)?;
            Ok((n, n))
        }
    }
}

/// Print random passwords, one per line
fn run_generate(options: &Options) -> Result<()> {
    let mut config = match &options.config {
        Some(path) => GeneratorConfig::load(path)?,
        None => GeneratorConfig::from_env()?,
    };

    config.charset = options.charset_override(&config.charset)?;
    if let Some(length) = options.length {
        config.length = length;
    }
    if let Some(min) = options.min_lower {
        config.min_lower = min;
    }
    if let Some(min) = options.min_upper {
        config.min_upper = min;
    }
    if let Some((min, max)) = options.symbols {
        config = config.with_symbols(min, max);
    }

    let count = match &options.count {
        Some(count) => count
            .to_usize()
            .ok_or_else(|| KeyspaceError::cli(format!("--count {} is too large", count)))?,
        None => 1,
    };

    let generator = PasswordGenerator::new(config, Arc::new(UnbiasedSampler::new()))?;
    for password in generator.generate_many(count)? {
        println!("{}", password);
    }
    Ok(())
}

/// Print random passphrases, one per line
fn run_passphrase(options: &Options) -> Result<()> {
    let path = options
        .dictionary
        .as_deref()
        .ok_or_else(|| KeyspaceError::cli("passphrase needs --dictionary <FILE>"))?;
    let words = read_dictionary(path)?;

    let mut config = match &options.config {
        Some(path) => PassphraseConfig::load(path)?,
        None => PassphraseConfig::from_env()?,
    };
    if let Some(words) = options.words {
        config.num_words = words;
    }
    if let Some((min, max)) = options.word_length {
        config.word_len_min = min;
        config.word_len_max = max;
    }
    if let Some(separator) = &options.separator {
        config.separator = separator.clone();
    }
    if let Some(capitalize) = options.capitalize {
        config.capitalize = capitalize;
    }
    if let Some(with_number) = options.with_number {
        config.with_number = with_number;
    }

    let count = match &options.count {
        Some(count) => count
            .to_usize()
            .ok_or_else(|| KeyspaceError::cli(format!("--count {} is too large", count)))?,
        None => 1,
    };

    let generator = PassphraseGenerator::new(config, words, Arc::new(UnbiasedSampler::new()))?;
    for phrase in generator.generate_many(count)? {
        println!("{}", phrase);
    }
    Ok(())
}

/// One word per line; blank lines are skipped
fn read_dictionary(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        KeyspaceError::io(e.to_string(), Some(path.to_string_lossy().to_string()))
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Stream passwords in order until the count is reached, the space is
/// exhausted, or Ctrl-C is pressed
async fn run_sequence(options: &Options) -> Result<()> {
    let mut config = match &options.config {
        Some(path) => SequencerConfig::load(path)?,
        None => SequencerConfig::from_env()?,
    };

    config.charset = options.charset_override(&config.charset)?;
    if let Some(length) = options.length {
        config.length = length;
    }
    if options.rollover {
        config.rollover = true;
    }

    let sequencer = PasswordSequencer::new(config)?;
    if let Some(value) = &options.start {
        sequencer.goto_value(value)?;
    }
    if let Some(location) = &options.from {
        sequencer.goto(location)?;
    }

    let count = options
        .count
        .clone()
        .unwrap_or_else(|| BigUint::from(DEFAULT_SEQUENCE_COUNT));

    let (tx, mut rx) = mpsc::channel::<String>(256);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let printer = tokio::spawn(async move {
        while let Some(password) = rx.recv().await {
            println!("{}", password);
        }
    });
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let summary = sequencer.stream(tx, Some(&count), &cancel_rx).await?;
    interrupt.abort();
    printer
        .await
        .map_err(|e| KeyspaceError::cli(format!("output task failed: {}", e)))?;

    if summary.cancelled {
        eprintln!("⚠️  Interrupted at location {}", sequencer.location());
    }
    Ok(())
}

/// Print the number of strings in a space
fn run_space(options: &Options) -> Result<()> {
    let charset = Charset::new(&options.charset_override(keyspace::space::ALPHANUMERIC)?)?;
    let length = options.length.unwrap_or(SequencerConfig::default().length);
    if length == 0 {
        return Err(KeyspaceError::ZeroLength);
    }

    println!("{}", charset.max_combinations(length));
    Ok(())
}

/// Print help information
fn print_help() {
    println!("🔑 Keyspace - password generation and exhaustive enumeration");
    println!("═════════════════════════════════════════════════════════════");
    println!();
    println!("USAGE:");
    println!("    keyspace generate [OPTIONS]    Print random passwords");
    println!("    keyspace passphrase [OPTIONS]  Print random passphrases");
    println!("    keyspace sequence [OPTIONS]    Print passwords in order");
    println!("    keyspace space [OPTIONS]       Print the number of possible strings");
    println!();
    println!("OPTIONS:");
    println!("    -c, --charset <CHARS>     Symbols to use (default: letters and digits)");
    println!("    -l, --length <N>          String length");
    println!("    -n, --count <N>           How many values to print");
    println!("        --no-ambiguous        Drop look-alike characters (O 0 l I)");
    println!("        --config <FILE>       Load a JSON configuration file");
    println!();
    println!("GENERATE OPTIONS:");
    println!("        --min-lower <N>       Minimum lower-case characters");
    println!("        --min-upper <N>       Minimum upper-case characters");
    println!("        --symbols <MIN:MAX>   Symbol count bounds");
    println!();
    println!("PASSPHRASE OPTIONS:");
    println!("        --dictionary <FILE>   Word list, one word per line (required)");
    println!("    -w, --words <N>           Number of words (default: 3)");
    println!("        --word-length <MIN:MAX>  Allowed word lengths (default: 4:7)");
    println!("        --separator <S>       Text between words (default: -)");
    println!("        --[no-]capitalize     Capitalize each word (default: on)");
    println!("        --with-number, --no-number  Append a digit to one word (default: on)");
    println!();
    println!("SEQUENCE OPTIONS:");
    println!("        --from <LOCATION>     Start at a 1-indexed location");
    println!("        --start <VALUE>       Start at a given string");
    println!("        --rollover            Wrap around at the end of the space");
    println!();
    println!("ENVIRONMENT VARIABLES:");
    println!("    KEYSPACE_CHARSET      Default charset");
    println!("    KEYSPACE_LENGTH       Default length");
    println!("    KEYSPACE_MIN_LOWER    Minimum lower-case characters");
    println!("    KEYSPACE_MIN_UPPER    Minimum upper-case characters");
    println!("    KEYSPACE_MIN_SYMBOLS  Minimum symbols");
    println!("    KEYSPACE_MAX_SYMBOLS  Maximum symbols");
    println!("    KEYSPACE_ROLLOVER     Wrap sequences around (true/false)");
    println!("    KEYSPACE_NUM_WORDS    Words per passphrase");
    println!("    KEYSPACE_SEPARATOR    Passphrase word separator");
    println!();
    println!("EXIT STATUS:");
    println!("    1  invalid input or unsatisfiable rules");
    println!("    2  entropy source or file failure");
    println!();
    println!("EXAMPLES:");
    println!("    keyspace generate --length 16 --min-upper 2 --symbols 1:3");
    println!("    keyspace passphrase --dictionary words.txt --words 4 --count 5");
    println!("    keyspace sequence --charset abc --length 3 --count 0");
    println!("    keyspace space --charset 0123456789abcdef --length 64");
}
