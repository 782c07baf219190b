//! Mixed-radix odometer over a charset
//!
//! The digits are the authoritative state. The 1-indexed location and the
//! rendered string are caches derived from them and reconciled on demand.
//! When the whole space fits in a `u64` the location is kept as a machine
//! word; otherwise it is a `BigUint`.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, ToPrimitive, Zero};
use parking_lot::Mutex;

use super::Charset;
use crate::error::{KeyspaceError, Result};

/// Cached location, in whichever representation the space size allows
#[derive(Debug, Clone)]
enum Position {
    Word(u64),
    Big(BigUint),
}

impl Position {
    fn to_biguint(&self) -> BigUint {
        match self {
            Position::Word(loc) => BigUint::from(*loc),
            Position::Big(loc) => loc.clone(),
        }
    }
}

#[derive(Debug)]
struct Gears {
    digits: Vec<usize>,
    location: Position,
    location_dirty: bool,
    rendered: String,
    render_dirty: bool,
}

/// Positional counter over every string of `length` symbols from a charset
///
/// All operations take `&self` and serialize on an internal lock, so one
/// odometer can be shared between threads.
#[derive(Debug)]
pub struct Odometer {
    charset: Charset,
    length: usize,
    rollover: bool,
    base: usize,
    base_big: BigUint,
    max_location: BigUint,
    /// `Some(max)` when the space fits in a `u64`
    max_word: Option<u64>,
    gears: Mutex<Gears>,
}

impl Odometer {
    /// Create an odometer positioned at the first value
    pub fn new(charset: Charset, length: usize, rollover: bool) -> Result<Self> {
        if charset.is_empty() {
            return Err(KeyspaceError::EmptyCharset);
        }
        if length == 0 {
            return Err(KeyspaceError::ZeroLength);
        }

        let base = charset.len();
        let max_location = charset.max_combinations(length);
        let max_word = max_location.to_u64();
        let location = match max_word {
            Some(_) => Position::Word(1),
            None => Position::Big(BigUint::one()),
        };

        tracing::debug!(
            base = base,
            length = length,
            rollover = rollover,
            fast_path = max_word.is_some(),
            "Odometer created"
        );

        Ok(Self {
            base,
            base_big: BigUint::from(base),
            charset,
            length,
            rollover,
            max_location,
            max_word,
            gears: Mutex::new(Gears {
                digits: vec![0; length],
                location,
                location_dirty: false,
                rendered: String::new(),
                render_dirty: true,
            }),
        })
    }

    pub fn charset(&self) -> &Charset {
        &self.charset
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn rollover(&self) -> bool {
        self.rollover
    }

    /// Number of strings in the space, `base^length`
    pub fn max_location(&self) -> &BigUint {
        &self.max_location
    }

    /// Whether locations are tracked as machine words
    pub fn is_fast_path(&self) -> bool {
        self.max_word.is_some()
    }

    /// Move to the first value (all digits zero)
    pub fn first(&self) {
        let mut gears = self.gears.lock();
        self.set_first(&mut gears);
    }

    /// Move to the last value (all digits `base - 1`)
    pub fn last(&self) {
        let mut gears = self.gears.lock();
        self.set_last(&mut gears);
    }

    /// True iff every digit is `base - 1`
    pub fn at_end(&self) -> bool {
        let gears = self.gears.lock();
        self.is_last(&gears.digits)
    }

    /// True iff every digit is zero
    pub fn is_first(&self) -> bool {
        let gears = self.gears.lock();
        Self::is_zero(&gears.digits)
    }

    /// Advance by one. Returns false if already at the end without rollover.
    pub fn increment(&self) -> bool {
        let mut gears = self.gears.lock();

        if self.is_last(&gears.digits) {
            if self.rollover {
                self.set_first(&mut gears);
                return true;
            }
            return false;
        }

        let top = self.base - 1;
        for digit in gears.digits.iter_mut().rev() {
            if *digit < top {
                *digit += 1;
                break;
            }
            *digit = 0;
        }

        if !gears.location_dirty {
            match &mut gears.location {
                Position::Word(loc) => *loc += 1,
                Position::Big(loc) => *loc += 1u32,
            }
        }
        gears.render_dirty = true;
        true
    }

    /// Step back by one. Returns false if already at the start without rollover.
    pub fn decrement(&self) -> bool {
        let mut gears = self.gears.lock();

        if Self::is_zero(&gears.digits) {
            if self.rollover {
                self.set_last(&mut gears);
                return true;
            }
            return false;
        }

        let top = self.base - 1;
        for digit in gears.digits.iter_mut().rev() {
            if *digit > 0 {
                *digit -= 1;
                break;
            }
            *digit = top;
        }

        if !gears.location_dirty {
            match &mut gears.location {
                Position::Word(loc) => *loc -= 1,
                Position::Big(loc) => *loc -= 1u32,
            }
        }
        gears.render_dirty = true;
        true
    }

    /// Advance by `n` positions
    ///
    /// Without rollover, overshooting the end clamps to the last value and
    /// returns false. With rollover the location wraps modulo the space size.
    pub fn increment_n(&self, n: &BigUint) -> bool {
        let mut gears = self.gears.lock();
        self.reconcile_location(&mut gears);

        let target = match (gears.location.clone(), self.max_word) {
            (Position::Word(loc), Some(max)) => {
                let next = n.to_u64().and_then(|n| loc.checked_add(n)).filter(|l| *l <= max);
                match next {
                    Some(next) => Position::Word(next),
                    None if !self.rollover => {
                        self.set_last(&mut gears);
                        return false;
                    }
                    None => {
                        let step = reduce_to_word(n, max) as u128;
                        let zero_based = (loc - 1) as u128;
                        Position::Word(((zero_based + step) % max as u128) as u64 + 1)
                    }
                }
            }
            (current, _) => {
                let next = current.to_biguint() + n;
                if next <= self.max_location {
                    Position::Big(next)
                } else if !self.rollover {
                    self.set_last(&mut gears);
                    return false;
                } else {
                    Position::Big(((next - 1u32) % &self.max_location) + 1u32)
                }
            }
        };

        self.apply_location(&mut gears, target);
        true
    }

    /// Step back by `n` positions
    ///
    /// Without rollover, overshooting the start clamps to the first value and
    /// returns false. With rollover the location wraps modulo the space size.
    pub fn decrement_n(&self, n: &BigUint) -> bool {
        let mut gears = self.gears.lock();
        self.reconcile_location(&mut gears);

        let target = match (gears.location.clone(), self.max_word) {
            (Position::Word(loc), Some(max)) => {
                let next = n.to_u64().filter(|n| *n < loc).map(|n| loc - n);
                match next {
                    Some(next) => Position::Word(next),
                    None if !self.rollover => {
                        self.set_first(&mut gears);
                        return false;
                    }
                    None => {
                        let step = reduce_to_word(n, max) as u128;
                        let zero_based = (loc - 1) as u128;
                        let max = max as u128;
                        Position::Word(((zero_based + max - step) % max) as u64 + 1)
                    }
                }
            }
            (current, _) => {
                let current = current.to_biguint();
                if n < &current {
                    Position::Big(current - n)
                } else if !self.rollover {
                    self.set_first(&mut gears);
                    return false;
                } else {
                    let step = n % &self.max_location;
                    let zero_based = current - 1u32;
                    let wrapped = if step <= zero_based {
                        zero_based - step
                    } else {
                        zero_based + &self.max_location - step
                    };
                    Position::Big(wrapped + 1u32)
                }
            }
        };

        self.apply_location(&mut gears, target);
        true
    }

    /// Jump to an absolute 1-indexed location and return the value there
    pub fn goto_location(&self, n: &BigUint) -> Result<String> {
        if n.is_zero() || n > &self.max_location {
            return Err(KeyspaceError::invalid_location(n, &self.max_location));
        }

        let mut gears = self.gears.lock();
        let target = match n.to_u64() {
            Some(loc) if self.max_word.is_some() => Position::Word(loc),
            _ => Position::Big(n.clone()),
        };
        self.apply_location(&mut gears, target);
        Ok(self.render_locked(&mut gears))
    }

    /// Position the odometer on a rendered value
    ///
    /// The location is not computed here; it is reconciled from the digits
    /// the next time it is needed.
    pub fn seek(&self, value: &str) -> Result<()> {
        let mut digits = Vec::with_capacity(self.length);
        for symbol in value.chars() {
            let digit = self
                .charset
                .symbols()
                .iter()
                .position(|c| *c == symbol)
                .ok_or_else(|| {
                    KeyspaceError::invalid_value(
                        value,
                        format!("'{}' is not in the charset", symbol),
                    )
                })?;
            digits.push(digit);
        }
        if digits.len() != self.length {
            return Err(KeyspaceError::invalid_value(
                value,
                format!("expected {} symbols, found {}", self.length, digits.len()),
            ));
        }

        let mut gears = self.gears.lock();
        gears.digits = digits;
        gears.location_dirty = true;
        gears.rendered = value.to_string();
        gears.render_dirty = false;
        Ok(())
    }

    /// Current 1-indexed rank in lexicographic order
    pub fn location(&self) -> BigUint {
        let mut gears = self.gears.lock();
        self.reconcile_location(&mut gears);
        gears.location.to_biguint()
    }

    /// Current value as a string over the charset
    pub fn render(&self) -> String {
        let mut gears = self.gears.lock();
        self.render_locked(&mut gears)
    }

    /// Snapshot of the digit indices, most significant first
    pub fn digits(&self) -> Vec<usize> {
        self.gears.lock().digits.clone()
    }

    fn render_locked(&self, gears: &mut Gears) -> String {
        if gears.render_dirty {
            let symbols = self.charset.symbols();
            gears.rendered = gears.digits.iter().map(|&d| symbols[d]).collect();
            gears.render_dirty = false;
        }
        gears.rendered.clone()
    }

    fn set_first(&self, gears: &mut Gears) {
        gears.digits.iter_mut().for_each(|d| *d = 0);
        gears.location = match self.max_word {
            Some(_) => Position::Word(1),
            None => Position::Big(BigUint::one()),
        };
        gears.location_dirty = false;
        gears.render_dirty = true;
    }

    fn set_last(&self, gears: &mut Gears) {
        let top = self.base - 1;
        gears.digits.iter_mut().for_each(|d| *d = top);
        gears.location = match self.max_word {
            Some(max) => Position::Word(max),
            None => Position::Big(self.max_location.clone()),
        };
        gears.location_dirty = false;
        gears.render_dirty = true;
    }

    fn is_last(&self, digits: &[usize]) -> bool {
        let top = self.base - 1;
        digits.iter().all(|&d| d == top)
    }

    fn is_zero(digits: &[usize]) -> bool {
        digits.iter().all(|&d| d == 0)
    }

    /// Store a new location and rebuild the digits from it
    fn apply_location(&self, gears: &mut Gears, location: Position) {
        match &location {
            Position::Word(loc) => self.digits_from_word(&mut gears.digits, loc - 1),
            Position::Big(loc) => self.digits_from_big(&mut gears.digits, loc - BigUint::one()),
        }
        gears.location = location;
        gears.location_dirty = false;
        gears.render_dirty = true;
    }

    fn digits_from_word(&self, digits: &mut [usize], mut value: u64) {
        let base = self.base as u64;
        for digit in digits.iter_mut().rev() {
            if value == 0 {
                *digit = 0;
                continue;
            }
            *digit = (value % base) as usize;
            value /= base;
        }
    }

    fn digits_from_big(&self, digits: &mut [usize], mut value: BigUint) {
        for digit in digits.iter_mut().rev() {
            if value.is_zero() {
                *digit = 0;
                continue;
            }
            let (quotient, remainder) = value.div_rem(&self.base_big);
            // remainder < base, which is a usize
            *digit = remainder.to_usize().unwrap_or_default();
            value = quotient;
        }
    }

    /// Recompute the location from the digits if they moved without it
    fn reconcile_location(&self, gears: &mut Gears) {
        if !gears.location_dirty {
            return;
        }

        gears.location = match self.max_word {
            Some(_) => {
                let base = self.base as u64;
                let rank = gears
                    .digits
                    .iter()
                    .fold(0u64, |acc, &d| acc * base + d as u64);
                Position::Word(rank + 1)
            }
            None => {
                let mut rank = BigUint::zero();
                for &d in &gears.digits {
                    rank *= &self.base_big;
                    rank += d;
                }
                Position::Big(rank + 1u32)
            }
        };
        gears.location_dirty = false;
    }
}

/// `n mod max` as a machine word
fn reduce_to_word(n: &BigUint, max: u64) -> u64 {
    match n.to_u64() {
        Some(n) => n % max,
        // remainder < max, which is a u64
        None => (n % BigUint::from(max)).to_u64().unwrap_or_default(),
    }
}
