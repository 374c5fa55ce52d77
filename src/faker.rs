//! Seedable fake-data generator handed to field providers.
//!
//! `Faker` drives the `fake` generators with its own `StdRng`, so a test run can
//! be reproduced by fixing the seed through `ConfigOptions::seed`. The locale is
//! selected once at construction time.

use chrono::{DateTime, Duration, Utc};
use fake::{
    faker::{
        company::raw::{BsNoun, Buzzword},
        internet::raw::SafeEmail,
        lorem::raw::{Sentence, Word, Words},
        name::raw::{FirstName, LastName, Name},
    },
    locales::{EN, FR_FR},
    Fake,
};
use rand::{distr::Alphanumeric, rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

use crate::error::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Locale {
    En,
    Fr,
}

impl Locale {
    fn name(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Fr => "fr",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        [Self::En, Self::Fr]
            .into_iter()
            .find(|locale| locale.name().eq_ignore_ascii_case(name.trim()))
    }
}

/// Runs a `fake` generator in the active locale with the seeded rng.
macro_rules! localized {
    ($faker:ident, $generator:ident $(, $arg:expr)*) => {
        match $faker.locale {
            Locale::En => $generator(EN $(, $arg)*).fake_with_rng(&mut $faker.rng),
            Locale::Fr => $generator(FR_FR $(, $arg)*).fake_with_rng(&mut $faker.rng),
        }
    };
}

/// Fake-data generator.
///
/// # Example
///
/// ```rust,ignore
/// let mut faker = Faker::new("en", Some(42))?;
/// let email = faker.email();
/// ```
pub struct Faker {
    rng: StdRng,
    locale: Locale,
    next_id: u64,
}

impl Faker {
    /// Creates a generator for the given locale.
    ///
    /// # Arguments
    /// - `locale` - Locale name (`en` or `fr`)
    /// - `seed` - Fixed seed for reproducible runs, `None` seeds from the OS
    ///
    /// # Returns
    /// - `Ok(Faker)` - Ready generator
    /// - `Err(ConfigError::UnsupportedLocale)` - `locale` is not supported
    pub fn new(locale: &str, seed: Option<u64>) -> Result<Self, ConfigError> {
        let locale = Locale::parse(locale)
            .ok_or_else(|| ConfigError::UnsupportedLocale(locale.to_string()))?;

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            rng,
            locale,
            next_id: 1,
        })
    }

    /// Name of the active locale.
    pub fn locale(&self) -> &'static str {
        self.locale.name()
    }

    /// Next value of this generator's identifier sequence, starting at 1.
    ///
    /// Stubbed rows never round-trip through the record store, so providers that
    /// need a primary key for `make` calls take it from here. The sequence belongs
    /// to the generator and therefore to one configuration: two configurations
    /// hand out the same identifiers, and a seeded configuration hands them out
    /// in the same order on every run.
    pub fn unique_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Random integer in `0..=max`.
    pub fn number(&mut self, max: i64) -> i64 {
        self.number_between(0, max)
    }

    /// Random integer in `min..=max`.
    pub fn number_between(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        (min..=max).fake_with_rng(&mut self.rng)
    }

    /// Random float in `0.0..1.0`.
    pub fn float(&mut self) -> f64 {
        self.rng.random()
    }

    pub fn boolean(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// Random alphanumeric string of `len` characters.
    pub fn alphanumeric(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    /// Picks one element of `items`, `None` when `items` is empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    pub fn first_name(&mut self) -> String {
        localized!(self, FirstName)
    }

    pub fn last_name(&mut self) -> String {
        localized!(self, LastName)
    }

    pub fn full_name(&mut self) -> String {
        localized!(self, Name)
    }

    pub fn word(&mut self) -> String {
        localized!(self, Word)
    }

    /// `count` words separated by spaces.
    pub fn words(&mut self, count: usize) -> String {
        let words: Vec<String> = localized!(self, Words, count..count + 1);
        words.join(" ")
    }

    /// Capitalised sentence of four to eight words ending with a period.
    pub fn sentence(&mut self) -> String {
        localized!(self, Sentence, 4..9)
    }

    pub fn product_name(&mut self) -> String {
        let adjective: String = localized!(self, Buzzword);
        let noun: String = localized!(self, BsNoun);

        let mut chars = adjective.chars();
        match chars.next() {
            Some(first) => format!("{}{} {}", first.to_uppercase(), chars.as_str(), noun),
            None => noun,
        }
    }

    pub fn email(&mut self) -> String {
        localized!(self, SafeEmail)
    }

    /// Timestamp within the last `days` days.
    pub fn recent(&mut self, days: i64) -> DateTime<Utc> {
        let seconds = self.number(days.max(0) * 24 * 60 * 60);
        Utc::now() - Duration::seconds(seconds)
    }
}

impl std::fmt::Debug for Faker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Faker")
            .field("locale", &self.locale.name())
            .field("next_id", &self.next_id)
            .finish()
    }
}
