//! Fake data generation helpers.
//!
//! `FakeData` owns the single seeded RNG of a generation run. Every stage
//! borrows it mutably, so the draw order (and therefore the output) is fully
//! determined by the seed.

use crate::config::DateRange;
use ahash::AHashSet;
use chrono::{Days, NaiveDate};
use fake::faker::address::en::{
    BuildingNumber, CityName, CountryName, StateName, StreetName, ZipCode,
};
use fake::faker::company::en::{Bs, CompanyName, CompanySuffix};
use fake::faker::lorem::en::Word;
use fake::faker::name::en::{LastName, Name};
use fake::Fake;
use rand::Rng;

/// Country spellings, deliberately mixing full names and codes
const COUNTRIES: &[&str] = &[
    "United States",
    "USA",
    "Germany",
    "DE",
    "India",
    "IND",
    "Canada",
    "CA",
    "US",
];

/// Product adjectives
const PRODUCT_ADJECTIVES: &[&str] = &[
    "Premium", "Pro", "Ultra", "Super", "Mega", "Mini", "Lite", "Plus", "Max", "Elite", "Advanced",
    "Basic", "Standard", "Classic", "Modern", "Smart", "Quick", "Easy", "Fast",
];

/// Product nouns
const PRODUCT_NOUNS: &[&str] = &[
    "Widget",
    "Gadget",
    "Device",
    "Tool",
    "Kit",
    "Pack",
    "Set",
    "Bundle",
    "System",
    "Module",
    "Component",
    "Unit",
    "Platform",
    "Service",
    "Package",
];

/// Product "catch phrase" endings
const PRODUCT_TAGLINES: &[&str] = &[
    "for teams",
    "with analytics",
    "for the enterprise",
    "reimagined",
    "at scale",
    "in the cloud",
];

const COLORS: &[&str] = &[
    "Red", "Blue", "Green", "Black", "White", "Silver", "Teal", "Orange", "Purple", "Gray",
    "Navy", "Maroon", "Olive", "Gold",
];

const PRODUCT_CATEGORIES: &[&str] = &[
    "Hardware",
    "Software",
    "Subscription",
    "Service",
    "Consumables",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "acme.io", "saasapp.com"];

/// Digit width used for business identifiers such as `CUST01234`
pub const ID_DIGITS: usize = 5;

/// Fake data generator with deterministic RNG
pub struct FakeData<R: Rng> {
    rng: R,
}

impl<R: Rng> FakeData<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Direct access to the underlying RNG
    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Generate a boolean with given probability of true
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }

    /// Replace `value` by `None` with the given probability
    pub fn maybe_null<T>(&mut self, value: T, probability: f64) -> Option<T> {
        if self.chance(probability) {
            None
        } else {
            Some(value)
        }
    }

    /// Pick a random element from a non-empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.random_range(0..items.len())]
    }

    /// Pick from `items` or the extra `None` slot, each with equal weight
    pub fn pick_or_none<T: Clone>(&mut self, items: &[T]) -> Option<T> {
        let idx = self.rng.random_range(0..=items.len());
        items.get(idx).cloned()
    }

    /// Generate a random integer in range (inclusive)
    pub fn int_range(&mut self, min: i64, max: i64) -> i64 {
        self.rng.random_range(min..=max)
    }

    /// Generate a price rounded to cents
    pub fn price(&mut self, min: f64, max: f64) -> f64 {
        let value = self.rng.random_range(min..max);
        (value * 100.0).round() / 100.0
    }

    /// Prefix followed by `width` random digits, e.g. `CUST04821`
    pub fn code(&mut self, prefix: &str, width: usize) -> String {
        let mut code = String::with_capacity(prefix.len() + width);
        code.push_str(prefix);
        for _ in 0..width {
            code.push(char::from(b'0' + self.rng.random_range(0..10u8)));
        }
        code
    }

    /// `count` distinct codes with the given prefix.
    ///
    /// The digit width starts at [`ID_DIGITS`] and widens until the code space
    /// holds at least twice `count`, so rejection sampling stays cheap.
    pub fn unique_codes(&mut self, prefix: &str, count: usize) -> Vec<String> {
        let width = id_width(count);
        let mut seen = AHashSet::with_capacity(count);
        let mut codes = Vec::with_capacity(count);
        while codes.len() < count {
            let code = self.code(prefix, width);
            if seen.insert(code.clone()) {
                codes.push(code);
            }
        }
        codes
    }

    /// Uniform date in the inclusive range
    pub fn date_between(&mut self, range: &DateRange) -> NaiveDate {
        let span = range.span_days().max(0) as u64;
        let offset = self.rng.random_range(0..=span);
        range
            .start
            .checked_add_days(Days::new(offset))
            .unwrap_or(range.end)
    }

    /// Country from the mixed-spelling list, or a random country name
    pub fn country(&mut self) -> String {
        let idx = self.rng.random_range(0..=COUNTRIES.len());
        match COUNTRIES.get(idx) {
            Some(country) => country.to_string(),
            None => CountryName().fake_with_rng(&mut self.rng),
        }
    }

    /// Customer name in one of three shapes: company, `<suffix> <last name>`, business phrase
    pub fn customer_name(&mut self) -> String {
        match self.rng.random_range(0..3) {
            0 => CompanyName().fake_with_rng(&mut self.rng),
            1 => {
                let suffix: String = CompanySuffix().fake_with_rng(&mut self.rng);
                let last: String = LastName().fake_with_rng(&mut self.rng);
                format!("{} {}", suffix, last)
            }
            _ => {
                let phrase: String = Bs().fake_with_rng(&mut self.rng);
                title_case(&phrase)
            }
        }
    }

    pub fn street_address(&mut self) -> String {
        let number: String = BuildingNumber().fake_with_rng(&mut self.rng);
        let street: String = StreetName().fake_with_rng(&mut self.rng);
        format!("{} {}", number, street)
    }

    pub fn city(&mut self) -> String {
        CityName().fake_with_rng(&mut self.rng)
    }

    pub fn state(&mut self) -> String {
        StateName().fake_with_rng(&mut self.rng)
    }

    pub fn postal_code(&mut self) -> String {
        ZipCode().fake_with_rng(&mut self.rng)
    }

    /// Generate a full person name
    pub fn person_name(&mut self) -> String {
        Name().fake_with_rng(&mut self.rng)
    }

    /// Email derived from a person name: `jane.doe42@acme.io`
    pub fn email(&mut self, name: &str) -> String {
        let local = name.replace(' ', ".").replace('\'', "").to_lowercase();
        let num: u32 = self.rng.random_range(1..=999);
        let domain = self.pick(EMAIL_DOMAINS);
        format!("{}{}@{}", local, num, domain)
    }

    /// Product name in one of three shapes: word, catch phrase, `<color> <Word>`
    pub fn product_name(&mut self) -> String {
        match self.rng.random_range(0..3) {
            0 => self.title_word(),
            1 => {
                let adj = self.pick(PRODUCT_ADJECTIVES);
                let noun = self.pick(PRODUCT_NOUNS);
                let tagline = self.pick(PRODUCT_TAGLINES);
                format!("{} {} {}", adj, noun, tagline)
            }
            _ => {
                let color = self.pick(COLORS);
                format!("{} {}", color, self.title_word())
            }
        }
    }

    /// Generate a product category name
    pub fn product_category(&mut self) -> &'static str {
        *self.pick(PRODUCT_CATEGORIES)
    }

    fn title_word(&mut self) -> String {
        let word: String = Word().fake_with_rng(&mut self.rng);
        title_case(&word)
    }
}

/// Digit width that leaves room for `count` distinct codes
pub fn id_width(count: usize) -> usize {
    let mut width = ID_DIGITS;
    while 10usize.saturating_pow(width as u32) < count.saturating_mul(2) {
        width += 1;
    }
    width
}

/// Capitalize the first letter of every whitespace-separated word
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
