use std::fmt;

use rust_decimal::Decimal;

use super::account::Account;
use super::amount::Amount;
use super::date::Date;
use super::Currency;

/// A scalar value in a metadata map.
///
/// Displayed the way it is written back to the ledger: text values quoted,
/// everything else verbatim.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaValue {
    Text(String),
    Account(Account),
    Date(Date),
    Currency(Currency),
    Tag(String),
    Bool(bool),
    Amount(Amount),
    Number(Decimal),
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Text(s) => write!(f, "\"{}\"", s),
            MetaValue::Account(a) => write!(f, "{}", a),
            MetaValue::Date(d) => write!(f, "{}", d),
            MetaValue::Currency(c) => write!(f, "{}", c),
            MetaValue::Tag(t) => write!(f, "#{}", t),
            MetaValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            MetaValue::Amount(a) => write!(f, "{}", a),
            MetaValue::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Metadata attached to a directive or posting.
///
/// Insertion order is preserved: the keys come back out in the order they
/// appeared in the source, and writing a directive back keeps that order.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Meta {
    entries: Vec<(String, MetaValue)>,
}

impl Meta {
    pub fn new() -> Self {
        Meta::default()
    }

    /// Replaces the value in place when the key already exists, otherwise
    /// appends.
    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, MetaValue)> for Meta {
    fn from_iter<I: IntoIterator<Item = (String, MetaValue)>>(iter: I) -> Self {
        let mut meta = Meta::new();
        for (k, v) in iter {
            meta.insert(k, v);
        }
        meta
    }
}
