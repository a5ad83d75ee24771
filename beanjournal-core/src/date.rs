use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

/// A calendar date as it appears at the head of a directive, displayed as
/// `YYYY-MM-DD`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Date(NaiveDate);

impl Date {
    pub fn today() -> Self {
        Date(chrono::Local::now().date_naive())
    }

    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for Date {
    fn from(d: NaiveDate) -> Self {
        Date(d)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Accepts both `-` and `/` separated dates, which the grammar also allows.
impl FromStr for Date {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(&s.replace('/', "-"), "%Y-%m-%d").map(Date)
    }
}
