use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use typed_builder::TypedBuilder;

use super::account::Account;
use super::amount::Amount;
use super::date::Date;
use super::flags::Flag;
use super::metadata::Meta;
use super::posting::Posting;
use super::Currency;

/// Where a parsed directive came from: originating file and 1-based header
/// line. Directives that exist only as pending edit payloads carry no source.
#[derive(Clone, Debug, Eq, PartialEq, TypedBuilder)]
pub struct Source {
    pub file: PathBuf,
    pub line: usize,
}

/// The kind tag of a directive, used for filtering and routing.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum DirectiveKind {
    Transaction,
    Balance,
    Note,
    Pad,
    Commodity,
    Open,
    Close,
}

impl DirectiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveKind::Transaction => "transaction",
            DirectiveKind::Balance => "balance",
            DirectiveKind::Note => "note",
            DirectiveKind::Pad => "pad",
            DirectiveKind::Commodity => "commodity",
            DirectiveKind::Open => "open",
            DirectiveKind::Close => "close",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectiveKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(DirectiveKind::Transaction),
            "balance" => Ok(DirectiveKind::Balance),
            "note" => Ok(DirectiveKind::Note),
            "pad" => Ok(DirectiveKind::Pad),
            "commodity" => Ok(DirectiveKind::Commodity),
            "open" => Ok(DirectiveKind::Open),
            "close" => Ok(DirectiveKind::Close),
            _ => Err(()),
        }
    }
}

/// Booking method named on an open directive.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Booking {
    Strict,
    None,
    Average,
    Fifo,
    Lifo,
}

impl Booking {
    pub fn as_str(self) -> &'static str {
        match self {
            Booking::Strict => "STRICT",
            Booking::None => "NONE",
            Booking::Average => "AVERAGE",
            Booking::Fifo => "FIFO",
            Booking::Lifo => "LIFO",
        }
    }
}

impl FromStr for Booking {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STRICT" => Ok(Booking::Strict),
            "NONE" => Ok(Booking::None),
            "AVERAGE" => Ok(Booking::Average),
            "FIFO" => Ok(Booking::Fifo),
            "LIFO" => Ok(Booking::Lifo),
            _ => Err(()),
        }
    }
}

/// A dated transaction with its postings.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Transaction {
    pub date: Date,

    #[builder(default)]
    pub flag: Flag,

    #[builder(default)]
    pub payee: Option<String>,

    #[builder(default)]
    pub narration: String,

    #[builder(default)]
    pub tags: BTreeSet<String>,

    #[builder(default)]
    pub links: BTreeSet<String>,

    #[builder(default)]
    pub postings: Vec<Posting>,

    #[builder(default)]
    pub meta: Meta,

    #[builder(default)]
    pub source: Option<Source>,
}

/// An assertion that an account holds a given amount on a given date.
///
/// `diff_amount` is only populated when an assertion-checking pass found the
/// assertion to fail; the parser itself never sets it.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Balance {
    pub date: Date,
    pub account: Account,
    pub amount: Amount,

    #[builder(default)]
    pub tolerance: Option<Decimal>,

    #[builder(default)]
    pub diff_amount: Option<Amount>,

    #[builder(default)]
    pub meta: Meta,

    #[builder(default)]
    pub source: Option<Source>,
}

/// A dated comment attached to an account.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Note {
    pub date: Date,
    pub account: Account,
    pub comment: String,

    #[builder(default)]
    pub meta: Meta,

    #[builder(default)]
    pub source: Option<Source>,
}

/// Direction to insert whatever amount is needed to make the next balance
/// assertion on `account` pass, sourced from `source_account`.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Pad {
    pub date: Date,
    pub account: Account,
    pub source_account: Account,

    #[builder(default)]
    pub meta: Meta,

    #[builder(default)]
    pub source: Option<Source>,
}

/// A commodity declaration, mostly a hook for display metadata such as a
/// logo or price source.
#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Commodity {
    pub date: Date,
    pub name: Currency,

    #[builder(default)]
    pub meta: Meta,

    #[builder(default)]
    pub source: Option<Source>,
}

#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Open {
    pub date: Date,
    pub account: Account,

    #[builder(default)]
    pub currencies: Vec<Currency>,

    #[builder(default)]
    pub booking: Option<Booking>,

    #[builder(default)]
    pub meta: Meta,

    #[builder(default)]
    pub source: Option<Source>,
}

#[derive(Clone, Debug, PartialEq, TypedBuilder)]
pub struct Close {
    pub date: Date,
    pub account: Account,

    #[builder(default)]
    pub meta: Meta,

    #[builder(default)]
    pub source: Option<Source>,
}

/// One parsed ledger entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Directive {
    Transaction(Transaction),
    Balance(Balance),
    Note(Note),
    Pad(Pad),
    Commodity(Commodity),
    Open(Open),
    Close(Close),
}

impl Directive {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            Directive::Transaction(_) => DirectiveKind::Transaction,
            Directive::Balance(_) => DirectiveKind::Balance,
            Directive::Note(_) => DirectiveKind::Note,
            Directive::Pad(_) => DirectiveKind::Pad,
            Directive::Commodity(_) => DirectiveKind::Commodity,
            Directive::Open(_) => DirectiveKind::Open,
            Directive::Close(_) => DirectiveKind::Close,
        }
    }

    pub fn date(&self) -> Date {
        match self {
            Directive::Transaction(d) => d.date,
            Directive::Balance(d) => d.date,
            Directive::Note(d) => d.date,
            Directive::Pad(d) => d.date,
            Directive::Commodity(d) => d.date,
            Directive::Open(d) => d.date,
            Directive::Close(d) => d.date,
        }
    }

    pub fn meta(&self) -> &Meta {
        match self {
            Directive::Transaction(d) => &d.meta,
            Directive::Balance(d) => &d.meta,
            Directive::Note(d) => &d.meta,
            Directive::Pad(d) => &d.meta,
            Directive::Commodity(d) => &d.meta,
            Directive::Open(d) => &d.meta,
            Directive::Close(d) => &d.meta,
        }
    }

    pub fn source(&self) -> Option<&Source> {
        match self {
            Directive::Transaction(d) => d.source.as_ref(),
            Directive::Balance(d) => d.source.as_ref(),
            Directive::Note(d) => d.source.as_ref(),
            Directive::Pad(d) => d.source.as_ref(),
            Directive::Commodity(d) => d.source.as_ref(),
            Directive::Open(d) => d.source.as_ref(),
            Directive::Close(d) => d.source.as_ref(),
        }
    }

    pub fn set_source(&mut self, source: Option<Source>) {
        match self {
            Directive::Transaction(d) => d.source = source,
            Directive::Balance(d) => d.source = source,
            Directive::Note(d) => d.source = source,
            Directive::Pad(d) => d.source = source,
            Directive::Commodity(d) => d.source = source,
            Directive::Open(d) => d.source = source,
            Directive::Close(d) => d.source = source,
        }
    }

    /// The single account named by account-bearing directive kinds.
    /// Transactions answer through their postings instead, and commodity
    /// declarations have no account at all.
    pub fn account(&self) -> Option<&Account> {
        match self {
            Directive::Balance(d) => Some(&d.account),
            Directive::Note(d) => Some(&d.account),
            Directive::Pad(d) => Some(&d.account),
            Directive::Open(d) => Some(&d.account),
            Directive::Close(d) => Some(&d.account),
            Directive::Transaction(_) | Directive::Commodity(_) => None,
        }
    }
}
