//! Edit payloads and their conversion into directives.
//!
//! Payload fields arrive as strings (the transport-agnostic shape of an API
//! request body) and are validated here, before any file is touched: a
//! payload that fails conversion never reaches the write path.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use beanjournal_core::{
    Account, Amount, Balance, Booking, Close, Date, Directive, DirectiveKind, Flag, Meta,
    MetaValue, Note, Open, Posting, Transaction,
};

use crate::error::{JournalError, Result};

/// A create/update payload, tagged by directive kind. Commodity declarations
/// are managed through
/// [`Journal::update_commodity_metadata`](crate::Journal::update_commodity_metadata)
/// instead.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryInput {
    Transaction(TransactionInput),
    Balance(BalanceInput),
    Note(NoteInput),
    Open(OpenInput),
    Close(CloseInput),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TransactionInput {
    pub date: String,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub payee: Option<String>,
    #[serde(default)]
    pub narration: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    pub postings: Vec<PostingInput>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PostingInput {
    pub account: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BalanceInput {
    pub date: String,
    pub account: String,
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub tolerance: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NoteInput {
    pub date: String,
    pub account: String,
    pub comment: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct OpenInput {
    pub date: String,
    pub account: String,
    #[serde(default)]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub booking: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CloseInput {
    pub date: String,
    pub account: String,
}

impl EntryInput {
    pub fn kind(&self) -> DirectiveKind {
        match self {
            EntryInput::Transaction(_) => DirectiveKind::Transaction,
            EntryInput::Balance(_) => DirectiveKind::Balance,
            EntryInput::Note(_) => DirectiveKind::Note,
            EntryInput::Open(_) => DirectiveKind::Open,
            EntryInput::Close(_) => DirectiveKind::Close,
        }
    }

    /// Validates the payload and builds the directive it describes. The
    /// result carries no source location; one is assigned by the next
    /// reload after it is written.
    pub fn to_directive(&self) -> Result<Directive> {
        match self {
            EntryInput::Transaction(input) => input.to_directive(),
            EntryInput::Balance(input) => input.to_directive(),
            EntryInput::Note(input) => input.to_directive(),
            EntryInput::Open(input) => input.to_directive(),
            EntryInput::Close(input) => input.to_directive(),
        }
    }
}

impl TransactionInput {
    fn to_directive(&self) -> Result<Directive> {
        if self.postings.len() < 2 {
            return Err(JournalError::Validation(format!(
                "a transaction needs at least two postings, got {}",
                self.postings.len()
            )));
        }
        let postings = self
            .postings
            .iter()
            .map(PostingInput::to_posting)
            .collect::<Result<Vec<Posting>>>()?;
        let mut meta = Meta::new();
        for (key, value) in &self.metadata {
            meta.insert(key.clone(), MetaValue::Text(value.clone()));
        }
        Ok(Directive::Transaction(
            Transaction::builder()
                .date(parse_date(&self.date)?)
                .flag(
                    self.flag
                        .as_deref()
                        .map(Flag::from)
                        .unwrap_or_default(),
                )
                .payee(self.payee.clone())
                .narration(self.narration.clone())
                .tags(
                    self.tags
                        .iter()
                        .map(|t| t.trim_start_matches('#').to_string())
                        .collect(),
                )
                .links(
                    self.links
                        .iter()
                        .map(|l| l.trim_start_matches('^').to_string())
                        .collect(),
                )
                .postings(postings)
                .meta(meta)
                .build(),
        ))
    }
}

impl PostingInput {
    fn to_posting(&self) -> Result<Posting> {
        let units = match (&self.amount, &self.currency) {
            (Some(amount), Some(currency)) => {
                Some(Amount::new(parse_decimal(amount)?, currency.clone()))
            }
            (Some(_), None) => {
                return Err(JournalError::Validation(format!(
                    "posting to {} has an amount but no currency",
                    self.account
                )))
            }
            _ => None,
        };
        Ok(Posting::builder()
            .account(parse_account(&self.account)?)
            .units(units)
            .flag(self.flag.as_deref().map(Flag::from))
            .comment(self.comment.clone())
            .build())
    }
}

impl BalanceInput {
    fn to_directive(&self) -> Result<Directive> {
        Ok(Directive::Balance(
            Balance::builder()
                .date(parse_date(&self.date)?)
                .account(parse_account(&self.account)?)
                .amount(Amount::new(
                    parse_decimal(&self.amount)?,
                    self.currency.clone(),
                ))
                .tolerance(
                    self.tolerance
                        .as_deref()
                        .map(parse_decimal)
                        .transpose()?,
                )
                .build(),
        ))
    }
}

impl NoteInput {
    fn to_directive(&self) -> Result<Directive> {
        Ok(Directive::Note(
            Note::builder()
                .date(parse_date(&self.date)?)
                .account(parse_account(&self.account)?)
                .comment(self.comment.clone())
                .build(),
        ))
    }
}

impl OpenInput {
    fn to_directive(&self) -> Result<Directive> {
        let booking = self
            .booking
            .as_deref()
            .map(|b| {
                Booking::from_str(b).map_err(|_| {
                    JournalError::Validation(format!("unknown booking method '{}'", b))
                })
            })
            .transpose()?;
        Ok(Directive::Open(
            Open::builder()
                .date(parse_date(&self.date)?)
                .account(parse_account(&self.account)?)
                .currencies(self.currencies.clone())
                .booking(booking)
                .build(),
        ))
    }
}

impl CloseInput {
    fn to_directive(&self) -> Result<Directive> {
        Ok(Directive::Close(
            Close::builder()
                .date(parse_date(&self.date)?)
                .account(parse_account(&self.account)?)
                .build(),
        ))
    }
}

fn parse_date(s: &str) -> Result<Date> {
    Date::from_str(s).map_err(|_| JournalError::Validation(format!("invalid date '{}'", s)))
}

fn parse_account(s: &str) -> Result<Account> {
    Account::from_str(s).map_err(|e| JournalError::Validation(e.to_string()))
}

/// Commas are accepted only as thousands separators grouping exactly three
/// digits in the integral part, the same shape the parser accepts in ledger
/// text.
fn parse_decimal(s: &str) -> Result<Decimal> {
    let invalid = || JournalError::Validation(format!("invalid amount '{}'", s));
    let (integral, fraction) = match s.split_once('.') {
        Some((integral, fraction)) => (integral, fraction),
        None => (s, ""),
    };
    if fraction.contains(',') {
        return Err(invalid());
    }
    if integral.contains(',') {
        let mut groups = integral.trim_start_matches(['-', '+']).split(',');
        let head_ok = groups
            .next()
            .is_some_and(|g| !g.is_empty() && g.bytes().all(|b| b.is_ascii_digit()));
        let tail_ok = groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()));
        if !head_ok || !tail_ok {
            return Err(invalid());
        }
    }
    Decimal::from_str(&s.replace(',', "")).map_err(|_| invalid())
}

/// What a successful mutation did.
#[derive(Debug, Serialize)]
pub struct MutationReceipt {
    /// Identity of the written entry; for updates, the identity of the new
    /// content, not the old one.
    pub id: String,
    pub message: String,
    pub target_file: PathBuf,
    pub backup: Option<PathBuf>,
    /// Set when the mandatory post-write reload failed. The write itself is
    /// still reported as successful and is not rolled back.
    pub reload_error: Option<String>,
}
