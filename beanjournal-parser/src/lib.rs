//! Parser for the journal's plain-text format.
//!
//! [`parse`] turns one file's text into typed directives, each tagged with a
//! [`Source`](beanjournal_core::Source) naming its file and 1-based header
//! line. [`loader::load`] builds on that to read a whole ledger, following
//! `include` directives.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;
use rust_decimal::Decimal;

use beanjournal_core as bc;

use error::{ParseError, ParseResult};

pub mod error;
pub mod loader;

pub use loader::{load, LedgerError, LoadError, LoadResult, Options};

#[derive(PestParser)]
#[grammar = "beanjournal.pest"]
pub struct JournalParser;

/// Outcome of parsing a single file.
///
/// Semantic problems with an individual directive (an invalid calendar date,
/// an unknown account root, an unparseable number) land in `errors` and the
/// directive is skipped; only a whole-file syntax error fails [`parse`].
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub directives: Vec<bc::Directive>,
    /// `include` targets with the line each appeared on, unresolved.
    pub includes: Vec<(PathBuf, usize)>,
    pub options: Vec<(String, String)>,
    pub errors: Vec<ParseError>,
}

pub fn parse(input: &str, file: &Path) -> ParseResult<ParsedFile> {
    let parsed = JournalParser::parse(Rule::file, input)?
        .next()
        .ok_or_else(|| ParseError::invalid_state("non-empty parse result"))?;

    let mut out = ParsedFile::default();
    for pair in parsed.into_inner() {
        match pair.as_rule() {
            Rule::EOI => break,
            Rule::option => {
                let (name, value) = option_pair(pair)?;
                out.options.push((name, value));
            }
            Rule::include => {
                let line = pair.as_span().start_pos().line_col().0;
                let target = quoted_string(first_inner(pair)?)?;
                out.includes.push((PathBuf::from(target), line));
            }
            _ => match directive(pair, file) {
                Ok(dir) => out.directives.push(dir),
                Err(err) => out.errors.push(err),
            },
        }
    }
    Ok(out)
}

fn directive(pair: Pair<'_, Rule>, file: &Path) -> ParseResult<bc::Directive> {
    let line = pair.as_span().start_pos().line_col().0;
    let source = bc::Source {
        file: file.to_path_buf(),
        line,
    };
    match pair.as_rule() {
        Rule::balance => balance_directive(pair, source),
        Rule::open => open_directive(pair, source),
        Rule::close => close_directive(pair, source),
        Rule::commodity_directive => commodity_directive(pair, source),
        Rule::note => note_directive(pair, source),
        Rule::pad => pad_directive(pair, source),
        Rule::transaction => transaction_directive(pair, source),
        rule => Err(ParseError::invalid_state(format!(
            "directive rule, got {:?}",
            rule
        ))),
    }
}

fn balance_directive(pair: Pair<'_, Rule>, source: bc::Source) -> ParseResult<bc::Directive> {
    let mut inner = pair.into_inner();
    let date = date(next_pair(&mut inner, "date")?)?;
    let account = account(next_pair(&mut inner, "account")?)?;
    let (amount, tolerance) = amount_tolerance(next_pair(&mut inner, "amount")?)?;
    let meta = collect_meta(inner)?;
    Ok(bc::Directive::Balance(
        bc::Balance::builder()
            .date(date)
            .account(account)
            .amount(amount)
            .tolerance(tolerance)
            .meta(meta)
            .source(Some(source))
            .build(),
    ))
}

fn open_directive(pair: Pair<'_, Rule>, source: bc::Source) -> ParseResult<bc::Directive> {
    let mut inner = pair.into_inner();
    let date = date(next_pair(&mut inner, "date")?)?;
    let account = account(next_pair(&mut inner, "account")?)?;
    let mut currencies = Vec::new();
    let mut booking = None;
    let mut meta = bc::Meta::new();
    for p in inner {
        match p.as_rule() {
            Rule::commodity_list => {
                currencies.extend(p.into_inner().map(|c| c.as_str().to_string()));
            }
            Rule::quoted_str => {
                let span = p.as_span();
                let name = quoted_string(p)?;
                booking = Some(bc::Booking::from_str(&name).map_err(|_| {
                    ParseError::invalid_input_with_span(
                        format!("unknown booking method \"{}\"", name),
                        span,
                    )
                })?);
            }
            Rule::key_value => {
                let (key, value) = key_value(p)?;
                meta.insert(key, value);
            }
            rule => return Err(ParseError::invalid_state(format!("{:?} in open", rule))),
        }
    }
    Ok(bc::Directive::Open(
        bc::Open::builder()
            .date(date)
            .account(account)
            .currencies(currencies)
            .booking(booking)
            .meta(meta)
            .source(Some(source))
            .build(),
    ))
}

fn close_directive(pair: Pair<'_, Rule>, source: bc::Source) -> ParseResult<bc::Directive> {
    let mut inner = pair.into_inner();
    let date = date(next_pair(&mut inner, "date")?)?;
    let account = account(next_pair(&mut inner, "account")?)?;
    let meta = collect_meta(inner)?;
    Ok(bc::Directive::Close(
        bc::Close::builder()
            .date(date)
            .account(account)
            .meta(meta)
            .source(Some(source))
            .build(),
    ))
}

fn commodity_directive(pair: Pair<'_, Rule>, source: bc::Source) -> ParseResult<bc::Directive> {
    let mut inner = pair.into_inner();
    let date = date(next_pair(&mut inner, "date")?)?;
    let name = next_pair(&mut inner, "commodity")?.as_str().to_string();
    let meta = collect_meta(inner)?;
    Ok(bc::Directive::Commodity(
        bc::Commodity::builder()
            .date(date)
            .name(name)
            .meta(meta)
            .source(Some(source))
            .build(),
    ))
}

fn note_directive(pair: Pair<'_, Rule>, source: bc::Source) -> ParseResult<bc::Directive> {
    let mut inner = pair.into_inner();
    let date = date(next_pair(&mut inner, "date")?)?;
    let account = account(next_pair(&mut inner, "account")?)?;
    let comment = quoted_string(next_pair(&mut inner, "comment")?)?;
    let meta = collect_meta(inner)?;
    Ok(bc::Directive::Note(
        bc::Note::builder()
            .date(date)
            .account(account)
            .comment(comment)
            .meta(meta)
            .source(Some(source))
            .build(),
    ))
}

fn pad_directive(pair: Pair<'_, Rule>, source: bc::Source) -> ParseResult<bc::Directive> {
    let mut inner = pair.into_inner();
    let date = date(next_pair(&mut inner, "date")?)?;
    let padded = account(next_pair(&mut inner, "account")?)?;
    let source_account = account(next_pair(&mut inner, "source account")?)?;
    let meta = collect_meta(inner)?;
    Ok(bc::Directive::Pad(
        bc::Pad::builder()
            .date(date)
            .account(padded)
            .source_account(source_account)
            .meta(meta)
            .source(Some(source))
            .build(),
    ))
}

fn transaction_directive(pair: Pair<'_, Rule>, source: bc::Source) -> ParseResult<bc::Directive> {
    let mut inner = pair.into_inner();
    let date = date(next_pair(&mut inner, "date")?)?;
    let flag = bc::Flag::from(next_pair(&mut inner, "flag")?.as_str());
    let mut payee = None;
    let mut narration = String::new();
    let mut tags = BTreeSet::new();
    let mut links = BTreeSet::new();
    let mut meta = bc::Meta::new();
    let mut postings: Vec<bc::Posting> = Vec::new();
    for p in inner {
        match p.as_rule() {
            Rule::txn_strings => {
                let mut strings = Vec::new();
                for s in p.into_inner() {
                    strings.push(quoted_string(s)?);
                }
                let mut strings = strings.into_iter();
                match (strings.next(), strings.next()) {
                    (Some(p0), Some(n)) => {
                        payee = Some(p0);
                        narration = n;
                    }
                    (Some(n), None) => narration = n,
                    _ => {}
                }
            }
            Rule::tag => {
                tags.insert(p.as_str()[1..].to_string());
            }
            Rule::link => {
                links.insert(p.as_str()[1..].to_string());
            }
            // Metadata lines after a posting belong to that posting; before
            // the first posting they belong to the transaction itself.
            Rule::key_value => {
                let (key, value) = key_value(p)?;
                match postings.last_mut() {
                    Some(last) => last.meta.insert(key, value),
                    None => meta.insert(key, value),
                }
            }
            Rule::posting => postings.push(posting(p)?),
            rule => {
                return Err(ParseError::invalid_state(format!(
                    "{:?} in transaction",
                    rule
                )))
            }
        }
    }
    Ok(bc::Directive::Transaction(
        bc::Transaction::builder()
            .date(date)
            .flag(flag)
            .payee(payee)
            .narration(narration)
            .tags(tags)
            .links(links)
            .postings(postings)
            .meta(meta)
            .source(Some(source))
            .build(),
    ))
}

fn posting(pair: Pair<'_, Rule>) -> ParseResult<bc::Posting> {
    let mut flag = None;
    let mut account_val = None;
    let mut units = None;
    let mut cost = None;
    let mut price = None;
    let mut comment = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::posting_flag => flag = Some(bc::Flag::from(p.as_str())),
            Rule::account => account_val = Some(account(p)?),
            Rule::amount => units = Some(amount(p)?),
            Rule::cost_spec => cost = Some(cost_spec(p)?),
            Rule::price_annotation => price = Some(price_annotation(p)?),
            Rule::posting_comment => {
                let text = p
                    .into_inner()
                    .next()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default();
                comment = Some(text);
            }
            rule => return Err(ParseError::invalid_state(format!("{:?} in posting", rule))),
        }
    }
    Ok(bc::Posting::builder()
        .account(account_val.ok_or_else(|| ParseError::invalid_state("posting account"))?)
        .units(units)
        .cost(cost)
        .price(price)
        .flag(flag)
        .comment(comment)
        .build())
}

fn cost_spec(pair: Pair<'_, Rule>) -> ParseResult<bc::CostSpec> {
    let body = first_inner(pair)?;
    let total = body.as_rule() == Rule::cost_spec_total;
    let mut spec = bc::CostSpec {
        total,
        ..bc::CostSpec::default()
    };
    if let Some(list) = body.into_inner().next() {
        for comp in list.into_inner() {
            let comp = first_inner(comp)?;
            match comp.as_rule() {
                Rule::amount => {
                    let amount = amount(comp)?;
                    spec.number = Some(amount.num);
                    spec.currency = Some(amount.currency);
                }
                Rule::date => spec.date = Some(date(comp)?),
                Rule::quoted_str => spec.label = Some(quoted_string(comp)?),
                Rule::num => spec.number = Some(decimal(comp)?),
                rule => {
                    return Err(ParseError::invalid_state(format!("{:?} in cost spec", rule)))
                }
            }
        }
    }
    Ok(spec)
}

fn price_annotation(pair: Pair<'_, Rule>) -> ParseResult<bc::PriceSpec> {
    let body = first_inner(pair)?;
    let total = body.as_rule() == Rule::price_total;
    let amount = amount(first_inner(body)?)?;
    Ok(bc::PriceSpec { amount, total })
}

fn option_pair(pair: Pair<'_, Rule>) -> ParseResult<(String, String)> {
    let mut inner = pair.into_inner();
    let name = quoted_string(next_pair(&mut inner, "option name")?)?;
    let value = quoted_string(next_pair(&mut inner, "option value")?)?;
    Ok((name, value))
}

fn collect_meta(pairs: pest::iterators::Pairs<'_, Rule>) -> ParseResult<bc::Meta> {
    let mut meta = bc::Meta::new();
    for p in pairs {
        match p.as_rule() {
            Rule::key_value => {
                let (key, value) = key_value(p)?;
                meta.insert(key, value);
            }
            rule => {
                return Err(ParseError::invalid_state(format!(
                    "key-value line, got {:?}",
                    rule
                )))
            }
        }
    }
    Ok(meta)
}

fn key_value(pair: Pair<'_, Rule>) -> ParseResult<(String, bc::MetaValue)> {
    let mut inner = pair.into_inner();
    let key = next_pair(&mut inner, "key")?.as_str().to_string();
    let value = meta_value(next_pair(&mut inner, "value")?)?;
    Ok((key, value))
}

fn meta_value(pair: Pair<'_, Rule>) -> ParseResult<bc::MetaValue> {
    let value = first_inner(pair)?;
    Ok(match value.as_rule() {
        Rule::quoted_str => bc::MetaValue::Text(quoted_string(value)?),
        Rule::date => bc::MetaValue::Date(date(value)?),
        Rule::bool => bc::MetaValue::Bool(value.as_str().starts_with('T')),
        Rule::amount => bc::MetaValue::Amount(amount(value)?),
        Rule::num => bc::MetaValue::Number(decimal(value)?),
        Rule::account => bc::MetaValue::Account(account(value)?),
        Rule::commodity => bc::MetaValue::Currency(value.as_str().to_string()),
        Rule::tag => bc::MetaValue::Tag(value.as_str()[1..].to_string()),
        rule => {
            return Err(ParseError::invalid_state(format!(
                "metadata value, got {:?}",
                rule
            )))
        }
    })
}

fn amount(pair: Pair<'_, Rule>) -> ParseResult<bc::Amount> {
    let mut inner = pair.into_inner();
    let num = decimal(next_pair(&mut inner, "number")?)?;
    let currency = next_pair(&mut inner, "currency")?.as_str().to_string();
    Ok(bc::Amount { num, currency })
}

fn amount_tolerance(pair: Pair<'_, Rule>) -> ParseResult<(bc::Amount, Option<Decimal>)> {
    let parts: Vec<Pair<'_, Rule>> = pair.into_inner().collect();
    let rules: Vec<Rule> = parts.iter().map(|p| p.as_rule()).collect();
    match (rules.as_slice(), parts.as_slice()) {
        // 100 ~ 1 EUR
        ([Rule::num, Rule::num, Rule::commodity], [number, tol, currency]) => Ok((
            bc::Amount {
                num: decimal(number.clone())?,
                currency: currency.as_str().to_string(),
            },
            Some(decimal(tol.clone())?),
        )),
        // 100.00 USD ~ 1.00 USD
        (
            [Rule::num, Rule::commodity, Rule::num, Rule::commodity],
            [number, currency, tol, _tol_currency],
        ) => Ok((
            bc::Amount {
                num: decimal(number.clone())?,
                currency: currency.as_str().to_string(),
            },
            Some(decimal(tol.clone())?),
        )),
        // 100.00 USD
        ([Rule::num, Rule::commodity], [number, currency]) => Ok((
            bc::Amount {
                num: decimal(number.clone())?,
                currency: currency.as_str().to_string(),
            },
            None,
        )),
        _ => Err(ParseError::invalid_state("amount with optional tolerance")),
    }
}

fn date(pair: Pair<'_, Rule>) -> ParseResult<bc::Date> {
    let span = pair.as_span();
    bc::Date::from_str(pair.as_str()).map_err(|_| {
        ParseError::invalid_input_with_span(
            format!("invalid calendar date '{}'", span.as_str()),
            span,
        )
    })
}

fn decimal(pair: Pair<'_, Rule>) -> ParseResult<Decimal> {
    let span = pair.as_span();
    let cleaned = pair.as_str().replace(',', "");
    Decimal::from_str(&cleaned).map_err(|e| ParseError::decimal_parse_error(e, span))
}

fn account(pair: Pair<'_, Rule>) -> ParseResult<bc::Account> {
    let span = pair.as_span();
    bc::Account::from_str(pair.as_str())
        .map_err(|e| ParseError::invalid_input_with_span(e, span))
}

fn quoted_string(pair: Pair<'_, Rule>) -> ParseResult<String> {
    let inner = first_inner(pair)?;
    Ok(unescape(inner.as_str()))
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(escaped) => out.push(escaped),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn first_inner(pair: Pair<'_, Rule>) -> ParseResult<Pair<'_, Rule>> {
    let rule = pair.as_rule();
    pair.into_inner()
        .next()
        .ok_or_else(|| ParseError::invalid_state(format!("inner pair of {:?}", rule)))
}

fn next_pair<'i>(
    pairs: &mut pest::iterators::Pairs<'i, Rule>,
    expected: &str,
) -> ParseResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| ParseError::invalid_state(expected.to_string()))
}
