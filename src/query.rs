//! Filtering, ordering, and pagination over a loaded snapshot.
//!
//! All filters are conjunctive. Results are ordered by date descending; ties
//! keep the order the directives appeared in the file, which the stable sort
//! provides for free. A directive that cannot be converted to its output
//! view is logged and skipped, never failing the whole query.

use serde::Serialize;
use tracing::warn;
use typed_builder::TypedBuilder;

use beanjournal_core::{Date, Directive, DirectiveKind};
use beanjournal_render::render_directive;

use crate::error::Result;
use crate::identity::entry_id;

/// Kinds a query returns when no allow-list is given.
pub const DEFAULT_KINDS: [DirectiveKind; 4] = [
    DirectiveKind::Transaction,
    DirectiveKind::Balance,
    DirectiveKind::Pad,
    DirectiveKind::Note,
];

#[derive(Clone, Debug, Default, TypedBuilder)]
pub struct EntryFilter {
    /// Inclusive lower bound on the directive's own date.
    #[builder(default)]
    pub date_from: Option<Date>,

    /// Inclusive upper bound on the directive's own date.
    #[builder(default)]
    pub date_to: Option<Date>,

    /// Kind allow-list; [`DEFAULT_KINDS`] when absent.
    #[builder(default)]
    pub kinds: Option<Vec<DirectiveKind>>,

    /// Case-insensitive account substring. Transactions match on any posting
    /// account; notes, balances and pads on their single account; other
    /// kinds never match.
    #[builder(default)]
    pub account: Option<String>,

    /// Case-insensitive payee substring; excludes every non-transaction.
    #[builder(default)]
    pub payee: Option<String>,

    /// Case-insensitive exact tag; excludes every non-transaction.
    #[builder(default)]
    pub tag: Option<String>,

    /// Case-insensitive free-text search over payee/narration/posting
    /// accounts (transactions), account/comment (notes), account (balances
    /// and pads).
    #[builder(default)]
    pub search: Option<String>,
}

impl EntryFilter {
    pub fn matches(&self, directive: &Directive) -> bool {
        let kind = directive.kind();
        match &self.kinds {
            Some(kinds) if !kinds.contains(&kind) => return false,
            None if !DEFAULT_KINDS.contains(&kind) => return false,
            _ => {}
        }

        let date = directive.date();
        if let Some(from) = self.date_from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if date > to {
                return false;
            }
        }

        if let Some(account) = &self.account {
            if !account_matches(directive, account) {
                return false;
            }
        }

        if let Some(payee) = &self.payee {
            let matched = match directive {
                Directive::Transaction(txn) => txn
                    .payee
                    .as_deref()
                    .is_some_and(|p| p.to_lowercase().contains(&payee.to_lowercase())),
                _ => false,
            };
            if !matched {
                return false;
            }
        }

        if let Some(tag) = &self.tag {
            let matched = match directive {
                Directive::Transaction(txn) => {
                    txn.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
                }
                _ => false,
            };
            if !matched {
                return false;
            }
        }

        if let Some(search) = &self.search {
            if !search_matches(directive, search) {
                return false;
            }
        }

        true
    }
}

fn account_matches(directive: &Directive, needle: &str) -> bool {
    match directive {
        Directive::Transaction(txn) => txn
            .postings
            .iter()
            .any(|p| p.account.contains_ignore_case(needle)),
        Directive::Note(d) => d.account.contains_ignore_case(needle),
        Directive::Balance(d) => d.account.contains_ignore_case(needle),
        Directive::Pad(d) => d.account.contains_ignore_case(needle),
        _ => false,
    }
}

fn search_matches(directive: &Directive, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    let hit = |text: &str| text.to_lowercase().contains(&needle);
    match directive {
        Directive::Transaction(txn) => {
            txn.payee.as_deref().is_some_and(hit)
                || hit(&txn.narration)
                || txn.postings.iter().any(|p| hit(&p.account.name()))
        }
        Directive::Note(d) => hit(&d.account.name()) || hit(&d.comment),
        Directive::Balance(d) => hit(&d.account.name()),
        Directive::Pad(d) => hit(&d.account.name()),
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Pagination {
    pub offset: usize,
    /// `None` returns everything after `offset`.
    pub limit: Option<usize>,
}

/// One page of query results.
#[derive(Debug, Serialize)]
pub struct EntryPage {
    pub entries: Vec<EntryView>,
    pub total_count: usize,
    pub returned_count: usize,
    pub offset: usize,
    pub limit: Option<usize>,
    pub has_more: bool,
}

/// Transport-agnostic view of one entry: identity, canonical text, and the
/// kind-specific fields flattened alongside.
#[derive(Clone, Debug, Serialize)]
pub struct EntryView {
    pub id: String,
    pub date: String,
    pub text: String,
    #[serde(flatten)]
    pub body: EntryBody,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntryBody {
    Transaction {
        flag: String,
        payee: Option<String>,
        narration: String,
        tags: Vec<String>,
        links: Vec<String>,
        postings: Vec<PostingView>,
    },
    Balance {
        account: String,
        amount: String,
        currency: String,
        tolerance: Option<String>,
    },
    Note {
        account: String,
        comment: String,
    },
    Pad {
        account: String,
        source_account: String,
    },
    Commodity {
        currency: String,
        metadata: Vec<(String, String)>,
    },
    Open {
        account: String,
        currencies: Vec<String>,
        booking: Option<String>,
    },
    Close {
        account: String,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct PostingView {
    pub account: String,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub flag: Option<String>,
    pub comment: Option<String>,
}

impl EntryView {
    pub fn from_directive(directive: &Directive) -> Result<EntryView> {
        let body = match directive {
            Directive::Transaction(txn) => EntryBody::Transaction {
                flag: txn.flag.to_string(),
                payee: txn.payee.clone(),
                narration: txn.narration.clone(),
                tags: txn.tags.iter().cloned().collect(),
                links: txn.links.iter().cloned().collect(),
                postings: txn
                    .postings
                    .iter()
                    .map(|p| PostingView {
                        account: p.account.name(),
                        amount: p.units.as_ref().map(|a| a.num.to_string()),
                        currency: p.units.as_ref().map(|a| a.currency.clone()),
                        flag: p.flag.as_ref().map(|f| f.to_string()),
                        comment: p.comment.clone(),
                    })
                    .collect(),
            },
            Directive::Balance(d) => EntryBody::Balance {
                account: d.account.name(),
                amount: d.amount.num.to_string(),
                currency: d.amount.currency.clone(),
                tolerance: d.tolerance.map(|t| t.to_string()),
            },
            Directive::Note(d) => EntryBody::Note {
                account: d.account.name(),
                comment: d.comment.clone(),
            },
            Directive::Pad(d) => EntryBody::Pad {
                account: d.account.name(),
                source_account: d.source_account.name(),
            },
            Directive::Commodity(d) => EntryBody::Commodity {
                currency: d.name.clone(),
                metadata: meta_view(&d.meta),
            },
            Directive::Open(d) => EntryBody::Open {
                account: d.account.name(),
                currencies: d.currencies.clone(),
                booking: d.booking.map(|b| b.as_str().to_string()),
            },
            Directive::Close(d) => EntryBody::Close {
                account: d.account.name(),
            },
        };
        Ok(EntryView {
            id: entry_id(directive)?,
            date: directive.date().to_string(),
            text: render_directive(directive)?,
            body,
        })
    }
}

/// Metadata as plain key/value strings, text values unquoted.
pub(crate) fn meta_view(meta: &beanjournal_core::Meta) -> Vec<(String, String)> {
    meta.iter()
        .map(|(k, v)| {
            let value = match v {
                beanjournal_core::MetaValue::Text(s) => s.clone(),
                other => other.to_string(),
            };
            (k.to_string(), value)
        })
        .collect()
}

/// Runs a query over a snapshot's directives.
pub(crate) fn execute(
    directives: &[Directive],
    filter: &EntryFilter,
    pagination: Pagination,
) -> EntryPage {
    let mut matched: Vec<&Directive> = directives.iter().filter(|d| filter.matches(d)).collect();
    matched.sort_by(|a, b| b.date().cmp(&a.date()));

    let total_count = matched.len();
    let entries: Vec<EntryView> = matched
        .into_iter()
        .skip(pagination.offset)
        .take(pagination.limit.unwrap_or(usize::MAX))
        .filter_map(|d| match EntryView::from_directive(d) {
            Ok(view) => Some(view),
            Err(err) => {
                warn!(error = %err, "skipping unrenderable entry");
                None
            }
        })
        .collect();
    let returned_count = entries.len();

    EntryPage {
        entries,
        total_count,
        returned_count,
        offset: pagination.offset,
        limit: pagination.limit,
        has_more: pagination.offset + returned_count < total_count,
    }
}
