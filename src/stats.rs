use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Serialize;

use beanjournal_core::Directive;

use crate::Snapshot;

/// Summary of a loaded journal.
#[derive(Debug, Serialize)]
pub struct JournalStats {
    pub file: PathBuf,
    pub total_entries: usize,
    pub by_kind: BTreeMap<String, usize>,
    pub first_date: Option<String>,
    pub last_date: Option<String>,
    pub account_count: usize,
    pub error_count: usize,
    pub loaded_at: String,
}

pub(crate) fn statistics(snapshot: &Snapshot, path: &Path) -> JournalStats {
    let mut by_kind: BTreeMap<String, usize> = BTreeMap::new();
    let mut accounts: BTreeSet<String> = BTreeSet::new();
    for directive in &snapshot.directives {
        *by_kind
            .entry(directive.kind().as_str().to_string())
            .or_default() += 1;
        match directive {
            Directive::Transaction(txn) => {
                accounts.extend(txn.postings.iter().map(|p| p.account.name()));
            }
            other => {
                if let Some(account) = other.account() {
                    accounts.insert(account.name());
                }
            }
        }
    }
    let dates: Vec<_> = snapshot.directives.iter().map(Directive::date).collect();
    JournalStats {
        file: path.to_path_buf(),
        total_entries: snapshot.directives.len(),
        by_kind,
        first_date: dates.iter().min().map(|d| d.to_string()),
        last_date: dates.iter().max().map(|d| d.to_string()),
        account_count: accounts.len(),
        error_count: snapshot.errors.len(),
        loaded_at: snapshot.loaded_at.to_rfc3339(),
    }
}
