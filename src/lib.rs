//! A queryable, mutable view over a plain-text ledger journal.
//!
//! The text file stays the single source of truth: every mutation renders
//! canonical text, splices or appends it into the file (after backing the
//! file up), and then rebuilds the in-memory snapshot by reparsing. Entries
//! are addressed by a content-derived identity that survives unrelated edits
//! elsewhere in the file.
//!
//! Mutations are serialized through an internal writer lock: two concurrent
//! splices computed from different snapshots of the same file would corrupt
//! each other. Reads always see a fully built snapshot; reloads publish a
//! replacement wholesale instead of mutating the live one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use beanjournal_core::{Commodity, Date, Directive, Meta, MetaValue};
use beanjournal_parser::{LedgerError, Options};
use beanjournal_render::{directive_lines, render_directive};

pub use config::JournalConfig;
pub use error::{JournalError, Result};
pub use identity::entry_id;
pub use mutation::{
    BalanceInput, CloseInput, EntryInput, MutationReceipt, NoteInput, OpenInput, PostingInput,
    TransactionInput,
};
pub use query::{EntryBody, EntryFilter, EntryPage, EntryView, Pagination, PostingView};
pub use region::TextRegion;
pub use stats::JournalStats;

pub mod backup;
pub mod config;
pub mod error;
pub mod identity;
pub mod mutation;
pub mod query;
pub mod region;
pub mod stats;

/// The parsed state of the ledger as of one load. Immutable once published.
pub struct Snapshot {
    pub directives: Vec<Directive>,
    pub errors: Vec<LedgerError>,
    pub options: Options,
    pub loaded_at: DateTime<Local>,
}

impl Snapshot {
    fn load(path: &Path) -> Result<Snapshot> {
        let loaded = beanjournal_parser::load(path)?;
        Ok(Snapshot {
            directives: loaded.directives,
            errors: loaded.errors,
            options: loaded.options,
            loaded_at: Local::now(),
        })
    }

    /// Linear scan by identity; ledger sizes make an index unnecessary.
    pub fn find_by_id(&self, id: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| match entry_id(d) {
            Ok(candidate) => candidate == id,
            Err(err) => {
                warn!(error = %err, "skipping entry with uncomputable id");
                false
            }
        })
    }

    /// Earliest directive date in the ledger.
    pub fn first_date(&self) -> Option<Date> {
        self.directives.iter().map(Directive::date).min()
    }
}

pub struct Journal {
    path: PathBuf,
    config: JournalConfig,
    snapshot: RwLock<Arc<Snapshot>>,
    writer: Mutex<()>,
}

impl Journal {
    /// Loads the ledger at `path`. A file that cannot be read or parsed
    /// fails here; non-fatal directive errors are kept on the snapshot.
    pub fn open(path: impl Into<PathBuf>, config: JournalConfig) -> Result<Journal> {
        let path = path.into();
        let snapshot = Snapshot::load(&path)?;
        info!(
            file = %path.display(),
            entries = snapshot.directives.len(),
            errors = snapshot.errors.len(),
            "journal loaded"
        );
        Ok(Journal {
            snapshot: RwLock::new(Arc::new(snapshot)),
            path,
            config,
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The current snapshot. Holders keep reading a consistent state even
    /// while a reload publishes a newer one.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    /// Reparses the ledger and swaps the snapshot in one step. On failure
    /// the previous snapshot stays in place and readable.
    pub fn reload(&self) -> Result<()> {
        let fresh = Snapshot::load(&self.path)?;
        *self.snapshot.write() = Arc::new(fresh);
        Ok(())
    }

    pub fn entries(&self, filter: &EntryFilter, pagination: Pagination) -> EntryPage {
        query::execute(&self.snapshot().directives, filter, pagination)
    }

    pub fn entry(&self, id: &str) -> Option<EntryView> {
        let snapshot = self.snapshot();
        let directive = snapshot.find_by_id(id)?;
        match EntryView::from_directive(directive) {
            Ok(view) => Some(view),
            Err(err) => {
                warn!(error = %err, "entry found but not convertible");
                None
            }
        }
    }

    /// The declaration for `symbol`, if the ledger has one.
    pub fn commodity(&self, symbol: &str) -> Option<EntryView> {
        let snapshot = self.snapshot();
        let directive = snapshot.directives.iter().find(
            |d| matches!(d, Directive::Commodity(c) if c.name == symbol),
        )?;
        EntryView::from_directive(directive).ok()
    }

    pub fn statistics(&self) -> JournalStats {
        stats::statistics(&self.snapshot(), &self.path)
    }

    /// Appends a new entry to the primary file.
    pub fn create_entry(&self, input: &EntryInput) -> Result<MutationReceipt> {
        let directive = input.to_directive()?;
        let text = render_directive(&directive)?;
        let id = entry_id(&directive)?;

        let _guard = self.writer.lock();
        let backup = backup::create_backup(&self.path, &self.config)?;
        region::append(&self.path, &text)?;
        let reload_error = self.reload_after_write();
        Ok(MutationReceipt {
            id,
            message: format!("created {}", input.kind()),
            target_file: self.path.clone(),
            backup,
            reload_error,
        })
    }

    /// Replaces the entry with identity `id` by the payload's content.
    ///
    /// When the entry carries no usable source location its region cannot be
    /// found, and the new content is appended to the primary file instead of
    /// failing; the stale copy cannot exist on disk in that case.
    pub fn update_entry(&self, id: &str, input: &EntryInput) -> Result<MutationReceipt> {
        let replacement = input.to_directive()?;
        let lines = directive_lines(&replacement)?;
        let new_id = entry_id(&replacement)?;

        let _guard = self.writer.lock();
        let snapshot = self.snapshot();
        let existing = snapshot
            .find_by_id(id)
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;
        if existing.kind() != input.kind() {
            return Err(JournalError::Validation(format!(
                "entry '{}' is a {}, payload is a {}",
                id,
                existing.kind(),
                input.kind()
            )));
        }

        match region::locate(existing, id) {
            Ok(region) => {
                let backup = backup::create_backup(&region.file, &self.config)?;
                region::splice(&region, &lines)?;
                let reload_error = self.reload_after_write();
                Ok(MutationReceipt {
                    id: new_id,
                    message: format!("updated {}", input.kind()),
                    target_file: region.file,
                    backup,
                    reload_error,
                })
            }
            Err(JournalError::CannotLocate(_)) => {
                let backup = backup::create_backup(&self.path, &self.config)?;
                region::append(&self.path, &render_directive(&replacement)?)?;
                let reload_error = self.reload_after_write();
                Ok(MutationReceipt {
                    id: new_id,
                    message: format!("updated {} (no known location, appended)", input.kind()),
                    target_file: self.path.clone(),
                    backup,
                    reload_error,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Removes the entry with identity `id` from its source file.
    pub fn delete_entry(&self, id: &str) -> Result<MutationReceipt> {
        let _guard = self.writer.lock();
        let snapshot = self.snapshot();
        let existing = snapshot
            .find_by_id(id)
            .ok_or_else(|| JournalError::NotFound(id.to_string()))?;
        let region = region::locate(existing, id)?;
        let kind = existing.kind();

        let backup = backup::create_backup(&region.file, &self.config)?;
        region::splice(&region, &[])?;
        let reload_error = self.reload_after_write();
        Ok(MutationReceipt {
            id: id.to_string(),
            message: format!("deleted {}", kind),
            target_file: region.file,
            backup,
            reload_error,
        })
    }

    /// Sets metadata keys on the declaration for `symbol`, rewriting only
    /// the metadata body in place and keeping the original header line
    /// verbatim so the declared date never changes. Without an existing
    /// declaration a new one is appended, dated at the earliest directive
    /// date in the ledger (today if there is none), to a file that already
    /// mentions the symbol when possible.
    pub fn update_commodity_metadata(
        &self,
        symbol: &str,
        updates: &BTreeMap<String, String>,
    ) -> Result<MutationReceipt> {
        if updates.is_empty() {
            return Err(JournalError::Validation(
                "no metadata entries given".to_string(),
            ));
        }

        let _guard = self.writer.lock();
        let snapshot = self.snapshot();
        let existing = snapshot.directives.iter().find_map(|d| match d {
            Directive::Commodity(c) if c.name == symbol => Some(c.clone()),
            _ => None,
        });

        if let Some(commodity) = existing {
            let located = region::locate(&Directive::Commodity(commodity.clone()), symbol);
            match located {
                Ok(region) => {
                    let lines = region::read_lines(&region.file)?;
                    let header = lines
                        .get(region.start_line - 1)
                        .cloned()
                        .ok_or_else(|| JournalError::CannotLocate(symbol.to_string()))?;

                    let mut merged = commodity;
                    for (key, value) in updates {
                        merged
                            .meta
                            .insert(key.clone(), MetaValue::Text(value.clone()));
                    }
                    let directive = Directive::Commodity(merged);
                    let rendered = directive_lines(&directive)?;
                    let mut replacement = vec![header];
                    replacement.extend(rendered.into_iter().skip(1));

                    let backup = backup::create_backup(&region.file, &self.config)?;
                    region::splice(&region, &replacement)?;
                    let reload_error = self.reload_after_write();
                    return Ok(MutationReceipt {
                        id: entry_id(&directive)?,
                        message: format!("updated commodity metadata for {}", symbol),
                        target_file: region.file,
                        backup,
                        reload_error,
                    });
                }
                Err(JournalError::CannotLocate(_)) => {}
                Err(other) => return Err(other),
            }
        }

        let date = snapshot.first_date().unwrap_or_else(Date::today);
        let mut meta = Meta::new();
        for (key, value) in updates {
            meta.insert(key.clone(), MetaValue::Text(value.clone()));
        }
        let directive = Directive::Commodity(
            Commodity::builder()
                .date(date)
                .name(symbol.to_string())
                .meta(meta)
                .build(),
        );
        let target = self.commodity_target_file(&snapshot, symbol);
        let backup = backup::create_backup(&target, &self.config)?;
        region::append(&target, &render_directive(&directive)?)?;
        let reload_error = self.reload_after_write();
        Ok(MutationReceipt {
            id: entry_id(&directive)?,
            message: format!("declared commodity {}", symbol),
            target_file: target,
            backup,
            reload_error,
        })
    }

    /// A new declaration goes next to existing uses of the symbol: a file
    /// with a same-symbol declaration first, then one with a transaction
    /// posting in that currency, then the primary file.
    fn commodity_target_file(&self, snapshot: &Snapshot, symbol: &str) -> PathBuf {
        for directive in &snapshot.directives {
            if let Directive::Commodity(c) = directive {
                if c.name == symbol {
                    if let Some(source) = &c.source {
                        return source.file.clone();
                    }
                }
            }
        }
        for directive in &snapshot.directives {
            if let Directive::Transaction(txn) = directive {
                let posts_symbol = txn
                    .postings
                    .iter()
                    .any(|p| p.units.as_ref().is_some_and(|a| a.currency == symbol));
                if posts_symbol {
                    if let Some(source) = &txn.source {
                        return source.file.clone();
                    }
                }
            }
        }
        self.path.clone()
    }

    /// The write already happened; a failing reparse is reported on the
    /// receipt, not rolled back. The backup taken before the write is the
    /// recovery path.
    fn reload_after_write(&self) -> Option<String> {
        match self.reload() {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "ledger failed to reparse after write");
                Some(err.to_string())
            }
        }
    }
}
