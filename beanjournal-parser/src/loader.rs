//! Multi-file ledger loading.
//!
//! [`load`] reads a primary journal file, parses it, and follows `include`
//! directives depth-first. A primary file that cannot be read or parsed fails
//! the load; trouble in an included file (missing, unreadable, syntax error)
//! is recorded in [`LoadResult::errors`] and the rest of the ledger still
//! loads, matching how checkers report include problems without giving up.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use beanjournal_core::Directive;

use crate::error::ParseError;

/// `option` values collected across all loaded files, first occurrence of a
/// name wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Options {
    entries: Vec<(String, String)>,
}

impl Options {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    fn set(&mut self, name: String, value: String) {
        if self.get(&name).is_none() {
            self.entries.push((name, value));
        }
    }
}

/// A non-fatal problem found while loading, tied to the file it came from.
#[derive(Debug)]
pub struct LedgerError {
    pub file: PathBuf,
    pub message: String,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// Everything a successful load produced. `errors` may be non-empty: skipped
/// directives and broken includes do not fail the load.
#[derive(Debug, Default)]
pub struct LoadResult {
    pub directives: Vec<Directive>,
    pub errors: Vec<LedgerError>,
    pub options: Options,
}

/// A fatal failure to load the primary journal file.
#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Syntax {
        path: PathBuf,
        source: ParseError,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "cannot read {}: {}", path.display(), source)
            }
            LoadError::Syntax { path, source } => {
                write!(f, "cannot parse {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for LoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Syntax { source, .. } => Some(source),
        }
    }
}

pub fn load(path: &Path) -> Result<LoadResult, LoadError> {
    let mut out = LoadResult::default();
    let mut visited = HashSet::new();
    load_file(path, true, &mut visited, &mut out)?;
    Ok(out)
}

fn load_file(
    path: &Path,
    primary: bool,
    visited: &mut HashSet<PathBuf>,
    out: &mut LoadResult,
) -> Result<(), LoadError> {
    // Canonicalization keeps `a.journal` and `./a.journal` from being loaded
    // twice, and guards against include cycles.
    let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(key) {
        return Ok(());
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) if primary => {
            return Err(LoadError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(source) => {
            out.errors.push(LedgerError {
                file: path.to_path_buf(),
                message: format!("cannot read included file: {}", source),
            });
            return Ok(());
        }
    };

    let parsed = match crate::parse(&text, path) {
        Ok(parsed) => parsed,
        Err(source) if primary => {
            return Err(LoadError::Syntax {
                path: path.to_path_buf(),
                source,
            })
        }
        Err(source) => {
            out.errors.push(LedgerError {
                file: path.to_path_buf(),
                message: source.to_string(),
            });
            return Ok(());
        }
    };

    out.directives.extend(parsed.directives);
    for (name, value) in parsed.options {
        out.options.set(name, value);
    }
    out.errors.extend(parsed.errors.into_iter().map(|err| LedgerError {
        file: path.to_path_buf(),
        message: err.to_string(),
    }));

    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    for (include, _line) in parsed.includes {
        let target = if include.is_absolute() {
            include
        } else {
            base.join(include)
        };
        load_file(&target, false, visited, out)?;
    }
    Ok(())
}
