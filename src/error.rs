use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, JournalError>;

/// Everything that can go wrong while querying or mutating a journal.
#[derive(Debug, Error)]
pub enum JournalError {
    /// The primary ledger file could not be loaded at all. The previous
    /// snapshot, if any, stays readable.
    #[error("failed to load ledger: {0}")]
    Load(#[from] beanjournal_parser::LoadError),

    /// Identity lookup miss on update or delete. No file was touched.
    #[error("no entry with id '{0}'")]
    NotFound(String),

    /// The entry has no usable source location, so its line region cannot be
    /// computed. Update paths recover by appending; delete paths surface
    /// this.
    #[error("cannot locate entry '{0}' in its source file")]
    CannotLocate(String),

    /// An edit payload failed validation before any write was attempted.
    #[error("invalid entry payload: {0}")]
    Validation(String),

    #[error("failed to render entry text")]
    Render(#[from] beanjournal_render::BasicRendererError),

    #[error("i/o error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JournalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JournalError::Io {
            path: path.into(),
            source,
        }
    }
}
