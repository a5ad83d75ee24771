//! Line-region location and whole-file splicing.
//!
//! A directive owns its header line plus every immediately following line
//! that is indented (postings, metadata, continuations), stopping at the
//! first blank or non-indented line. All edits rewrite the whole file from a
//! line vector; nothing ever patches bytes in place.

use std::fs;
use std::path::{Path, PathBuf};

use beanjournal_core::Directive;

use crate::error::{JournalError, Result};

/// The contiguous line span a directive occupies, 1-based and inclusive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TextRegion {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

/// Computes the region owned by `directive` from its recorded source line.
///
/// Fails with [`JournalError::CannotLocate`] when the directive has no
/// source, or when its recorded line no longer exists in the file (stale
/// snapshot).
pub fn locate(directive: &Directive, id: &str) -> Result<TextRegion> {
    let source = directive
        .source()
        .ok_or_else(|| JournalError::CannotLocate(id.to_string()))?;
    let lines = read_lines(&source.file)?;
    if source.line == 0 || source.line > lines.len() {
        return Err(JournalError::CannotLocate(id.to_string()));
    }
    let start_idx = source.line - 1;
    Ok(TextRegion {
        file: source.file.clone(),
        start_line: source.line,
        end_line: block_end(&lines, start_idx) + 1,
    })
}

/// Index of the last line belonging to the block that starts at `start_idx`.
pub(crate) fn block_end(lines: &[String], start_idx: usize) -> usize {
    let mut end_idx = start_idx;
    while end_idx + 1 < lines.len() {
        let next = &lines[end_idx + 1];
        if next.trim().is_empty() || !next.starts_with([' ', '\t']) {
            break;
        }
        end_idx += 1;
    }
    end_idx
}

/// Replaces the region's lines with `replacement` (empty for a delete) and
/// writes the whole file back.
pub fn splice(region: &TextRegion, replacement: &[String]) -> Result<()> {
    let mut lines = read_lines(&region.file)?;
    if region.start_line == 0 || region.end_line > lines.len() {
        return Err(JournalError::Validation(format!(
            "region {}..{} is outside {} ({} lines)",
            region.start_line,
            region.end_line,
            region.file.display(),
            lines.len()
        )));
    }
    lines.splice(
        region.start_line - 1..region.end_line,
        replacement.iter().cloned(),
    );
    write_lines(&region.file, &lines)
}

/// Appends `text` to the end of the file, separated from existing content by
/// exactly one blank line.
pub fn append(path: &Path, text: &str) -> Result<()> {
    let mut content =
        fs::read_to_string(path).map_err(|e| JournalError::io(path, e))?;
    while content.ends_with('\n') {
        content.pop();
    }
    let content = if content.is_empty() {
        format!("{}\n", text)
    } else {
        format!("{}\n\n{}\n", content, text)
    };
    fs::write(path, content).map_err(|e| JournalError::io(path, e))
}

/// Splitting on `\n` keeps a trailing empty element for files ending in a
/// newline, so join reproduces the file byte for byte.
pub(crate) fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| JournalError::io(path, e))?;
    Ok(content.split('\n').map(str::to_string).collect())
}

pub(crate) fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    fs::write(path, lines.join("\n")).map_err(|e| JournalError::io(path, e))
}
