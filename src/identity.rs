//! Stable entry identifiers.
//!
//! An entry's id is a SHA-256 digest over its kind tag and canonical rendered
//! text. The rendered text carries every semantic field and all user
//! metadata but never the source location, so editing one part of a file
//! does not change the ids of entries elsewhere in it. Two entries with
//! identical semantic content share an id; callers that need to tell such
//! twins apart must disambiguate some other way.

use sha2::{Digest, Sha256};

use beanjournal_core::Directive;
use beanjournal_render::render_directive;

use crate::error::Result;

/// Hex SHA-256 identity of a directive's semantic content.
pub fn entry_id(directive: &Directive) -> Result<String> {
    let text = render_directive(directive)?;
    let mut hasher = Sha256::new();
    hasher.update(directive.kind().as_str().as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}
