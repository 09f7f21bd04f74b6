//! Reads the canonical opcode listing.
//!
//! The canonical source is the interpreter's Go definition of `Opcode`:
//!
//! ```text
//! const (
//!     Nop Opcode = iota
//!     Unreachable
//!     ...
//! )
//! ```
//!
//! Only the first bounded block is read. Each non-blank line contributes its
//! first whitespace-delimited token as an opcode name.

use crate::table::{OpcodeTable, TableError};

/// Textual conventions bounding the opcode block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Markers {
    /// Substring identifying the line that opens the block.
    pub start: String,
    /// Exact (trimmed) text of the line that closes the block.
    pub end: String,
    /// Lines inside the block starting with this prefix are skipped.
    pub comment: Option<String>,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            start: "const (".to_string(),
            end: ")".to_string(),
            comment: Some("//".to_string()),
        }
    }
}

impl Markers {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, prefix: impl Into<String>) -> Self {
        self.comment = Some(prefix.into());
        self
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("malformed source: no line contains the start marker {marker:?}")]
    MissingStart { marker: String },
    #[error("malformed source: block opened on line {line} is never closed by {marker:?}")]
    Unterminated { line: usize, marker: String },
    #[error(transparent)]
    Table(#[from] TableError),
}

impl SourceError {
    /// Both variants that mean the bounded region could not be located.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            SourceError::MissingStart { .. } | SourceError::Unterminated { .. }
        )
    }
}

/// Parses the canonical source with the default Go markers.
pub fn parse_canonical(text: &str) -> Result<OpcodeTable, SourceError> {
    parse_with(text, &Markers::default())
}

pub fn parse_with(text: &str, markers: &Markers) -> Result<OpcodeTable, SourceError> {
    let names = extract_names(text, markers)?;
    tracing::debug!(count = names.len(), "extracted opcode names");
    Ok(OpcodeTable::from_names(names)?)
}

/// Returns the opcode names of the bounded block, in source order.
pub fn extract_names<'a>(text: &'a str, markers: &Markers) -> Result<Vec<&'a str>, SourceError> {
    let mut lines = text.lines().enumerate();

    let start_line = lines
        .by_ref()
        .find(|(_, line)| line.contains(markers.start.as_str()))
        .map(|(idx, _)| idx + 1)
        .ok_or_else(|| SourceError::MissingStart {
            marker: markers.start.clone(),
        })?;

    let mut names = Vec::new();
    for (_, line) in lines {
        let line = line.trim();
        if line.starts_with(markers.end.as_str()) {
            return Ok(names);
        }
        let Some(name) = line.split_whitespace().next() else {
            continue;
        };
        if let Some(prefix) = &markers.comment {
            if name.starts_with(prefix.as_str()) {
                continue;
            }
        }
        names.push(name);
    }

    Err(SourceError::Unterminated {
        line: start_line,
        marker: markers.end.clone(),
    })
}
