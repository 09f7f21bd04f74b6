//! Renderers from an [`OpcodeTable`] to generated source files.
//!
//! Emitters never assign ordinals themselves; the value written next to a
//! name is always the one stored in the table.

use strum::{EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::table::OpcodeTable;

mod dispatch;
mod enumeration;

pub use dispatch::{GoDispatchEmitter, GoDispatchOptions};
pub use enumeration::{Repr, RustEnumEmitter, RustEnumOptions};

/// Every representation the table can be rendered to.
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
    derive_more::Display,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Target {
    /// `#[repr(..)]` Rust enum with explicit discriminants.
    #[display("rust-enum")]
    RustEnum,
    /// Go `String()` method switching over every opcode.
    #[display("go-dispatch")]
    GoDispatch,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("{target}: opcode {name:?} is not a legal identifier")]
    IllegalIdentifier { target: Target, name: String },
    #[error("{target}: {name:?} is a reserved keyword")]
    Keyword { target: Target, name: String },
    #[error("{target}: opcode {name:?} collides with an identifier of the generated code")]
    Collision { target: Target, name: String },
    #[error("{target}: ordinal {ordinal} does not fit in {repr}")]
    ReprOverflow {
        target: Target,
        ordinal: u32,
        repr: Repr,
    },
}

pub trait Emitter {
    fn target(&self) -> Target;

    fn render(&self, table: &OpcodeTable) -> Result<String, EmitError>;
}

/// Builds the default emitter for a target.
pub fn emitter_for(target: Target) -> Box<dyn Emitter> {
    match target {
        Target::RustEnum => Box::new(RustEnumEmitter::default()),
        Target::GoDispatch => Box::new(GoDispatchEmitter::default()),
    }
}

/// ASCII identifier: a letter or underscore, then letters, digits or underscores.
/// A lone `_` is not an identifier in either target.
fn is_ascii_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    name != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_identifier(target: Target, name: &str, keywords: &[&str]) -> Result<(), EmitError> {
    if !is_ascii_identifier(name) {
        return Err(EmitError::IllegalIdentifier {
            target,
            name: name.to_string(),
        });
    }
    if keywords.contains(&name) {
        return Err(EmitError::Keyword {
            target,
            name: name.to_string(),
        });
    }
    Ok(())
}
