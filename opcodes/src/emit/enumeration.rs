use std::fmt::Write;

use strum::EnumString;

use super::{check_identifier, EmitError, Emitter, Target};
use crate::table::OpcodeTable;

// Strict and reserved keywords; raw identifiers are deliberately not emitted.
const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "try", "gen",
];

/// Integer representation of the generated enum.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, EnumString, derive_more::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Repr {
    #[default]
    #[display("u8")]
    U8,
    #[display("u16")]
    U16,
    #[display("u32")]
    U32,
}

impl Repr {
    pub fn max_value(self) -> u32 {
        match self {
            Repr::U8 => u8::MAX as u32,
            Repr::U16 => u16::MAX as u32,
            Repr::U32 => u32::MAX,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RustEnumOptions {
    pub type_name: String,
    pub repr: Repr,
    pub derives: Vec<String>,
}

impl Default for RustEnumOptions {
    fn default() -> Self {
        Self {
            type_name: "Opcode".to_string(),
            repr: Repr::U8,
            derives: ["Copy", "Clone", "Eq", "PartialEq"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RustEnumOptions {
    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = name.into();
        self
    }

    pub fn with_repr(mut self, repr: Repr) -> Self {
        self.repr = repr;
        self
    }

    pub fn with_derives<I, S>(mut self, derives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.derives = derives.into_iter().map(Into::into).collect();
        self
    }
}

/// Emits a Rust enum binding every opcode name to its ordinal as an explicit discriminant.
#[derive(Clone, Debug, Default)]
pub struct RustEnumEmitter {
    pub options: RustEnumOptions,
}

impl RustEnumEmitter {
    pub fn new(options: RustEnumOptions) -> Self {
        Self { options }
    }
}

impl Emitter for RustEnumEmitter {
    fn target(&self) -> Target {
        Target::RustEnum
    }

    fn render(&self, table: &OpcodeTable) -> Result<String, EmitError> {
        let target = self.target();
        check_identifier(target, &self.options.type_name, RUST_KEYWORDS)?;
        for op in table {
            check_identifier(target, &op.name, RUST_KEYWORDS)?;
        }
        if let Some(max) = table.max_ordinal() {
            if max > self.options.repr.max_value() {
                return Err(EmitError::ReprOverflow {
                    target,
                    ordinal: max,
                    repr: self.options.repr,
                });
            }
        }

        let mut out = String::from("// @generated from the canonical opcode listing. Do not edit.\n\n");
        // A zero-variant enum cannot carry a `repr` attribute.
        if !table.is_empty() {
            let _ = writeln!(out, "#[repr({})]", self.options.repr);
        }
        if !self.options.derives.is_empty() {
            let _ = writeln!(out, "#[derive({})]", self.options.derives.join(", "));
        }
        let _ = writeln!(out, "pub enum {} {{", self.options.type_name);
        for op in table {
            let _ = writeln!(out, "    {} = {},", op.name, op.ordinal);
        }
        out.push_str("}\n");

        Ok(out)
    }
}
