use std::fmt::Write;

use super::{check_identifier, EmitError, Emitter, Target};
use crate::{table::OpcodeTable, UNKNOWN_NAME};

const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoDispatchOptions {
    pub package: String,
    pub type_name: String,
    pub receiver: String,
}

impl Default for GoDispatchOptions {
    fn default() -> Self {
        Self {
            package: "opcodes".to_string(),
            type_name: "Opcode".to_string(),
            receiver: "op".to_string(),
        }
    }
}

impl GoDispatchOptions {
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_type_name(mut self, name: impl Into<String>) -> Self {
        self.type_name = name.into();
        self
    }
}

/// Emits `func (op Opcode) String() string`, one `case` per opcode and a
/// trailing `"Unknown"` for any value the switch does not cover.
#[derive(Clone, Debug, Default)]
pub struct GoDispatchEmitter {
    pub options: GoDispatchOptions,
}

impl GoDispatchEmitter {
    pub fn new(options: GoDispatchOptions) -> Self {
        Self { options }
    }
}

impl Emitter for GoDispatchEmitter {
    fn target(&self) -> Target {
        Target::GoDispatch
    }

    fn render(&self, table: &OpcodeTable) -> Result<String, EmitError> {
        let target = self.target();
        let GoDispatchOptions {
            package,
            type_name,
            receiver,
        } = &self.options;
        for ident in [package, type_name, receiver] {
            check_identifier(target, ident, GO_KEYWORDS)?;
        }
        for op in table {
            check_identifier(target, &op.name, GO_KEYWORDS)?;
            // A case named after the receiver would match every value.
            if [package, type_name, receiver].contains(&&op.name) {
                return Err(EmitError::Collision {
                    target,
                    name: op.name.clone(),
                });
            }
        }

        let mut out = String::new();
        out.push_str("// Code generated from the canonical opcode listing. DO NOT EDIT.\n\n");
        let _ = writeln!(out, "package {package}\n");
        let _ = writeln!(out, "func ({receiver} {type_name}) String() string {{");
        let _ = writeln!(out, "\tswitch {receiver} {{");
        for op in table {
            let _ = writeln!(out, "\tcase {}:", op.name);
            let _ = writeln!(out, "\t\treturn \"{}\"", op.name);
        }
        out.push_str("\t}\n");
        let _ = writeln!(out, "\treturn \"{UNKNOWN_NAME}\"");
        out.push_str("}\n");

        Ok(out)
    }
}
