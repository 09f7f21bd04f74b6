use std::collections::HashMap;

use derive_more::Display;
use serde::Serialize;

/// A single opcode: its name and the ordinal it was assigned in the canonical source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, Serialize)]
#[display("{name} = {ordinal}")]
pub struct Opcode {
    pub name: String,
    pub ordinal: u32,
}

/// The ordered, validated opcode list every emitter renders from.
///
/// Ordinals are assigned here and nowhere else: they are dense, start at zero
/// and follow the order in which names were handed to [`OpcodeTable::from_names`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OpcodeTable {
    opcodes: Vec<Opcode>,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("opcode #{position} has an empty name")]
    EmptyName { position: usize },
    #[error("opcode name {name:?} contains whitespace")]
    InvalidName { name: String },
    #[error("opcode {name} is defined twice (ordinals {first} and {second})")]
    DuplicateName { name: String, first: u32, second: u32 },
    #[error("too many opcodes: ordinal {0} does not fit in u32")]
    TooMany(usize),
}

impl OpcodeTable {
    pub fn from_names<I, S>(names: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut opcodes = Vec::new();
        let mut seen: HashMap<String, u32> = HashMap::new();

        for (position, name) in names.into_iter().enumerate() {
            let name = name.into();
            if name.is_empty() {
                return Err(TableError::EmptyName { position });
            }
            if name.chars().any(char::is_whitespace) {
                return Err(TableError::InvalidName { name });
            }
            let ordinal = u32::try_from(position).map_err(|_| TableError::TooMany(position))?;
            if let Some(&first) = seen.get(&name) {
                return Err(TableError::DuplicateName {
                    name,
                    first,
                    second: ordinal,
                });
            }
            seen.insert(name.clone(), ordinal);
            opcodes.push(Opcode { name, ordinal });
        }

        Ok(Self { opcodes })
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Opcode> {
        self.opcodes.iter()
    }

    pub fn get(&self, ordinal: u32) -> Option<&Opcode> {
        self.opcodes.get(ordinal as usize)
    }

    pub fn ordinal_of(&self, name: &str) -> Option<u32> {
        self.opcodes
            .iter()
            .find(|op| op.name == name)
            .map(|op| op.ordinal)
    }

    /// Largest assigned ordinal, `None` for an empty table.
    pub fn max_ordinal(&self) -> Option<u32> {
        self.opcodes.last().map(|op| op.ordinal)
    }

    /// Display name for a raw opcode value, with the same fallback the
    /// generated dispatch function uses.
    pub fn display_name(&self, value: u32) -> &str {
        self.get(value)
            .map(|op| op.name.as_str())
            .unwrap_or(crate::UNKNOWN_NAME)
    }
}

impl<'a> IntoIterator for &'a OpcodeTable {
    type Item = &'a Opcode;
    type IntoIter = std::slice::Iter<'a, Opcode>;

    fn into_iter(self) -> Self::IntoIter {
        self.opcodes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_follow_input_order() {
        let table = OpcodeTable::from_names(["Nop", "Unreachable", "Select"]).unwrap();
        let pairs: Vec<_> = table.iter().map(|op| (op.name.as_str(), op.ordinal)).collect();
        assert_eq!(pairs, vec![("Nop", 0), ("Unreachable", 1), ("Select", 2)]);
        assert_eq!(table.max_ordinal(), Some(2));
        assert_eq!(table.ordinal_of("Select"), Some(2));
        assert_eq!(table.ordinal_of("I32Add"), None);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = OpcodeTable::from_names(["Nop", "Call", "Nop"]).unwrap_err();
        assert_eq!(
            err,
            TableError::DuplicateName {
                name: "Nop".to_string(),
                first: 0,
                second: 2,
            }
        );
    }

    #[test]
    fn empty_and_spaced_names_are_rejected() {
        assert_eq!(
            OpcodeTable::from_names(["Nop", ""]).unwrap_err(),
            TableError::EmptyName { position: 1 }
        );
        assert!(matches!(
            OpcodeTable::from_names(["I32 Add"]).unwrap_err(),
            TableError::InvalidName { .. }
        ));
    }

    #[test]
    fn display_name_falls_back_to_unknown() {
        let table = OpcodeTable::from_names(["Nop", "Jmp"]).unwrap();
        assert_eq!(table.display_name(1), "Jmp");
        assert_eq!(table.display_name(2), "Unknown");
        assert_eq!(table.get(1).unwrap().to_string(), "Jmp = 1");
    }

    #[test]
    fn table_serializes_as_a_list() {
        let table = OpcodeTable::from_names(["Nop"]).unwrap();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(json, r#"[{"name":"Nop","ordinal":0}]"#);
    }
}
