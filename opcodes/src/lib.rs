//! Opcode table synchronization.
//!
//! The Go listing of `Opcode` constants is the single source of truth. It is
//! parsed once into an [`OpcodeTable`], and every generated representation is
//! rendered from that same in-memory table, so the numeric value of a name is
//! identical in all of them.

pub mod emit;
pub mod source;
pub mod sync;
pub mod table;


pub use emit::{Emitter, EmitError, Target};
pub use source::{parse_canonical, parse_with, Markers, SourceError};
pub use sync::{sync_outputs, Output, SyncError, SyncMode, SyncOutcome, SyncStatus};
pub use table::{Opcode, OpcodeTable, TableError};

/// Display name for any opcode value that has no entry in the table.
pub const UNKNOWN_NAME: &str = "Unknown";
