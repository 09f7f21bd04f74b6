//! Keeps generated files on disk in step with the canonical table.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use derive_more::Display;

use crate::{
    emit::{EmitError, Emitter, Target},
    table::OpcodeTable,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SyncMode {
    /// Render and write every output whose contents differ.
    Write,
    /// Render and compare only; nothing is written.
    Check,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum SyncStatus {
    #[display("up to date")]
    Unchanged,
    #[display("written")]
    Written,
    #[display("stale")]
    Stale,
    #[display("missing")]
    Missing,
}

impl SyncStatus {
    pub fn is_drift(self) -> bool {
        matches!(self, SyncStatus::Stale | SyncStatus::Missing)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One generated file.
pub struct Output {
    pub emitter: Box<dyn Emitter>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub target: Target,
    pub path: PathBuf,
    pub status: SyncStatus,
}

/// Renders every output first, then writes or checks them, so an emitter
/// failure leaves every file untouched.
pub fn sync_outputs(
    table: &OpcodeTable,
    outputs: &[Output],
    mode: SyncMode,
) -> Result<Vec<SyncOutcome>, SyncError> {
    let rendered = outputs
        .iter()
        .map(|output| output.emitter.render(table))
        .collect::<Result<Vec<_>, _>>()?;

    outputs
        .iter()
        .zip(rendered)
        .map(|(output, contents)| -> Result<SyncOutcome, SyncError> {
            let status = sync_file(&output.path, &contents, mode)?;
            tracing::info!(
                output = %output.emitter.target(),
                path = %output.path.display(),
                %status,
                "synchronized output"
            );
            Ok(SyncOutcome {
                target: output.emitter.target(),
                path: output.path.clone(),
                status,
            })
        })
        .collect()
}

fn sync_file(path: &Path, contents: &str, mode: SyncMode) -> Result<SyncStatus, SyncError> {
    let io_err = |source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    };

    // Bytes, not text: a corrupt output must still be replaceable.
    let existing = match fs::read(path) {
        Ok(existing) => Some(existing),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(io_err(e)),
    };

    match (existing, mode) {
        (Some(existing), _) if existing == contents.as_bytes() => Ok(SyncStatus::Unchanged),
        (Some(_), SyncMode::Check) => Ok(SyncStatus::Stale),
        (None, SyncMode::Check) => Ok(SyncStatus::Missing),
        (_, SyncMode::Write) => {
            write_atomic(path, contents).map_err(io_err)?;
            Ok(SyncStatus::Written)
        }
    }
}

/// Writes through a sibling temporary file so readers never see a half-written output.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let mut tmp_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}
