use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Lists the regular files directly inside `dir` whose name ends with `suffix`,
/// sorted so that reports are reproducible.
pub fn discover(dir: &Path, suffix: &str) -> io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let matches = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(suffix));
        if matches && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}
