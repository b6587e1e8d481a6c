//! JSON file persistence shared by the raw log and the job store.
//!
//! Files are always rewritten in full: the new content goes to a temporary
//! file in the same directory which is then renamed over the target.

use jobfeed_common::{JobfeedError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::io::Write;
use std::path::Path;

/// Read a JSON document.
///
/// Returns `Ok(None)` when the file does not exist and
/// [`JobfeedError::CorruptState`] when it exists but cannot be read or parsed.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let corrupt = |reason: String| JobfeedError::CorruptState {
        path: path.to_path_buf(),
        reason,
    };

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(corrupt(e.to_string())),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| corrupt(e.to_string()))
}

/// Replace the file at `path` with `value` as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;

    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(body.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
