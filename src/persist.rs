use std::{fs, io, path::Path};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::SyncResult;

/// Reads a JSON document, `None` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> SyncResult<Option<T>> {
    let contents = match fs::read(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    Ok(Some(serde_json::from_slice(&contents)?))
}

/// Writes a JSON document next to `path` first and renames it over the target,
/// so readers never observe a half written file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> SyncResult<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path_suffix = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let mut temporary_file = path.as_os_str().to_owned();
    temporary_file.push(format!("_tmp_{tmp_path_suffix}"));

    let contents = serde_json::to_vec_pretty(value)?;

    fs::write(&temporary_file, contents)?;
    if let Err(err) = fs::rename(&temporary_file, path) {
        let _ = fs::remove_file(&temporary_file);
        return Err(err.into());
    }

    Ok(())
}

/// Removes a file, treating a missing file as success.
pub fn remove_file(path: &Path) -> SyncResult<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use claims::{assert_none, assert_ok};
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();

        let value: Option<serde_json::Value> = read_json(&dir.path().join("absent.json")).unwrap();

        assert_none!(value);
    }

    #[test]
    fn atomic_write_creates_parents_and_leaves_no_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        assert_ok!(write_json_atomic(&path, &json!({ "a": 1 })));

        let value: serde_json::Value = read_json(&path).unwrap().unwrap();
        assert_eq!(value, json!({ "a": 1 }));
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        write_json_atomic(&path, &json!([])).unwrap();

        assert_ok!(remove_file(&path));
        assert_ok!(remove_file(&path));
        assert!(!path.exists());
    }
}
