//! Small async file helpers shared by the store and the host.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;

use crate::{CoreError, CoreResult};

/// Writes pretty JSON to a fresh sibling temp file, then renames it into place.
///
/// A reader sees either the old file or the new one, never half of each.
/// Every call gets its own temp file, so concurrent writers to one path
/// cannot write into each other's content.
pub(crate) async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let content = serde_json::to_string_pretty(value)?;
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || persist_atomic(&path, content.as_bytes()))
        .await
        .map_err(io::Error::other)??;
    Ok(())
}

fn persist_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let mut tmp = NamedTempFile::new_in(&parent)?;
    tmp.write_all(content)?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Reads a JSON file; a missing file is `NotFound`.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> CoreResult<T> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            Err(CoreError::NotFound(path.display().to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

/// Deletes a file if it exists.
pub(crate) async fn remove_if_exists(path: &Path) -> CoreResult<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_concurrent_writes_to_one_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("theme.json");

        let writes = (0..16).map(|n| {
            let path = path.clone();
            tokio::spawn(async move { write_json_atomic(&path, &json!({ "writer": n })).await })
        });
        for write in writes.collect::<Vec<_>>() {
            write.await.unwrap().unwrap();
        }

        let written: Value = read_json(&path).await.unwrap();
        assert!(written["writer"].as_u64().is_some_and(|n| n < 16));

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "no temp files are left behind");
    }

    #[tokio::test]
    async fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store").join("versions").join("001.json");
        write_json_atomic(&path, &json!({ "a": 1 })).await.unwrap();
        let read: Value = read_json(&path).await.unwrap();
        assert_eq!(read, json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result: CoreResult<Value> = read_json(&dir.path().join("absent.json")).await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
        remove_if_exists(&dir.path().join("absent.json")).await.unwrap();
    }
}
