use log::debug;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{ListError, Result};
use crate::store::FilterStateStore;

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct JsonFileFilterStore {
    dir: PathBuf,
}

impl JsonFileFilterStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a key.
    ///
    /// ASCII letters, digits and `-` are kept; every other byte becomes `_`
    /// plus two hex digits, so distinct keys never share a file.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_name.push(char::from(byte));
            } else {
                file_name.push('_');
                file_name.push_str(&hex::encode([byte]));
            }
        }
        self.dir.join(format!("{}.json", file_name))
    }
}

#[async_trait::async_trait]
impl FilterStateStore for JsonFileFilterStore {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ListError::store(key, e)),
        };
        let state = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    async fn save(&self, key: &str, state: &Value) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ListError::store(key, e))?;

        // Write next to the target and rename so readers never see a partial file
        let path = self.path_for(key);
        let tmp_path = path.with_extension("json.tmp");
        let content = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&tmp_path, content)
            .await
            .map_err(|e| ListError::store(key, e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| ListError::store(key, e))?;

        debug!("Saved filter state '{}' to {}", key, path.display());
        Ok(())
    }
}
