//! Filesystem storage: one JSON file per session.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::{Rng, distr::Alphanumeric};
use cookie::CookieJar;
use tracing::{debug, warn};

use super::SessionStorage;
use crate::error::{Error, Result};
use crate::record::SessionRecord;

/// Stores each session as `<key>.json` under a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `dir`. The directory is created on
    /// first write if it doesn't exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory records are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || !key.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// Delete every record whose deadlines have passed at `now`.
    ///
    /// Returns the number of files removed. Unreadable records are skipped.
    pub async fn purge_expired(&self, now: i64) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let record = match read_record(&path).await {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable session file");
                    continue;
                }
            };

            if record.is_expired(now) {
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => removed += 1,
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }

        debug!(dir = %self.dir.display(), removed, "Purged expired sessions");
        Ok(removed)
    }
}

/// Random suffix so concurrent writers never share a temp file.
fn tmp_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

async fn read_record(path: &Path) -> Result<Option<SessionRecord>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    async fn load(&self, key: &str, _jar: &CookieJar) -> Result<Option<SessionRecord>> {
        let path = self.path_for(key)?;
        match read_record(&path).await {
            Err(Error::Serialization(e)) => {
                warn!(path = %path.display(), error = %e, "Unparsable session file");
                Ok(None)
            }
            other => other,
        }
    }

    async fn write(&self, key: &str, record: &SessionRecord, _jar: &mut CookieJar) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_vec(record)?;
        let tmp = self.dir.join(format!("{key}.{}.tmp", tmp_suffix()));
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(path = %path.display(), "Wrote session file");
        Ok(())
    }

    async fn destroy(&self, key: &str, _jar: &mut CookieJar) -> Result<()> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
