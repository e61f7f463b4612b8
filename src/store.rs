use std::fmt;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::EntityId;
use crate::error::GatherError;

/// Which of the three per-entity API payloads a cache file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheFunction {
    Details,
    FecSummary,
    Industries,
}

impl fmt::Display for CacheFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheFunction::Details => write!(f, "details"),
            CacheFunction::FecSummary => write!(f, "fec_summary"),
            CacheFunction::Industries => write!(f, "industries"),
        }
    }
}

/// Owns the cache and output layout: API payloads at
/// `cache/{entity}-{function}.json`, district files at
/// `{districts}/{KEY}.json`.
#[derive(Debug, Clone)]
pub struct Store {
    cache_root: Utf8PathBuf,
    districts_root: Utf8PathBuf,
}

impl Store {
    pub fn new(cache_root: Utf8PathBuf, districts_root: Utf8PathBuf) -> Self {
        Self {
            cache_root,
            districts_root,
        }
    }

    pub fn cache_root(&self) -> &Utf8Path {
        &self.cache_root
    }

    pub fn districts_root(&self) -> &Utf8Path {
        &self.districts_root
    }

    pub fn cache_path(&self, entity_id: &EntityId, function: CacheFunction) -> Utf8PathBuf {
        self.cache_root.join(format!("{entity_id}-{function}.json"))
    }

    pub fn cache_record_path(&self, entity_id: &EntityId, function: CacheFunction) -> Utf8PathBuf {
        self.cache_root
            .join(format!("{entity_id}-{function}.meta.json"))
    }

    pub fn district_path(&self, district_key: &str) -> Utf8PathBuf {
        self.districts_root.join(format!("{district_key}.json"))
    }

    /// Reads a cached payload, `None` when the file does not exist.
    pub fn read_cached(&self, path: &Utf8Path) -> Result<Option<Value>, GatherError> {
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| GatherError::Filesystem(format!("read {path}: {err}")))?;
        let value = serde_json::from_str(&content)
            .map_err(|err| GatherError::Filesystem(format!("parse cached {path}: {err}")))?;
        Ok(Some(value))
    }

    pub fn write_json(path: &Utf8Path, value: &impl Serialize) -> Result<(), GatherError> {
        let content = serde_json::to_vec_pretty(value)
            .map_err(|err| GatherError::Filesystem(err.to_string()))?;
        Self::write_bytes_atomic(path, &content)
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), GatherError> {
        let parent = path
            .parent()
            .ok_or_else(|| GatherError::Filesystem(format!("no parent directory for {path}")))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| GatherError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix(".race-gatherer")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| GatherError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), content).map_err(|err| GatherError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| GatherError::Filesystem(err.to_string()))?;
        Ok(())
    }

    /// Provenance sidecar written next to a freshly downloaded payload.
    pub fn write_cache_record(
        &self,
        entity_id: &EntityId,
        function: CacheFunction,
        url: &str,
    ) -> Result<(), GatherError> {
        let record = CacheRecord {
            entity_id: entity_id.to_string(),
            function: function.to_string(),
            url: url.to_string(),
            fetched_at: chrono::Utc::now().to_rfc3339(),
        };
        Self::write_json(&self.cache_record_path(entity_id, function), &record)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheRecord {
    pub entity_id: String,
    pub function: String,
    pub url: String,
    pub fetched_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new(
            Utf8PathBuf::from("cache"),
            Utf8PathBuf::from("data/districts"),
        );
        let id: EntityId = "4148b26f6f1c437cb50ea9ca4699417a".parse().unwrap();

        assert_eq!(
            store.cache_path(&id, CacheFunction::Details),
            Utf8PathBuf::from("cache/4148b26f6f1c437cb50ea9ca4699417a-details.json")
        );
        assert_eq!(
            store.cache_path(&id, CacheFunction::FecSummary),
            Utf8PathBuf::from("cache/4148b26f6f1c437cb50ea9ca4699417a-fec_summary.json")
        );
        assert_eq!(
            store.district_path("WY-at_large"),
            Utf8PathBuf::from("data/districts/WY-at_large.json")
        );
    }

    #[test]
    fn cached_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let store = Store::new(root.join("cache"), root.join("districts"));
        let id: EntityId = "aabb01".parse().unwrap();
        let path = store.cache_path(&id, CacheFunction::Details);

        assert!(store.read_cached(&path).unwrap().is_none());

        let payload = serde_json::json!({"metadata": {"entity": "aabb01"}});
        Store::write_json(&path, &payload).unwrap();
        let read = store.read_cached(&path).unwrap().unwrap();
        assert_eq!(read, payload);
    }
}
