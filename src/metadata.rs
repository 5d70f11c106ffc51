//! Sidecar metadata for the cache file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::error::Result;

/// Information about the last successful network refresh.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMetadata {
    #[serde(with = "system_time_serde")]
    pub last_updated: Option<SystemTime>,
    /// Number of addresses written with that refresh.
    #[serde(default)]
    pub ip_count: usize,
}

mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &Option<SystemTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => {
                let duration = t.duration_since(UNIX_EPOCH).unwrap_or_default();
                Some(duration.as_secs()).serialize(serializer)
            }
            None => None::<u64>.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<SystemTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(|s| UNIX_EPOCH + Duration::from_secs(s)))
    }
}

impl UpdateMetadata {
    /// Create metadata stamped with the current time.
    pub fn now(ip_count: usize) -> Self {
        Self {
            last_updated: Some(SystemTime::now()),
            ip_count,
        }
    }

    /// Path of the metadata file that belongs to a cache file.
    pub fn path_for(cache_file: &Path) -> PathBuf {
        let mut name = cache_file.as_os_str().to_owned();
        name.push(".meta");
        PathBuf::from(name)
    }

    /// Load metadata from a file.
    ///
    /// Returns default metadata if the file doesn't exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save metadata to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Time elapsed since the last refresh, if one is recorded.
    pub fn age(&self) -> Option<Duration> {
        self.last_updated
            .map(|last| SystemTime::now().duration_since(last).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_metadata_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tor.txt.meta");
        UpdateMetadata::now(42).save(&path).unwrap();

        let loaded = UpdateMetadata::load(&path).unwrap();
        assert!(loaded.last_updated.is_some());
        assert_eq!(loaded.ip_count, 42);
    }

    #[test]
    fn test_metadata_missing_file() {
        let loaded = UpdateMetadata::load("/nonexistent/path.meta").unwrap();
        assert!(loaded.last_updated.is_none());
        assert!(loaded.age().is_none());
    }

    #[test]
    fn test_metadata_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.meta");
        fs::write(&path, "{not json").unwrap();
        assert!(UpdateMetadata::load(&path).is_err());
    }

    #[test]
    fn test_metadata_age() {
        let meta = UpdateMetadata {
            last_updated: Some(SystemTime::now() - Duration::from_secs(120)),
            ip_count: 0,
        };
        assert!(meta.age().unwrap() >= Duration::from_secs(120));
    }

    #[test]
    fn test_path_for() {
        assert_eq!(
            UpdateMetadata::path_for(Path::new("/var/cache/tor.txt")),
            PathBuf::from("/var/cache/tor.txt.meta")
        );
    }
}
