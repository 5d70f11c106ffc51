//! Flat-file persistence of the live set.
//!
//! The cache file holds one address per line. It seeds the live set at
//! startup, is the refresh source in cache-only mode, and is rewritten after
//! every successful network refresh. Caching is switched off by passing no
//! path (or an empty one).

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::metadata::UpdateMetadata;
use crate::{IpSet, Result};

/// Treat an empty path the same as no path.
fn configured(path: Option<&Path>) -> Option<&Path> {
    path.filter(|p| !p.as_os_str().is_empty())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write the set to the cache file, replacing its previous contents.
///
/// Does nothing when caching is disabled. Failures are logged and swallowed
/// so they never hold up a refresh.
pub fn write(set: &IpSet, path: Option<&Path>) {
    let Some(path) = configured(path) else {
        return;
    };

    match write_file(set, path) {
        Ok(()) => log::debug!("Wrote {} addresses to cache {:?}", set.len(), path),
        Err(e) => log::warn!("Failed to write cache file {:?}: {}", path, e),
    }
}

fn write_file(set: &IpSet, path: &Path) -> Result<()> {
    let temp = temp_path(path);

    let mut file = fs::File::create(&temp)?;
    file.write_all(set.to_lines().as_bytes())?;
    file.sync_all()?;
    drop(file);

    // Atomic rename
    fs::rename(&temp, path)?;
    Ok(())
}

/// Read the cache file.
///
/// Returns the parsed set and whether a file was actually read. A missing or
/// unreadable file (or disabled caching) yields an empty set and `false`; an
/// empty file yields an empty set and `true`.
pub fn read(path: Option<&Path>) -> (IpSet, bool) {
    let Some(path) = configured(path) else {
        return (IpSet::new(), false);
    };

    match fs::read(path) {
        Ok(data) => (IpSet::parse_bytes(&data), true),
        Err(e) => {
            log::debug!("Cache file {:?} not readable: {}", path, e);
            (IpSet::new(), false)
        }
    }
}

/// Record a successful refresh next to the cache file.
pub fn write_metadata(set: &IpSet, path: Option<&Path>) {
    let Some(path) = configured(path) else {
        return;
    };

    let meta_path = UpdateMetadata::path_for(path);
    if let Err(e) = UpdateMetadata::now(set.len()).save(&meta_path) {
        log::warn!("Failed to write cache metadata {:?}: {}", meta_path, e);
    }
}

/// Load the refresh metadata that belongs to a cache file.
pub fn read_metadata(path: Option<&Path>) -> Option<UpdateMetadata> {
    let path = configured(path)?;
    UpdateMetadata::load(UpdateMetadata::path_for(path)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tor.txt");
        let set = IpSet::parse("1.2.3.4 2001:db8::1 10.0.0.1");

        write(&set, Some(&path));
        let (loaded, found) = read(Some(&path));

        assert!(found);
        assert_eq!(loaded, set);
    }

    #[test]
    fn test_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tor.txt");
        write(&IpSet::parse("9.9.9.9 5.6.7.8"), Some(&path));

        assert_eq!(fs::read_to_string(&path).unwrap(), "5.6.7.8\n9.9.9.9\n");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tor.txt");
        write(&IpSet::parse("1.1.1.1 2.2.2.2"), Some(&path));
        write(&IpSet::parse("3.3.3.3"), Some(&path));

        let (loaded, _) = read(Some(&path));
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("3.3.3.3"));
    }

    #[test]
    fn test_disabled_path() {
        write(&IpSet::parse("1.1.1.1"), None);
        write(&IpSet::parse("1.1.1.1"), Some(Path::new("")));

        let (set, found) = read(None);
        assert!(!found);
        assert!(set.is_empty());

        let (_, found) = read(Some(Path::new("")));
        assert!(!found);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let (set, found) = read(Some(&dir.path().join("absent.txt")));
        assert!(!found);
        assert!(set.is_empty());
    }

    #[test]
    fn test_empty_file_is_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "").unwrap();

        let (set, found) = read(Some(&path));
        assert!(found);
        assert!(set.is_empty());
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tor.txt");
        fs::write(&path, "10.0.0.1\n# comment\nnope\n  10.0.0.2  \n").unwrap();

        let (set, found) = read(Some(&path));
        assert!(found);
        assert_eq!(set.len(), 2);
        assert!(set.contains("10.0.0.2"));
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("tor.txt");
        write(&IpSet::parse("1.1.1.1"), Some(&path));
        assert!(!path.exists());
    }

    #[test]
    fn test_metadata_sidecar() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tor.txt");
        assert!(read_metadata(Some(&path)).unwrap().last_updated.is_none());

        write_metadata(&IpSet::parse("1.1.1.1 2.2.2.2"), Some(&path));
        let meta = read_metadata(Some(&path)).unwrap();
        assert!(meta.last_updated.is_some());
        assert_eq!(meta.ip_count, 2);

        assert!(read_metadata(None).is_none());
    }
}
