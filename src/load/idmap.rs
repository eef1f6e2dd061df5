//! Persisted old-id to new-id correspondence between two orgs.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::LoadError;

/// Flat id-map. Keys and values are opaque; the last insert for a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdMap {
    entries: BTreeMap<String, String>,
}

impl IdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// The mapped value, or `value` itself when it is not a key.
    pub fn apply<'a>(&'a self, value: &'a str) -> &'a str {
        self.get(value).unwrap_or(value)
    }

    pub fn insert(&mut self, old: impl Into<String>, new: impl Into<String>) -> Option<String> {
        self.entries.insert(old.into(), new.into())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// New-id to old-id view. When two keys share a value the later key wins.
    pub fn reverse(&self) -> IdMap {
        let entries = self
            .entries
            .iter()
            .map(|(k, v)| (v.clone(), k.clone()))
            .collect();
        IdMap { entries }
    }

    /// Entries ordered for substring replacement: longest key first, then
    /// lexicographic, so a key never pre-empts a longer key containing it.
    pub fn replacement_order(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self.iter().filter(|(k, _)| !k.is_empty()).collect();
        pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
        pairs
    }

    /// Parse a JSON object. Any read or parse failure yields an empty map.
    pub fn load(path: &Path) -> Self {
        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| {
                serde_json::from_str::<IdMap>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(map) => {
                debug!("Loaded {} id-map entries from {:?}", map.len(), path);
                map
            }
            Err(e) => {
                warn!("Failed to load id-map {:?}: {}", path, e);
                println!(
                    "Failed to load ID-Map file: {} will create new file at the end",
                    path.display()
                );
                IdMap::new()
            }
        }
    }

    /// Overwrite `path` with the pretty-printed map via a same-directory
    /// temp file and rename.
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        let io_err = |source: std::io::Error| LoadError::IdMapIo {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io_err(std::io::Error::other(e)))?;

        let mut temp = NamedTempFile::new_in(&parent).map_err(io_err)?;
        temp.write_all(content.as_bytes()).map_err(io_err)?;
        temp.write_all(b"\n").map_err(io_err)?;
        temp.flush().map_err(io_err)?;
        temp.persist(path).map_err(|e| io_err(e.error))?;

        info!("Saved {} id-map entries to {:?}", self.len(), path);
        Ok(())
    }
}

impl FromIterator<(String, String)> for IdMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        IdMap {
            entries: iter.into_iter().collect(),
        }
    }
}

/// An id-map bound to the file it was loaded from.
#[derive(Debug)]
pub struct IdMapFile {
    path: PathBuf,
    map: IdMap,
}

impl IdMapFile {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = IdMap::load(&path);
        Self { path, map }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn map(&self) -> &IdMap {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut IdMap {
        &mut self.map
    }

    pub fn save(&self) -> Result<(), LoadError> {
        self.map.save(&self.path)
    }
}
