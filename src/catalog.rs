use crate::config::MAX_FILES;
use crate::storage::Storage;

/// Names of recallable files, in directory scan order.
#[derive(Debug)]
pub struct FileCatalog {
    names: Vec<String>,
}

impl Default for FileCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl FileCatalog {
    pub fn new() -> Self {
        FileCatalog {
            names: Vec::with_capacity(MAX_FILES),
        }
    }

    /// Rebuild from the storage root, keeping regular files whose name ends
    /// in `suffix` (ignoring case). Matches past `MAX_FILES` are dropped.
    pub fn rescan(&mut self, storage: &dyn Storage, suffix: &str) {
        self.names.clear();

        let entries = match storage.entries() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("directory scan failed: {e}");
                return;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("directory scan stopped: {e}");
                    break;
                }
            };
            if entry.is_file && has_suffix(&entry.name, suffix) {
                self.names.push(entry.name);
                if self.names.len() == MAX_FILES {
                    break;
                }
            }
        }
        log::debug!("catalog: {:?}", self.names);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

fn has_suffix(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}
