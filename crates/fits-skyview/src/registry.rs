//! Process-wide map from image identifier to its coordinate mapping.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::wcs::WcsMapper;

/// What a point query needs to know about one ingested image.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub mapper: WcsMapper,
    /// Height of the rendered image (NAXIS2).
    pub rows: usize,
}

/// Shared registry of ingested images.
///
/// Entries are immutable once stored; a later `put` under the same
/// identifier replaces the entry as a whole.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    entries: RwLock<HashMap<String, Arc<SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the mapping for `id`, returning the entry it replaced.
    pub fn put(&self, id: &str, mapper: WcsMapper, rows: usize) -> Option<Arc<SessionEntry>> {
        let entry = Arc::new(SessionEntry { mapper, rows });
        let previous = self.entries.write().insert(id.to_string(), entry);
        debug!(
            "registered {id:?} ({rows} rows){}",
            if previous.is_some() { ", replacing previous entry" } else { "" }
        );
        previous
    }

    /// Entry for `id`, or [`Error::UnknownImage`].
    pub fn get(&self, id: &str) -> Result<Arc<SessionEntry>> {
        self.entries
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownImage(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<SessionEntry>> {
        self.entries.write().remove(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn mapper(lon: f64) -> WcsMapper {
        WcsMapper::new([1.0, 1.0], [lon, 0.0], [[-0.001, 0.0], [0.0, 0.001]]).unwrap()
    }

    #[test]
    fn put_then_get() {
        let reg = SessionRegistry::new();
        assert!(reg.is_empty());
        assert!(reg.put("a.fits", mapper(10.0), 50).is_none());
        let entry = reg.get("a.fits").unwrap();
        assert_eq!(entry.rows, 50);
        assert_eq!(entry.mapper.crval, [10.0, 0.0]);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_identifier() {
        let reg = SessionRegistry::new();
        match reg.get("never.fits") {
            Err(Error::UnknownImage(id)) => assert_eq!(id, "never.fits"),
            other => panic!("expected UnknownImage, got {other:?}"),
        }
    }

    #[test]
    fn replace_keeps_old_readers_valid() {
        let reg = SessionRegistry::new();
        reg.put("x", mapper(1.0), 10);
        let held = reg.get("x").unwrap();
        let previous = reg.put("x", mapper(2.0), 20).unwrap();
        assert_eq!(previous.rows, 10);
        assert_eq!(held.rows, 10);
        assert_eq!(reg.get("x").unwrap().rows, 20);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn remove_entry() {
        let reg = SessionRegistry::new();
        reg.put("x", mapper(1.0), 10);
        assert!(reg.contains("x"));
        assert!(reg.remove("x").is_some());
        assert!(!reg.contains("x"));
        assert!(reg.remove("x").is_none());
    }

    #[test]
    fn same_id_readers_never_see_mixed_entries() {
        let reg = Arc::new(SessionRegistry::new());
        reg.put("shared", mapper(1.0), 1);

        let writers: Vec<_> = (0..4usize)
            .map(|t| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for i in 1..=500 {
                        let k = t * 1000 + i;
                        reg.put("shared", mapper(k as f64), k);
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for _ in 0..2000 {
                        let entry = reg.get("shared").unwrap();
                        assert_eq!(entry.mapper.crval[0] as usize, entry.rows);
                    }
                })
            })
            .collect();
        for h in writers.into_iter().chain(readers) {
            h.join().unwrap();
        }
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let reg = Arc::new(SessionRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for i in 0..50 {
                        let id = format!("img-{t}-{i}");
                        reg.put(&id, mapper(i as f64), i + 1);
                        assert_eq!(reg.get(&id).unwrap().rows, i + 1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(reg.len(), 400);
    }
}
