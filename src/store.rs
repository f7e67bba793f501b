use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use crate::{error::FeedError, filter::SessionFilter, record::AttendanceRecord};

/// All records live in one JSON file, the whole array rewritten on every
/// append. Fine at attendance scale.
///
/// Appends come straight from per-connection server tasks, so the
/// load-modify-save cycle is serialized by an internal lock. Reads stay
/// lock-free: the rename in `save` is atomic, a reader sees the old file or
/// the new one, never a torn write.
pub struct RecordStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// A missing file reads as an empty list; an unreadable one is an error.
    pub fn load(&self) -> Result<Vec<AttendanceRecord>, FeedError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| FeedError::CorruptStore {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn append(&self, record: &AttendanceRecord) -> Result<(), FeedError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut records = self.load()?;
        records.push(record.clone());
        self.save(&records)
    }

    pub fn query(&self, filter: &SessionFilter) -> Result<Vec<AttendanceRecord>, FeedError> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|record| filter.accepts(record))
            .collect())
    }

    fn save(&self, records: &[AttendanceRecord]) -> Result<(), FeedError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let raw = serde_json::to_string_pretty(records)
            .map_err(|e| FeedError::InvalidMessage(e.to_string()))?;

        // write to a sibling, then rename over the target so a crash mid-write
        // never leaves a half-written store
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
