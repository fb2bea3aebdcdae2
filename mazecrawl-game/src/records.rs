//! Best completion time per difficulty, persisted through a key-value store.
//!
//! Each tier is stored under its tag (`easy`, `normal`, `hard`) as a decimal
//! millisecond count. An absent key means no record yet.
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::constants::{LOG_TARGET_RECORDS, NO_RECORD_LABEL};
use crate::difficulty::Difficulty;
use crate::numbers::duration_to_millis;

/// String key-value persistence, mirroring browser-style local storage.
pub trait KeyValueStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error>;
}

/// In-process store; nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("best-time file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("best-time file is not a JSON object of strings: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON object file of `key -> value` strings, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns `FileStoreError` if the file exists but cannot be read or
    /// parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, FileStoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), FileStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    type Error = FileStoreError;

    fn get(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Self::Error> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

#[derive(Debug, Error)]
pub enum RecordError<E>
where
    E: std::error::Error + 'static,
{
    #[error("best-time storage failed: {0}")]
    Storage(#[source] E),
    #[error("stored best time for {key} is not a millisecond count: {value:?}")]
    Corrupt { key: String, value: String },
}

/// Answer to [`BestTimeStore::record_if_best`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub is_new_record: bool,
    /// Best time after the call: the new time on a record, the prior best
    /// otherwise.
    pub best: Duration,
}

/// Best-time bookkeeping over an injected [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct BestTimeStore<S> {
    store: S,
}

impl<S: KeyValueStore> BestTimeStore<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Best time for `difficulty`, or `None` when no record exists.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Storage` when the store fails and
    /// `RecordError::Corrupt` when the stored value is not a millisecond
    /// count.
    pub fn get_best(
        &self,
        difficulty: Difficulty,
    ) -> Result<Option<Duration>, RecordError<S::Error>> {
        let key = difficulty.as_str();
        let Some(raw) = self.store.get(key).map_err(RecordError::Storage)? else {
            return Ok(None);
        };
        raw.trim()
            .parse::<u64>()
            .map(|ms| Some(Duration::from_millis(ms)))
            .map_err(|_| RecordError::Corrupt {
                key: key.to_string(),
                value: raw,
            })
    }

    /// Store `elapsed` if it beats the current best for `difficulty`.
    ///
    /// Times compare at millisecond resolution; a tie is not a record. A
    /// corrupt stored value is treated as no record and overwritten.
    ///
    /// # Errors
    ///
    /// Returns `RecordError::Storage` when the store cannot be read or
    /// written.
    pub fn record_if_best(
        &mut self,
        difficulty: Difficulty,
        elapsed: Duration,
    ) -> Result<RecordOutcome, RecordError<S::Error>> {
        let elapsed_ms = duration_to_millis(elapsed);
        let prior = match self.get_best(difficulty) {
            Ok(prior) => prior.map(duration_to_millis),
            Err(RecordError::Corrupt { key, value }) => {
                log::warn!(
                    target: LOG_TARGET_RECORDS,
                    "discarding unreadable best time {value:?} for {key}"
                );
                None
            }
            Err(err) => return Err(err),
        };

        match prior {
            Some(best_ms) if elapsed_ms >= best_ms => Ok(RecordOutcome {
                is_new_record: false,
                best: Duration::from_millis(best_ms),
            }),
            _ => {
                self.store
                    .set(difficulty.as_str(), &elapsed_ms.to_string())
                    .map_err(RecordError::Storage)?;
                log::info!(
                    target: LOG_TARGET_RECORDS,
                    "new {difficulty} best time {}",
                    format_time(Some(elapsed))
                );
                Ok(RecordOutcome {
                    is_new_record: true,
                    best: Duration::from_millis(elapsed_ms),
                })
            }
        }
    }
}

/// Render a best time as zero-padded `MM:SS`, or `--:--` with no record.
#[must_use]
pub fn format_time(time: Option<Duration>) -> String {
    time.map_or_else(
        || NO_RECORD_LABEL.to_string(),
        |time| {
            let secs = time.as_secs();
            format!("{:02}:{:02}", secs / 60, secs % 60)
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn record_sequence_keeps_strict_minimum() {
        let mut records = BestTimeStore::new(MemoryStore::new());
        let first = records.record_if_best(Difficulty::Normal, ms(5_000)).unwrap();
        assert!(first.is_new_record);
        assert_eq!(first.best, ms(5_000));

        let slower = records.record_if_best(Difficulty::Normal, ms(6_000)).unwrap();
        assert!(!slower.is_new_record);
        assert_eq!(slower.best, ms(5_000));

        let faster = records.record_if_best(Difficulty::Normal, ms(4_000)).unwrap();
        assert!(faster.is_new_record);
        assert_eq!(faster.best, ms(4_000));

        assert_eq!(records.get_best(Difficulty::Normal).unwrap(), Some(ms(4_000)));
    }

    #[test]
    fn ties_are_not_records() {
        let mut records = BestTimeStore::new(MemoryStore::new());
        records.record_if_best(Difficulty::Easy, ms(3_000)).unwrap();
        let tie = records.record_if_best(Difficulty::Easy, ms(3_000)).unwrap();
        assert!(!tie.is_new_record);
    }

    #[test]
    fn tiers_are_independent() {
        let mut records = BestTimeStore::new(MemoryStore::new());
        records.record_if_best(Difficulty::Hard, ms(90_000)).unwrap();
        assert_eq!(records.get_best(Difficulty::Easy).unwrap(), None);
        assert_eq!(records.store().get("hard").unwrap().as_deref(), Some("90000"));
    }

    #[test]
    fn corrupt_values_surface_on_read_and_heal_on_record() {
        let mut store = MemoryStore::new();
        store.set("easy", "soon").unwrap();
        let mut records = BestTimeStore::new(store);
        assert!(matches!(
            records.get_best(Difficulty::Easy),
            Err(RecordError::Corrupt { .. })
        ));
        let outcome = records.record_if_best(Difficulty::Easy, ms(12_345)).unwrap();
        assert!(outcome.is_new_record);
        assert_eq!(records.get_best(Difficulty::Easy).unwrap(), Some(ms(12_345)));
    }

    #[test]
    fn format_time_pads_minutes_and_seconds() {
        assert_eq!(format_time(None), "--:--");
        assert_eq!(format_time(Some(ms(0))), "00:00");
        assert_eq!(format_time(Some(ms(65_900))), "01:05");
        assert_eq!(format_time(Some(Duration::from_secs(3_600))), "60:00");
    }
}
