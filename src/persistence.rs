use crate::dlog;
use crate::types::{Coordinates, EntryDetail, Workout, WorkoutEntry, WorkoutId};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Key under which the whole workout list is stored.
pub const STORAGE_KEY: &str = "workouts";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("serializing workouts: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Durable string-valued key/value store.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage. Lives as long as the value does.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.values.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory.
///
/// Writes go to a temp file in the same directory which is then renamed
/// over the target, so a crash never leaves a half-written value behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|source| StorageError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        tracing::info!(dir = %dir.display(), "using storage directory");
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || !key
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(StorageError::Unavailable(format!(
                "refusing unsafe storage key: {key:?}"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source: io::Error| StorageError::Io {
            path: path.clone(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        tmp.write_all(value.as_bytes()).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;
        dlog!("stored key={key} bytes={} path={}", value.len(), path.display());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// On-disk shape of one workout. Derived metrics are not stored; they are
/// recomputed when the record is turned back into a [`Workout`].
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWorkout {
    id: WorkoutId,
    created_at: DateTime<FixedOffset>,
    coordinates: Coordinates,
    distance_km: f64,
    duration_min: f64,
    #[serde(flatten)]
    detail: StoredDetail,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum StoredDetail {
    Running {
        #[serde(rename = "cadenceSpmPerMin")]
        cadence_spm: f64,
    },
    Cycling {
        #[serde(rename = "elevationGainM")]
        elevation_gain_m: f64,
    },
}

impl From<&Workout> for StoredWorkout {
    fn from(w: &Workout) -> Self {
        let entry = w.entry();
        let detail = match entry.detail {
            EntryDetail::Running { cadence_spm } => StoredDetail::Running { cadence_spm },
            EntryDetail::Cycling { elevation_gain_m } => StoredDetail::Cycling { elevation_gain_m },
        };
        Self {
            id: w.id().clone(),
            created_at: w.created_at(),
            coordinates: w.coordinates(),
            distance_km: entry.distance_km,
            duration_min: entry.duration_min,
            detail,
        }
    }
}

impl From<StoredWorkout> for Workout {
    fn from(s: StoredWorkout) -> Self {
        let detail = match s.detail {
            StoredDetail::Running { cadence_spm } => EntryDetail::Running { cadence_spm },
            StoredDetail::Cycling { elevation_gain_m } => EntryDetail::Cycling { elevation_gain_m },
        };
        Self::restore(
            s.id,
            s.created_at,
            s.coordinates,
            WorkoutEntry {
                distance_km: s.distance_km,
                duration_min: s.duration_min,
                detail,
            },
        )
    }
}

/// Saves and loads the workout list under [`STORAGE_KEY`].
#[derive(Debug)]
pub struct PersistenceAdapter<S> {
    storage: S,
}

impl<S: KeyValueStorage> PersistenceAdapter<S> {
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }

    pub fn save(&mut self, workouts: &[Workout]) -> Result<(), PersistenceError> {
        let stored: Vec<StoredWorkout> = workouts.iter().map(StoredWorkout::from).collect();
        let json = serde_json::to_string(&stored)?;
        self.storage.set(STORAGE_KEY, &json)?;
        dlog!("saved workouts count={}", workouts.len());
        Ok(())
    }

    /// Returns the saved workouts, or an empty list when there is nothing
    /// usable. Unreadable or corrupt data is logged and skipped, never fatal.
    pub fn load(&self) -> Vec<Workout> {
        let raw = match self.storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                dlog!("no saved workouts");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(err = %e, "reading saved workouts failed; starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<StoredWorkout>>(&raw) {
            Ok(stored) => {
                dlog!("loaded workouts count={}", stored.len());
                stored.into_iter().map(Workout::from).collect()
            }
            Err(e) => {
                tracing::warn!(err = %e, bytes = raw.len(), "discarding corrupt saved workouts");
                Vec::new()
            }
        }
    }

    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.storage.remove(STORAGE_KEY)?;
        tracing::info!(key = STORAGE_KEY, "cleared saved workouts");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Activity, WorkoutKind};
    use chrono::{TimeZone, Utc};
    use serde_json::Value as JsonValue;

    fn sample() -> Vec<Workout> {
        let at = |s: i64| Utc.timestamp_opt(1_772_000_000 + s, 0).unwrap();
        vec![
            Workout::new(
                Coordinates::new(51.5, -0.1).unwrap(),
                WorkoutEntry {
                    distance_km: 5.0,
                    duration_min: 30.0,
                    detail: EntryDetail::Running { cadence_spm: 150.0 },
                },
                at(0),
            ),
            Workout::new(
                Coordinates::new(45.9, 6.8).unwrap(),
                WorkoutEntry {
                    distance_km: 20.0,
                    duration_min: 60.0,
                    detail: EntryDetail::Cycling {
                        elevation_gain_m: -5.0,
                    },
                },
                at(90),
            ),
        ]
    }

    #[test]
    fn save_then_load_round_trips_variants_in_order() {
        let mut adapter = PersistenceAdapter::new(MemoryStorage::new());
        let workouts = sample();
        adapter.save(&workouts).unwrap();

        let loaded = adapter.load();
        assert_eq!(loaded, workouts);
        assert!(matches!(loaded[0].activity(), Activity::Running(r) if r.pace_min_per_km() == 6.0));
        assert!(matches!(loaded[1].activity(), Activity::Cycling(c) if c.speed_km_per_h() == 20.0));
    }

    #[test]
    fn stored_json_uses_documented_field_names() {
        let mut adapter = PersistenceAdapter::new(MemoryStorage::new());
        adapter.save(&sample()).unwrap();

        let raw = adapter.storage().get(STORAGE_KEY).unwrap().unwrap();
        let json: JsonValue = serde_json::from_str(&raw).unwrap();
        let first = &json[0];
        assert_eq!(first["kind"], "running");
        assert_eq!(first["cadenceSpmPerMin"], 150.0);
        assert_eq!(first["coordinates"], serde_json::json!([51.5, -0.1]));
        assert_eq!(first["distanceKm"], 5.0);
        assert_eq!(first["durationMin"], 30.0);
        assert!(first["createdAt"].is_string());
        assert!(first.get("paceMinPerKm").is_none());

        let second = &json[1];
        assert_eq!(second["kind"], "cycling");
        assert_eq!(second["elevationGainM"], -5.0);
        assert!(second.get("cadenceSpmPerMin").is_none());
    }

    #[test]
    fn hand_written_record_rehydrates_into_variant() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                STORAGE_KEY,
                r#"[{"id":"1234567890","createdAt":"2026-03-05T08:00:00Z",
                    "coordinates":[10,20],"distanceKm":10,"durationMin":45,
                    "kind":"cycling","elevationGainM":300}]"#,
            )
            .unwrap();
        let adapter = PersistenceAdapter::new(storage);

        let loaded = adapter.load();
        assert_eq!(loaded.len(), 1);
        let w = &loaded[0];
        assert_eq!(w.kind(), WorkoutKind::Cycling);
        assert_eq!(w.id().as_str(), "1234567890");
        assert_eq!(w.description(), "Cycling on March 5");
        let Activity::Cycling(c) = w.activity() else {
            panic!("expected cycling");
        };
        assert_eq!(c.speed_km_per_h(), 10.0 / (45.0 / 60.0));
        assert_eq!(c.elevation_gain_m(), 300.0);
    }

    #[test]
    fn missing_key_loads_empty() {
        let adapter = PersistenceAdapter::new(MemoryStorage::new());
        assert!(adapter.load().is_empty());
    }

    #[test]
    fn corrupt_value_loads_empty() {
        for bad in ["not json", "{\"kind\":\"running\"}", "[{\"kind\":\"rowing\"}]", ""] {
            let mut storage = MemoryStorage::new();
            storage.set(STORAGE_KEY, bad).unwrap();
            let adapter = PersistenceAdapter::new(storage);
            assert!(adapter.load().is_empty(), "input {bad:?} should load empty");
        }
    }

    #[test]
    fn load_twice_gives_same_result() {
        let mut adapter = PersistenceAdapter::new(MemoryStorage::new());
        adapter.save(&sample()).unwrap();
        assert_eq!(adapter.load(), adapter.load());
    }

    #[test]
    fn clear_removes_saved_workouts() {
        let mut adapter = PersistenceAdapter::new(MemoryStorage::new());
        adapter.save(&sample()).unwrap();
        adapter.clear().unwrap();
        assert!(adapter.load().is_empty());
    }

    #[test]
    fn file_storage_round_trip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(&dir.path().join("nested")).unwrap();

        assert_eq!(storage.get("workouts").unwrap(), None);
        storage.set("workouts", "[]").unwrap();
        assert_eq!(storage.get("workouts").unwrap().as_deref(), Some("[]"));
        assert!(storage.dir().join("workouts.json").is_file());

        storage.set("workouts", "[1]").unwrap();
        assert_eq!(storage.get("workouts").unwrap().as_deref(), Some("[1]"));

        storage.remove("workouts").unwrap();
        storage.remove("workouts").unwrap();
        assert_eq!(storage.get("workouts").unwrap(), None);
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();
        assert!(storage.set("../escape", "x").is_err());
        assert!(storage.get("").is_err());
    }
}
