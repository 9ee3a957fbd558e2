//! Per-engine JSON documents in a shared state directory. Each engine owns
//! exactly one file; a corrupt file degrades to that slice's defaults instead
//! of failing the whole command.

use crate::error::CliError;
use crate::model::{
    default_batch_db, default_health_db, default_settings_db, BatchDb, HealthDb, QuestDb,
    SettingsDb, STATE_VERSION,
};
use crate::quest_catalog::default_quest_db;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub const BATCHES_FILE: &str = "batches.json";
pub const HEALTH_FILE: &str = "health.json";
pub const QUESTS_FILE: &str = "quests.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// How many events survive the first step of the health degradation chain.
const HEALTH_LOG_TRIM: usize = 50;

fn stable_clone(v: &Value) -> Value {
    match v {
        Value::Array(arr) => Value::Array(arr.iter().map(stable_clone).collect()),
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, vv)| (k.clone(), stable_clone(vv)))
                .collect();
            let mut m = serde_json::Map::new();
            for (k, vv) in sorted {
                m.insert(k, vv);
            }
            Value::Object(m)
        }
        other => other.clone(),
    }
}

/// Pretty JSON with object keys sorted, so file diffs and write-skip
/// comparisons are deterministic.
pub fn stable_to_string_pretty<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v = serde_json::to_value(value)?;
    serde_json::to_string_pretty(&stable_clone(&v))
}

pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn resolve(cli_state_dir: Option<&str>) -> Result<Store, CliError> {
        if let Some(p) = cli_state_dir.map(|s| s.trim()).filter(|s| !s.is_empty()) {
            return Ok(Store {
                dir: PathBuf::from(p),
            });
        }

        if let Ok(p) = std::env::var("SCOBYCLI_STATE_DIR") {
            let p = p.trim().to_string();
            if !p.is_empty() {
                return Ok(Store {
                    dir: PathBuf::from(p),
                });
            }
        }

        let base = std::env::var("XDG_DATA_HOME")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let home = std::env::var("HOME")
            .ok()
            .or_else(|| std::env::var("USERPROFILE").ok());

        let base = match (base, home) {
            (Some(b), _) => PathBuf::from(b),
            (None, Some(h)) => Path::new(&h).join(".local").join("share"),
            (None, None) => return Err(CliError::io("State IO error")),
        };

        Ok(Store {
            dir: base.join("scoby-cli"),
        })
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn ensure_dir(&self) -> Result<(), CliError> {
        fs::create_dir_all(&self.dir).map_err(|_| CliError::io("State IO error"))?;

        #[cfg(unix)]
        {
            let _ = fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700));
        }

        Ok(())
    }

    /// Reads one slice. Missing file -> default; unreadable JSON or a wrong
    /// version -> default with a stderr warning. Only hard I/O errors fail.
    fn read_slice<T: DeserializeOwned>(
        &self,
        file: &str,
        version_of: impl Fn(&T) -> u32,
        default: impl FnOnce() -> T,
    ) -> Result<T, CliError> {
        let path = self.path(file);
        match fs::read_to_string(&path) {
            Ok(txt) => match serde_json::from_str::<T>(&txt) {
                Ok(v) if version_of(&v) == STATE_VERSION => Ok(v),
                Ok(_) | Err(_) => {
                    eprintln!("warning: {} is corrupt, starting from defaults", file);
                    Ok(default())
                }
            },
            Err(e) => {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Ok(default())
                } else {
                    Err(CliError::io("State IO error"))
                }
            }
        }
    }

    fn write_slice_inner<T: Serialize>(&self, file: &str, value: &T) -> Result<bool, CliError> {
        self.ensure_dir()?;
        let path = self.path(file);
        let data = stable_to_string_pretty(value).map_err(|_| CliError::io("State IO error"))? + "\n";

        // Content comparison: a mutation that changed nothing writes nothing.
        if let Ok(existing) = fs::read_to_string(&path) {
            if existing == data {
                return Ok(false);
            }
        }

        let tmp_path = self
            .dir
            .join(format!(".{}.tmp.{}", file, std::process::id()));

        {
            let mut f = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|_| CliError::io("State IO error"))?;

            #[cfg(unix)]
            {
                let _ = f.set_permissions(fs::Permissions::from_mode(0o600));
            }

            f.write_all(data.as_bytes())
                .map_err(|_| CliError::io("State IO error"))?;
            let _ = f.flush();
        }

        fs::rename(&tmp_path, &path).map_err(|_| {
            let _ = fs::remove_file(&tmp_path);
            CliError::io("State IO error")
        })?;

        Ok(true)
    }

    fn with_write_lock<R>(
        &self,
        file: &str,
        f: impl FnOnce() -> Result<R, CliError>,
    ) -> Result<R, CliError> {
        self.ensure_dir()?;
        let lock_path = self.dir.join(format!("{}.lock", file));

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(lock_file) => {
                #[cfg(unix)]
                {
                    let _ = lock_file.set_permissions(fs::Permissions::from_mode(0o600));
                }
                let _guard = LockGuard { path: lock_path };
                f()
            }
            Err(e) => {
                if e.kind() == std::io::ErrorKind::AlreadyExists {
                    Err(CliError::io("State is locked"))
                } else {
                    Err(CliError::io("State IO error"))
                }
            }
        }
    }

    // --- batches ---

    pub fn load_batches(&self) -> Result<BatchDb, CliError> {
        self.read_slice(BATCHES_FILE, |db: &BatchDb| db.version, default_batch_db)
    }

    pub fn save_batches(&self, db: &BatchDb) -> Result<(), CliError> {
        self.with_write_lock(BATCHES_FILE, || {
            self.write_slice_inner(BATCHES_FILE, db).map(|_| ())
        })
    }

    // --- health ---

    pub fn load_health(&self, now: &str) -> Result<HealthDb, CliError> {
        self.read_slice(HEALTH_FILE, |db: &HealthDb| db.version, || {
            default_health_db(now)
        })
    }

    /// Saves the health slice with the degradation chain: on write failure,
    /// trim the event log and retry, then drop the log and retry, then give
    /// up with a warning. A full disk never takes the pet down.
    pub fn save_health(&self, db: &HealthDb) -> Result<(), CliError> {
        self.with_write_lock(HEALTH_FILE, || {
            if self.write_slice_inner(HEALTH_FILE, db).is_ok() {
                return Ok(());
            }

            let mut trimmed = db.clone();
            if trimmed.health_events.len() > HEALTH_LOG_TRIM {
                trimmed.health_events = trimmed
                    .health_events
                    .split_off(trimmed.health_events.len() - HEALTH_LOG_TRIM);
            }
            if self.write_slice_inner(HEALTH_FILE, &trimmed).is_ok() {
                eprintln!("warning: health log trimmed to fit storage");
                return Ok(());
            }

            trimmed.health_events.clear();
            if self.write_slice_inner(HEALTH_FILE, &trimmed).is_ok() {
                eprintln!("warning: health log dropped to fit storage");
                return Ok(());
            }

            eprintln!("warning: could not persist health state");
            Ok(())
        })
    }

    // --- quests + avatar ---

    pub fn load_quests(&self, now: &str) -> Result<QuestDb, CliError> {
        self.read_slice(QUESTS_FILE, |db: &QuestDb| db.version, || {
            default_quest_db(now)
        })
    }

    pub fn save_quests(&self, db: &QuestDb) -> Result<(), CliError> {
        self.with_write_lock(QUESTS_FILE, || {
            self.write_slice_inner(QUESTS_FILE, db).map(|_| ())
        })
    }

    // --- settings ---

    pub fn load_settings(&self) -> Result<SettingsDb, CliError> {
        self.read_slice(SETTINGS_FILE, |db: &SettingsDb| db.version, default_settings_db)
    }

    pub fn save_settings(&self, db: &SettingsDb) -> Result<(), CliError> {
        self.with_write_lock(SETTINGS_FILE, || {
            self.write_slice_inner(SETTINGS_FILE, db).map(|_| ())
        })
    }
}

struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
