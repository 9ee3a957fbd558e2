//! Whole-state export and import as a single JSON bundle. Import parses and
//! validates the entire bundle before any slice is replaced, so a malformed
//! file can never leave the state half-swapped.

use crate::error::CliError;
use crate::model::{BatchDb, HealthDb, QuestDb, SettingsDb, STATE_VERSION};
use crate::store::{stable_to_string_pretty, Store};
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    pub version: u32,
    pub export_date: String,
    pub settings: SettingsDb,
    pub batches: BatchDb,
    pub health: HealthDb,
    pub quests: QuestDb,
}

pub fn build_bundle(store: &Store, now: &str) -> Result<Bundle, CliError> {
    Ok(Bundle {
        version: STATE_VERSION,
        export_date: now.to_string(),
        settings: store.load_settings()?,
        batches: store.load_batches()?,
        health: store.load_health(now)?,
        quests: store.load_quests(now)?,
    })
}

pub fn write_bundle(bundle: &Bundle, out_path: &str) -> Result<(), CliError> {
    let data = stable_to_string_pretty(bundle).map_err(|_| CliError::io("State IO error"))? + "\n";
    fs::write(out_path, data).map_err(|_| CliError::io(format!("Cannot write {}", out_path)))
}

pub fn read_bundle(path: &str) -> Result<Bundle, CliError> {
    let txt = fs::read_to_string(path)
        .map_err(|_| CliError::io(format!("Cannot read {}", path)))?;
    let bundle: Bundle = serde_json::from_str(&txt)
        .map_err(|e| CliError::usage(format!("Invalid import file: {}", e)))?;

    if bundle.version != STATE_VERSION
        || bundle.batches.version != STATE_VERSION
        || bundle.health.version != STATE_VERSION
        || bundle.quests.version != STATE_VERSION
        || bundle.settings.version != STATE_VERSION
    {
        return Err(CliError::usage("Invalid import file: unsupported version"));
    }

    Ok(bundle)
}

/// Replaces every slice with the bundle's contents. Call only after
/// `read_bundle` has accepted the file.
pub fn apply_bundle(store: &Store, bundle: &Bundle) -> Result<(), CliError> {
    store.save_settings(&bundle.settings)?;
    store.save_batches(&bundle.batches)?;
    store.save_health(&bundle.health)?;
    store.save_quests(&bundle.quests)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2026-01-31T12:00:00Z";

    fn store_in(dir: &std::path::Path) -> Store {
        Store::resolve(Some(dir.to_str().unwrap())).unwrap()
    }

    #[test]
    fn roundtrip_preserves_all_slices() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());

        let mut batches = store.load_batches().unwrap();
        batches.meta.next_batch_number = 5;
        store.save_batches(&batches).unwrap();

        let bundle = build_bundle(&store, NOW).unwrap();
        let out = tmp.path().join("bundle.json");
        write_bundle(&bundle, out.to_str().unwrap()).unwrap();

        let other = tempfile::tempdir().unwrap();
        let store2 = store_in(other.path());
        let parsed = read_bundle(out.to_str().unwrap()).unwrap();
        apply_bundle(&store2, &parsed).unwrap();

        assert_eq!(store2.load_batches().unwrap().meta.next_batch_number, 5);
        assert_eq!(
            store2.load_quests(NOW).unwrap().quests.len(),
            bundle.quests.quests.len()
        );
    }

    #[test]
    fn malformed_bundle_is_a_validation_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "{\"version\": 1}").unwrap();
        let err = read_bundle(path.to_str().unwrap()).unwrap_err();
        assert_eq!(err.exit_code, 2);
    }

    #[test]
    fn wrong_version_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_in(tmp.path());
        let mut bundle = build_bundle(&store, NOW).unwrap();
        bundle.version = 99;
        let path = tmp.path().join("old.json");
        write_bundle(&bundle, path.to_str().unwrap()).unwrap();
        let err = read_bundle(path.to_str().unwrap()).unwrap_err();
        assert_eq!(err.exit_code, 2);
    }
}
