//! User preferences: brewing defaults and notification toggles, addressed
//! by dotted key on the command line.

use crate::batches::validate_target_days;
use crate::error::CliError;
use crate::model::{default_settings_db, SettingsDb};

pub const SETTING_KEYS: &[&str] = &[
    "brewing.default_target_days",
    "brewing.default_tea_type",
    "notifications.batch_reminders",
    "notifications.health_alerts",
];

fn parse_bool(key: &str, value: &str) -> Result<bool, CliError> {
    match value {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err(CliError::usage(format!(
            "Invalid value for {}: expected true or false",
            key
        ))),
    }
}

/// Applies one `key value` pair. Unknown keys list the valid ones.
pub fn apply_setting(db: &mut SettingsDb, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "brewing.default_target_days" => {
            let days: u32 = value
                .parse()
                .map_err(|_| CliError::usage("Invalid value: expected a number of days"))?;
            validate_target_days(days)?;
            db.brewing.default_target_days = days;
        }
        "brewing.default_tea_type" => {
            let v = value.trim();
            if v.is_empty() {
                return Err(CliError::usage("Tea type cannot be empty"));
            }
            db.brewing.default_tea_type = v.to_string();
        }
        "notifications.batch_reminders" => {
            db.notifications.batch_reminders = parse_bool(key, value)?;
        }
        "notifications.health_alerts" => {
            db.notifications.health_alerts = parse_bool(key, value)?;
        }
        _ => {
            return Err(CliError::usage(format!(
                "Unknown setting: {} (valid keys: {})",
                key,
                SETTING_KEYS.join(", ")
            )));
        }
    }
    Ok(())
}

pub fn reset_settings(db: &mut SettingsDb) {
    *db = default_settings_db();
}
