//! Settings loading: defaults < JSON file < `UPLINK_*` env overrides.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::UplinkSettings;

/// Recursively merge `overlay` into `base`.
///
/// Objects merge key by key; any other value in `overlay` replaces the
/// corresponding `base` value outright.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from `path`, layered over compiled defaults, with env
/// overrides applied last. A missing file is not an error — defaults plus
/// env are used.
pub fn load_settings_from_path(path: &Path) -> Result<UplinkSettings> {
    let defaults = serde_json::to_value(UplinkSettings::default())?;

    let merged = if path.exists() {
        let raw = std::fs::read_to_string(path)?;
        let file: Value = serde_json::from_str(&raw)?;
        debug!(path = %path.display(), "loaded settings file");
        deep_merge(defaults, file)
    } else {
        debug!(path = %path.display(), "no settings file, using defaults");
        defaults
    };

    let mut settings: UplinkSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.normalize();
    Ok(settings)
}

/// Apply `UPLINK_*` environment variable overrides (highest priority).
fn apply_env_overrides(settings: &mut UplinkSettings) {
    if let Ok(db) = std::env::var("UPLINK_DB") {
        settings.storage.db_path = db;
    }
    if let Ok(bind) = std::env::var("UPLINK_BIND") {
        settings.server.bind = bind;
    }
    if let Ok(filter) = std::env::var("UPLINK_LOG") {
        settings.logging.filter = filter;
    }
}
