//! # uplink-settings
//!
//! Configuration management with layered sources for the Uplink event
//! store.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`UplinkSettings::default()`]
//! 2. **JSON file** — deep-merged over defaults
//! 3. **Environment variables** — `UPLINK_*` overrides (highest priority)
//!
//! Loading happens once at startup; the binary hands the resulting
//! snapshot to each component as an `Arc<UplinkSettings>`.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings_from_path};
pub use types::*;
