//! Settings loading and hot-reloading.
//!
//! Settings are loaded from RON files in a settings directory (`data/settings`
//! by default). If several files are present the first one in file-name order
//! that parses is used; with none, the defaults are used. Whatever is loaded
//! is sanitized and validated before it reaches the app.
use bevy::prelude::{error, info, warn, Res, ResMut, Resource};

use crate::ron::{load_ron_files, setup_ron_watcher, RonWatcher};
use crate::settings::Settings;

pub const DEFAULT_SETTINGS_DIR: &str = "data/settings";

/// Watches the settings directory and remembers where it is.
#[derive(Resource)]
pub struct SettingsWatcher {
    pub watcher: RonWatcher,
    pub dir: String,
}

impl SettingsWatcher {
    /// A watcher that never fires, for when the OS watcher is unavailable.
    #[must_use]
    pub fn stub(dir: &str) -> Self {
        SettingsWatcher { watcher: RonWatcher::stub(), dir: dir.to_string() }
    }
}

/// Sanitize then validate `settings`.
///
/// # Returns
/// The repaired settings, or the defaults when validation fails. Every
/// clamp is logged as a warning and a rejection as an error.
#[must_use]
pub fn prepare_settings(mut settings: Settings) -> Settings {
    for warning in settings.sanitize() {
        warn!("settings: {warning}");
    }
    match settings.validate() {
        Ok(()) => settings,
        Err(e) => {
            error!("settings rejected ({e}), falling back to defaults");
            Settings::defaults()
        }
    }
}

/// Load settings from `path` (directory).
///
/// # Arguments
/// * `path` - directory holding the settings RON files (e.g. "data/settings")
///
/// # Returns
/// The first file that parses, prepared with `prepare_settings`, or the
/// defaults when there is none.
///
/// # Example
/// ```ignore
/// let settings = load_settings_from_dir("data/settings");
/// ```
#[must_use]
pub fn load_settings_from_dir(path: &str) -> Settings {
    let items: Vec<Settings> = load_ron_files(path);
    match items.into_iter().next() {
        Some(first) => prepare_settings(first),
        None => {
            info!("no settings found in {path}, using defaults");
            Settings::defaults()
        }
    }
}

/// Create a watcher for the settings directory (hot-reload).
///
/// # Errors
/// Propagates the `notify::Error` from the OS watcher. Callers usually fall
/// back to `SettingsWatcher::stub`.
pub fn setup_settings_watcher(path: &str) -> Result<SettingsWatcher, notify::Error> {
    setup_ron_watcher(path).map(|watcher| SettingsWatcher { watcher, dir: path.to_string() })
}

/// Reload the `Settings` resource when the watched files change.
///
/// # Example
/// ```ignore
/// app.add_systems(Update, check_settings_changes);
/// ```
#[allow(clippy::needless_pass_by_value)]
pub fn check_settings_changes(watcher: Res<SettingsWatcher>, mut settings: ResMut<Settings>) {
    if watcher.watcher.take_changed() {
        info!("settings changed, reloading from {}", watcher.dir);
        let reloaded = load_settings_from_dir(&watcher.dir);
        if reloaded != *settings {
            *settings = reloaded;
        }
    }
}
