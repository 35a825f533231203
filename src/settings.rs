use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::viewer::{
    DEFAULT_DOCUMENT_LOCATION, DEFAULT_VISIBILITY_THRESHOLD, SessionConfig, SourceLocation, Zoom,
};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "folio";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Document location, relative to the host page
    #[serde(default = "default_document")]
    pub document: String,

    /// Prefix the document location with the host's first path segment
    #[serde(default)]
    pub host_prefixed: bool,

    #[serde(default = "default_initial_scale")]
    pub initial_scale: f32,

    #[serde(default = "default_visibility_threshold")]
    pub visibility_threshold: f32,

    /// Check fetch status and content type before decoding
    #[serde(default = "default_true")]
    pub validate_source: bool,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_document() -> String {
    DEFAULT_DOCUMENT_LOCATION.to_string()
}

fn default_initial_scale() -> f32 {
    Zoom::DEFAULT_SCALE
}

fn default_visibility_threshold() -> f32 {
    DEFAULT_VISIBILITY_THRESHOLD
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            document: default_document(),
            host_prefixed: false,
            initial_scale: default_initial_scale(),
            visibility_threshold: default_visibility_threshold(),
            validate_source: true,
        }
    }
}

impl Settings {
    /// Session configuration for a host page served from `host_path`
    #[must_use]
    pub fn session_config(&self, host_path: &str) -> SessionConfig {
        let location = if self.host_prefixed {
            SourceLocation::HostPrefixed(self.document.clone())
        } else {
            SourceLocation::Fixed(self.document.clone())
        };
        SessionConfig {
            location,
            host_path: host_path.to_string(),
            initial_scale: Zoom::clamp_factor(self.initial_scale),
            visibility_threshold: self.visibility_threshold,
            validate_source: self.validate_source,
            ..SessionConfig::default()
        }
    }
}

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

/// Load settings from the default location, writing defaults if absent
pub fn load_settings() -> Settings {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return Settings::default();
    };
    load_or_create(&path)
}

/// Load settings from `path`, writing defaults there if the file is missing
pub fn load_or_create(path: &Path) -> Settings {
    if path.exists() {
        return load_settings_from_path(path);
    }
    info!("Settings file not found, creating with defaults at {path:?}");
    let settings = Settings::default();
    save_settings_to_file(&settings, path);
    settings
}

pub fn load_settings_from_path(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }
                settings
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                Settings::default()
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
            Settings::default()
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // Future migrations go here:
    // if settings.version < 2 {
    //     migrate_v1_to_v2(settings);
    // }

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    match serde_yaml::to_string(settings) {
        Ok(content) => match fs::write(path, content) {
            Ok(()) => debug!("Saved settings to {path:?}"),
            Err(e) => error!("Failed to save settings to {path:?}: {e}"),
        },
        Err(e) => error!("Failed to serialize settings: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILENAME);

        let settings = load_or_create(&path);
        assert_eq!(settings, Settings::default());
        assert!(path.exists());
        assert_eq!(load_settings_from_path(&path), Settings::default());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(&path, "version: 1\ninitial_scale: 1.5\nhost_prefixed: true\n").unwrap();

        let settings = load_settings_from_path(&path);
        assert_eq!(settings.initial_scale, 1.5);
        assert!(settings.host_prefixed);
        assert_eq!(settings.document, DEFAULT_DOCUMENT_LOCATION);
        assert!(settings.validate_source);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(&path, "initial_scale: [not, a, number]\n").unwrap();

        assert_eq!(load_settings_from_path(&path), Settings::default());
    }

    #[test]
    fn old_version_is_migrated_and_saved() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILENAME);
        fs::write(&path, "version: 0\n").unwrap();

        let settings = load_settings_from_path(&path);
        assert_eq!(settings.version, CURRENT_VERSION);
        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("version: 1"));
    }

    #[test]
    fn session_config_clamps_scale_and_picks_location() {
        let settings = Settings {
            initial_scale: 9.0,
            host_prefixed: true,
            ..Settings::default()
        };
        let config = settings.session_config("/site/");
        assert_eq!(config.initial_scale, Zoom::MAX_SCALE);
        assert_eq!(
            config.location,
            SourceLocation::HostPrefixed(DEFAULT_DOCUMENT_LOCATION.to_string())
        );
        assert_eq!(config.host_path, "/site/");
    }
}
