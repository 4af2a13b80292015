//! Packer settings with persistence
//!
//! Settings are saved to `~/.config/scenepack/settings.toml`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn, Level};

/// All packer settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackSettings {
    pub logging: LoggingSettings,
    pub output: OutputSettings,
    pub floor: FloorSettings,
}

/// Where the active settings came from. Loading happens before logging is
/// set up, so the outcome is returned and logged by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsSource {
    File(PathBuf),
    /// No file yet; defaults are in use
    Missing(PathBuf),
    NoConfigDir,
    /// The file exists but could not be read or parsed; defaults are in use
    Invalid { path: PathBuf, reason: String },
}

impl SettingsSource {
    pub fn log(&self) {
        match self {
            Self::File(path) => info!("Loaded settings from {:?}", path),
            Self::Missing(path) => info!("No settings file at {:?}, using defaults", path),
            Self::NoConfigDir => warn!("Could not determine config directory, using defaults"),
            Self::Invalid { path, reason } => {
                warn!("Failed to load settings from {:?}: {}, using defaults", path, reason)
            }
        }
    }
}

impl PackSettings {
    fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("scenepack"))
    }

    /// Load settings from disk, or return defaults if not found
    pub fn load() -> (Self, SettingsSource) {
        let Some(dir) = Self::config_dir() else {
            return (Self::default(), SettingsSource::NoConfigDir);
        };

        Self::load_from(&dir.join("settings.toml"))
    }

    pub fn load_from(path: &Path) -> (Self, SettingsSource) {
        if !path.exists() {
            return (Self::default(), SettingsSource::Missing(path.to_path_buf()));
        }

        let invalid = |reason: String| SettingsSource::Invalid {
            path: path.to_path_buf(),
            reason,
        };

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => (settings, SettingsSource::File(path.to_path_buf())),
                Err(e) => (Self::default(), invalid(e.to_string())),
            },
            Err(e) => (Self::default(), invalid(e.to_string())),
        }
    }

    /// Save settings to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let Some(dir) = Self::config_dir() else {
            anyhow::bail!("Could not determine config directory");
        };

        self.save_to(&dir.join("settings.toml"))
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of `error`, `warn`, `info`, `debug`, `trace`
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingSettings {
    /// Parsed level; unknown names fall back to `INFO`
    pub fn max_level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }
}

/// Where packed buffers go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Write vertex/index blobs and the layout report
    pub write_buffers: bool,
    /// Used when no output directory is given on the command line
    pub directory: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            write_buffers: true,
            directory: PathBuf::from("packed"),
        }
    }
}

/// Optional ground plane rendered with the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloorSettings {
    /// Edge length in world units; 0 disables the floor
    pub size: f32,
    pub subdivisions: u32,
}

impl Default for FloorSettings {
    fn default() -> Self {
        Self {
            size: 0.0,
            subdivisions: 10,
        }
    }
}

impl FloorSettings {
    pub fn enabled(&self) -> bool {
        self.size > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("scenepack-settings-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = temp_path("does-not-exist.toml");
        let (settings, source) = PackSettings::load_from(&path);
        assert_eq!(settings, PackSettings::default());
        assert_eq!(source, SettingsSource::Missing(path));
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip.toml");
        let mut settings = PackSettings::default();
        settings.logging.level = "debug".to_string();
        settings.floor.size = 20.0;
        settings.save_to(&path).unwrap();

        let (loaded, source) = PackSettings::load_from(&path);
        assert_eq!(loaded, settings);
        assert_eq!(source, SettingsSource::File(path.clone()));
        assert_eq!(loaded.logging.max_level(), Level::DEBUG);
        assert!(loaded.floor.enabled());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path("partial.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[output]\nwrite_buffers = false\n").unwrap();

        let (loaded, _) = PackSettings::load_from(&path);
        assert!(!loaded.output.write_buffers);
        assert_eq!(loaded.output.directory, PathBuf::from("packed"));
        assert_eq!(loaded.logging, LoggingSettings::default());

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_malformed_file_reports_reason() {
        let path = temp_path("garbage.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "this is = = not toml").unwrap();

        let (settings, source) = PackSettings::load_from(&path);
        assert_eq!(settings, PackSettings::default());
        match source {
            SettingsSource::Invalid { path: reported, reason } => {
                assert_eq!(reported, path);
                assert!(!reason.is_empty());
            }
            other => panic!("expected Invalid, got: {:?}", other),
        }

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_unreadable_path_reports_reason() {
        // A directory exists but cannot be read as a file.
        let path = temp_path("a-directory.toml");
        fs::create_dir_all(&path).unwrap();

        let (_, source) = PackSettings::load_from(&path);
        assert!(matches!(source, SettingsSource::Invalid { .. }));

        let _ = fs::remove_dir(path);
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let logging = LoggingSettings {
            level: "loud".to_string(),
        };
        assert_eq!(logging.max_level(), Level::INFO);
    }
}
