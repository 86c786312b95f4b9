use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// When the log file rolls over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    pub console: bool,
    /// Also write to a rolling file in `log_dir`
    pub file: bool,
    pub log_dir: PathBuf,
    pub file_name_prefix: String,
    pub rotation: LogRotation,
    pub show_file_line: bool,
    pub show_thread_ids: bool,
    pub show_target: bool,
    pub ansi_colors: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        let log_dir = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .map(|dir| dir.join("ergoblue").join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));
        Self {
            level: "info".to_string(),
            console: true,
            file: false,
            log_dir,
            file_name_prefix: "ergoblue_profile".to_string(),
            rotation: LogRotation::Daily,
            show_file_line: false,
            show_thread_ids: false,
            show_target: true,
            ansi_colors: true,
        }
    }
}

/// Human readable names written into the rendered SDP record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordSettings {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_provider")]
    pub provider: String,
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            description: default_description(),
            provider: default_provider(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_service_name() -> String {
    "ErgoBlue Keyboard".to_string()
}
fn default_description() -> String {
    "Keyboard".to_string()
}
fn default_provider() -> String {
    "ErgoBlue".to_string()
}

/// Controller whose visibility is switched on before registering
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdapterSettings {
    #[serde(default = "default_adapter_name")]
    pub name: String,
    #[serde(default = "default_true")]
    pub make_discoverable: bool,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            name: default_adapter_name(),
            make_discoverable: default_true(),
        }
    }
}

fn default_adapter_name() -> String {
    "hci0".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_settings: LogSettings,

    #[serde(default)]
    pub record: RecordSettings,

    #[serde(default)]
    pub adapter: AdapterSettings,

    // D-Bus address replacing the system bus, e.g. "unix:path=/run/dbus/system_bus_socket"
    #[serde(default)]
    pub bus_address: Option<String>,

    // Call UnregisterProfile before exiting on SIGINT/SIGTERM
    #[serde(default = "default_true")]
    pub unregister_on_shutdown: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_settings: LogSettings::default(),
            record: RecordSettings::default(),
            adapter: AdapterSettings::default(),
            bus_address: None,
            unregister_on_shutdown: default_true(),
        }
    }
}

pub struct SettingsService {
    settings: Settings,
    settings_path: Option<PathBuf>,
    load_error: Option<String>,
}

impl SettingsService {
    /// Load settings from the user config directory, falling back to
    /// defaults when the file is missing or unreadable.
    pub fn new() -> Self {
        let settings_path = Self::get_settings_path();
        let mut load_error = None;
        let settings = match settings_path.as_deref().filter(|path| path.exists()) {
            Some(path) => Self::load_from_file(path).unwrap_or_else(|e| {
                load_error = Some(format!("Ignoring settings file {}: {}", path.display(), e));
                Settings::default()
            }),
            None => Settings::default(),
        };

        Self {
            settings,
            settings_path,
            load_error,
        }
    }

    fn get_settings_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("ergoblue");
        path.push("settings.json");
        Some(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    /// Why the settings file was ignored, if it was.
    /// Loading happens before logging is up, so the caller reports it.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.log_settings.level, "info");
        assert!(settings.log_settings.console);
        assert!(!settings.log_settings.file);
        assert_eq!(settings.record, RecordSettings::default());
        assert_eq!(settings.adapter.name, "hci0");
        assert!(settings.adapter.make_discoverable);
        assert!(settings.bus_address.is_none());
        assert!(settings.unregister_on_shutdown);
        assert!(Settings::default().unregister_on_shutdown);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let json = r#"{
            "log_settings": { "level": "debug", "rotation": "hourly" },
            "record": { "service_name": "Left Half" },
            "adapter": { "make_discoverable": false },
            "unregister_on_shutdown": false
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.log_settings.level, "debug");
        assert_eq!(settings.log_settings.rotation, LogRotation::Hourly);
        assert_eq!(settings.log_settings.file_name_prefix, "ergoblue_profile");
        assert!(!settings.adapter.make_discoverable);
        assert_eq!(settings.adapter.name, "hci0");
        assert_eq!(settings.record.service_name, "Left Half");
        assert_eq!(settings.record.provider, "ErgoBlue");
        assert!(!settings.unregister_on_shutdown);
    }

    #[test]
    fn test_unknown_rotation_rejected() {
        let json = r#"{ "log_settings": { "rotation": "weekly" } }"#;
        assert!(serde_json::from_str::<Settings>(json).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = std::env::temp_dir().join(format!("ergoblue-settings-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        fs::write(&path, r#"{ "record": { "provider": "Acme" } }"#).unwrap();

        let settings = SettingsService::load_from_file(&path).unwrap();
        assert_eq!(settings.record.provider, "Acme");

        fs::write(&path, "not json").unwrap();
        assert!(SettingsService::load_from_file(&path).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
