//! Layered application configuration.
//!
//! Precedence, lowest first: built-in defaults, the YAML file, `OUTREACH__*`
//! environment variables (`OUTREACH__RUN__DELAY_SECS=15`), then CLI flags
//! applied by the individual commands.

use std::path::{Path, PathBuf};

use cdp_adapter::BrowserSettings;
use config::{Config, Environment, File, FileFormat};
use outreach_scheduler::{ListRequest, DEFAULT_DELAY_SECS};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "OUTREACH";
const APP_DIR: &str = "outreach";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sheet: SheetSettings,
    pub run: RunSettings,
    pub browser: BrowserSettings,
    pub storage: StorageSettings,
    pub server: ServerSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetSettings {
    pub sheet_id: String,
    pub api_key: String,
    pub range: String,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            sheet_id: String::new(),
            api_key: String::new(),
            range: "Sheet1!A2:A".to_string(),
        }
    }
}

impl SheetSettings {
    pub fn list_request(&self) -> ListRequest {
        ListRequest {
            sheet_id: self.sheet_id.trim().to_string(),
            api_key: self.api_key.trim().to_string(),
            range: self.range.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Note template; `{firstName}` and `{lastName}` are substituted.
    pub message: String,
    pub delay_secs: u64,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            message: String::new(),
            delay_secs: DEFAULT_DELAY_SECS,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Audit log file. Defaults to `<data_dir>/outreach/audit.json`.
    pub audit_path: Option<PathBuf>,
}

impl StorageSettings {
    pub fn resolved_audit_path(&self) -> PathBuf {
        self.audit_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("audit.json")
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 8788 }
    }
}

impl AppConfig {
    /// Copy with the API key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.sheet.api_key.is_empty() {
            copy.sheet.api_key = "***".to_string();
        }
        copy
    }
}

/// Config file to read when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from("config/outreach.yaml");
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join("config.yaml"))
        .unwrap_or(local)
}

/// Build the configuration from `path` plus the environment. An explicitly
/// requested file must exist; the default location may be absent.
pub fn load_app_config(path: &Path, required: bool) -> Result<AppConfig, config::ConfigError> {
    Config::builder()
        .add_source(
            File::from(path)
                .format(FileFormat::Yaml)
                .required(required),
        )
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn missing_optional_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_app_config(&dir.path().join("absent.yaml"), false).unwrap();
        assert_eq!(config.run.delay_secs, DEFAULT_DELAY_SECS);
        assert_eq!(config.server.port, 8788);
        assert_eq!(config.browser.render_settle_ms, 2_000);
        assert_eq!(config.sheet.range, "Sheet1!A2:A");
    }

    #[test]
    #[serial]
    fn missing_required_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_app_config(&dir.path().join("absent.yaml"), true).is_err());
    }

    #[test]
    #[serial]
    fn yaml_then_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outreach.yaml");
        std::fs::write(
            &path,
            "sheet:\n  sheet_id: abc\n  api_key: secret\nrun:\n  message: Hi {firstName}\n  delay_secs: 20\nbrowser:\n  headless: true\n",
        )
        .unwrap();

        env::set_var("OUTREACH__RUN__DELAY_SECS", "7");
        let loaded = load_app_config(&path, true);
        env::remove_var("OUTREACH__RUN__DELAY_SECS");
        let config = loaded.unwrap();

        assert_eq!(config.sheet.sheet_id, "abc");
        assert_eq!(config.run.message, "Hi {firstName}");
        assert_eq!(config.run.delay_secs, 7);
        assert!(config.browser.headless);
        assert_eq!(config.browser.window_width, 1280);
    }

    #[test]
    fn redaction_masks_api_key_only() {
        let mut config = AppConfig::default();
        config.sheet.api_key = "secret".into();
        config.sheet.sheet_id = "abc".into();
        let shown = config.redacted();
        assert_eq!(shown.sheet.api_key, "***");
        assert_eq!(shown.sheet.sheet_id, "abc");
    }

    #[test]
    fn explicit_audit_path_wins() {
        let storage = StorageSettings {
            audit_path: Some(PathBuf::from("/tmp/audit.json")),
        };
        assert_eq!(storage.resolved_audit_path(), PathBuf::from("/tmp/audit.json"));
        assert!(StorageSettings::default()
            .resolved_audit_path()
            .ends_with("outreach/audit.json"));
    }
}
