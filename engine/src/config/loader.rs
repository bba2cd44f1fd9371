// Locates, loads and persists the YAML configuration file
use super::settings::{AppConfig, ConfigOverlay, CurrencyConfig, TelegramConfig};
use crate::error::{EngineError, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".crypto-signal";
const CONFIG_FILE: &str = "config.yaml";
const SYSTEM_DIR: &str = "/etc/crypto-signal";

pub struct ConfigLoader {
    path: PathBuf,
    config: AppConfig,
    warnings: Vec<String>,
}

impl ConfigLoader {
    /// Uses `path` when given, otherwise the first existing candidate location.
    pub fn new(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(find_config_path);
        tracing::info!(path = %path.display(), "Config loader initialised");
        ConfigLoader {
            path,
            config: AppConfig::default(),
            warnings: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Problems found by the last [`ConfigLoader::load`]. They are kept rather
    /// than logged because loading usually happens before tracing is set up.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Overlays the file onto the defaults. A missing file is created from the defaults.
    pub fn load(&mut self) -> Result<&AppConfig> {
        self.warnings.clear();
        if self.path.exists() {
            let raw = fs::read_to_string(&self.path)?;
            let overlay: ConfigOverlay = if raw.trim().is_empty() {
                ConfigOverlay::default()
            } else {
                serde_yaml::from_str(&raw)?
            };
            self.config = AppConfig::default();
            self.config.apply(overlay);
            tracing::info!(path = %self.path.display(), "Configuration loaded");
        } else {
            self.config = AppConfig::default();
            self.save()?;
            self.warnings.push(format!(
                "config file not found, wrote defaults to {}",
                self.path.display()
            ));
        }

        let checks = self.validate();
        self.warnings.extend(checks);
        Ok(&self.config)
    }

    pub fn save(&self) -> Result<()> {
        write_yaml(&self.path, &self.config, None)?;
        tracing::info!(path = %self.path.display(), "Configuration saved");
        Ok(())
    }

    /// Writes a commented template with the default configuration to `output`.
    pub fn create_template(output: &Path) -> Result<()> {
        write_yaml(
            output,
            &AppConfig::default(),
            Some("# crypto-signal configuration\n# Adjust the values below to your needs.\n\n"),
        )?;
        tracing::info!(path = %output.display(), "Configuration template written");
        Ok(())
    }

    /// Non-fatal configuration problems. Indicator parameters are checked
    /// separately when the indicator engine is built.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let notification = &self.config.notification;
        if notification.enabled && notification.telegram.enabled {
            if notification.telegram.bot_token.is_empty() {
                warnings.push("Telegram bot token is not configured".to_string());
            }
            if notification.telegram.chat_id.is_empty() {
                warnings.push("Telegram chat id is not configured".to_string());
            }
        }
        if self.enabled_currencies().is_empty() {
            warnings.push("no currencies are enabled".to_string());
        }
        warnings
    }

    pub fn currency(&self, symbol: &str) -> Option<&CurrencyConfig> {
        self.config.currency(symbol)
    }

    pub fn enabled_currencies(&self) -> Vec<&CurrencyConfig> {
        self.config.enabled_currencies()
    }

    pub fn telegram_config(&self) -> Option<&TelegramConfig> {
        let notification = &self.config.notification;
        (notification.enabled && notification.telegram.enabled).then_some(&notification.telegram)
    }

    pub fn telegram_enabled(&self) -> bool {
        self.telegram_config()
            .map(|t| !t.bot_token.is_empty() && !t.chat_id.is_empty())
            .unwrap_or(false)
    }
}

fn write_yaml(path: &Path, config: &AppConfig, header: Option<&str>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let body = serde_yaml::to_string(config)?;
    let contents = match header {
        Some(header) => format!("{}{}", header, body),
        None => body,
    };
    fs::write(path, contents).map_err(EngineError::from)
}

fn find_config_path() -> PathBuf {
    resolve_config_path(dirs::home_dir(), |path| path.exists())
}

/// First existing candidate; otherwise the per-user file, or `./config.yaml`
/// when the home directory is unknown.
fn resolve_config_path(home: Option<PathBuf>, exists: impl Fn(&Path) -> bool) -> PathBuf {
    let user = home.map(|home| home.join(APP_DIR).join(CONFIG_FILE));
    let candidates = user
        .iter()
        .cloned()
        .chain([PathBuf::from(CONFIG_FILE), Path::new(SYSTEM_DIR).join(CONFIG_FILE)]);
    for candidate in candidates {
        if exists(&candidate) {
            tracing::debug!(path = %candidate.display(), "Found config file");
            return candidate;
        }
    }
    user.unwrap_or_else(|| PathBuf::from(CONFIG_FILE))
}
