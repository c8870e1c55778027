use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::OpenError;
use crate::translator::MountMapping;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub handlers: HandlerConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub distro: DistroConfig,
    #[serde(default = "default_schemes")]
    pub schemes: Vec<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Windows program that receives the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handler {
    /// `cmd.exe /c start "" <target>`
    CommandShell,
    /// `explorer.exe <target>`
    FileBrowser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Handler for URLs with a recognized scheme
    #[serde(default = "default_url_handler")]
    pub url: Handler,

    /// Handler for everything else
    #[serde(default = "default_file_handler")]
    pub file: Handler,

    #[serde(default = "default_command_shell")]
    pub command_shell: ExecutableConfig,

    /// Arguments placed between the command shell and the escaped target
    ///
    /// The trailing empty argument is `start`'s window title. Without it a
    /// quoted target would be taken as the title and nothing would open.
    #[serde(default = "default_start_args")]
    pub start_args: Vec<String>,

    #[serde(default = "default_file_browser")]
    pub file_browser: ExecutableConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutableConfig {
    /// Name looked up on `PATH`, or an explicit Linux-side path
    pub program: String,

    /// Native Windows location, converted with `wslpath -u` when `program`
    /// is not on `PATH`
    pub native_path: Option<String>,
}

/// Which translation strategy turns canonical paths into Windows paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Ask `wslpath -w`
    #[default]
    Delegated,
    /// Look the path up in `mounts`
    MountTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Path translation utility used by the delegated strategy and the
    /// executable locator
    #[serde(default = "default_wslpath")]
    pub wslpath: String,

    /// Ordered mount table for the static strategy, first match wins
    #[serde(default = "default_mounts")]
    pub mounts: Vec<MountMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistroConfig {
    /// Environment variable holding the distro name, read on every invocation
    #[serde(default = "default_distro_env_var")]
    pub env_var: String,

    /// Name used when the variable is unset or empty
    #[serde(default = "default_distro_fallback")]
    pub fallback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file; `~/.xdg-open-wsl/xdg-open.log` when unset
    pub file: Option<PathBuf>,

    /// Level written to the log file
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_url_handler() -> Handler {
    Handler::CommandShell
}

fn default_file_handler() -> Handler {
    Handler::FileBrowser
}

fn default_command_shell() -> ExecutableConfig {
    ExecutableConfig {
        program: "cmd.exe".to_string(),
        native_path: Some(r"C:\Windows\System32\cmd.exe".to_string()),
    }
}

fn default_start_args() -> Vec<String> {
    vec!["/c".to_string(), "start".to_string(), String::new()]
}

fn default_file_browser() -> ExecutableConfig {
    ExecutableConfig {
        program: "explorer.exe".to_string(),
        native_path: Some(r"C:\Windows\explorer.exe".to_string()),
    }
}

fn default_wslpath() -> String {
    "wslpath".to_string()
}

fn default_mounts() -> Vec<MountMapping> {
    ('a'..='z')
        .map(|drive| MountMapping::new(format!("/mnt/{drive}/"), format!("{}:/", drive.to_ascii_uppercase())))
        .collect()
}

fn default_distro_env_var() -> String {
    "WSL_DISTRO_NAME".to_string()
}

fn default_distro_fallback() -> String {
    "Ubuntu".to_string()
}

fn default_schemes() -> Vec<String> {
    vec!["http".to_string(), "https".to_string(), "zotero".to_string()]
}

fn default_log_level() -> String {
    "debug".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            handlers: HandlerConfig::default(),
            translation: TranslationConfig::default(),
            distro: DistroConfig::default(),
            schemes: default_schemes(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            url: default_url_handler(),
            file: default_file_handler(),
            command_shell: default_command_shell(),
            start_args: default_start_args(),
            file_browser: default_file_browser(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            wslpath: default_wslpath(),
            mounts: default_mounts(),
        }
    }
}

impl Default for DistroConfig {
    fn default() -> Self {
        Self {
            env_var: default_distro_env_var(),
            fallback: default_distro_fallback(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: default_log_level(),
        }
    }
}

impl DistroConfig {
    /// Current distro name
    ///
    /// The environment is read on each call so a changed variable is picked up
    /// by the next invocation.
    #[must_use]
    pub fn current(&self) -> String {
        self.resolve(|name| std::env::var(name).ok())
    }

    /// Distro name as reported by `lookup` for the configured variable
    #[must_use]
    pub fn resolve(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        match lookup(&self.env_var) {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => self.fallback.clone(),
        }
    }
}

impl Config {
    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {}", path.as_ref().display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce an unusable launch command
    ///
    /// # Errors
    /// Returns [`OpenError::Config`] naming the first offending field
    pub fn validate(&self) -> crate::Result<()> {
        if self.handlers.command_shell.program.trim().is_empty() {
            return Err(OpenError::Config("handlers.command_shell.program is empty".to_string()));
        }
        if self.handlers.file_browser.program.trim().is_empty() {
            return Err(OpenError::Config("handlers.file_browser.program is empty".to_string()));
        }
        if self.translation.wslpath.trim().is_empty() {
            return Err(OpenError::Config("translation.wslpath is empty".to_string()));
        }
        if let Some(scheme) = self.schemes.iter().find(|s| s.is_empty() || s.contains(':')) {
            return Err(OpenError::Config(format!("invalid scheme {scheme:?}")));
        }
        if let Some(mount) = self.translation.mounts.iter().find(|m| m.linux_prefix.is_empty()) {
            return Err(OpenError::Config(format!(
                "mount for {:?} has an empty Linux prefix",
                mount.windows_prefix
            )));
        }
        Ok(())
    }

    /// Default log file path
    pub fn default_log_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("xdg-open.log"))
    }

    /// Get default configuration path
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.yaml"))
    }

    fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Failed to get home directory")?;

        Ok(home.join(".xdg-open-wsl"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_handlers() {
        let config = Config::default();
        assert_eq!(config.handlers.url, Handler::CommandShell);
        assert_eq!(config.handlers.file, Handler::FileBrowser);
        assert_eq!(config.handlers.command_shell.program, "cmd.exe");
        assert_eq!(config.handlers.file_browser.program, "explorer.exe");
        assert_eq!(config.handlers.start_args, vec!["/c", "start", ""]);
    }

    #[test]
    fn test_default_schemes() {
        let config = Config::default();
        assert_eq!(config.schemes, vec!["http", "https", "zotero"]);
    }

    #[test]
    fn test_default_mounts_cover_drive_letters() {
        let mounts = TranslationConfig::default().mounts;
        assert_eq!(mounts.len(), 26);
        assert_eq!(mounts[2].linux_prefix, "/mnt/c/");
        assert_eq!(mounts[2].windows_prefix, "C:/");
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
handlers:
  url: file_browser
translation:
  strategy: mount_table
  mounts:
    - linux_prefix: /c/
      windows_prefix: "C:/"
distro:
  fallback: Debian
schemes: [http, https]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.handlers.url, Handler::FileBrowser);
        assert_eq!(config.handlers.file, Handler::FileBrowser);
        assert_eq!(config.translation.strategy, StrategyKind::MountTable);
        assert_eq!(config.translation.mounts.len(), 1);
        assert_eq!(config.translation.wslpath, "wslpath");
        assert_eq!(config.distro.fallback, "Debian");
        assert_eq!(config.distro.env_var, "WSL_DISTRO_NAME");
        assert_eq!(config.schemes, vec!["http", "https"]);
    }

    #[test]
    fn test_empty_document_gives_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.translation.strategy, StrategyKind::Delegated);
        assert_eq!(config.schemes.len(), 3);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let mut config = Config::default();
        config.schemes.push("mailto:".to_string());
        assert!(matches!(config.validate(), Err(OpenError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_program() {
        let mut config = Config::default();
        config.handlers.file_browser.program = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_distro_fallback_when_unset() {
        let distro = DistroConfig {
            env_var: "XDG_OPEN_WSL_TEST_UNSET_DISTRO".to_string(),
            fallback: "Placeholder".to_string(),
        };
        assert_eq!(distro.current(), "Placeholder");
    }

    #[test]
    fn test_distro_read_on_every_call() {
        use std::cell::RefCell;

        let distro = DistroConfig {
            env_var: "XDG_OPEN_WSL_TEST_DISTRO".to_string(),
            fallback: "Placeholder".to_string(),
        };
        let value = RefCell::new(Some("Ubuntu-20.04".to_string()));
        let lookup = |name: &str| {
            assert_eq!(name, "XDG_OPEN_WSL_TEST_DISTRO");
            value.borrow().clone()
        };

        assert_eq!(distro.resolve(lookup), "Ubuntu-20.04");
        *value.borrow_mut() = Some(" Debian\n".to_string());
        assert_eq!(distro.resolve(lookup), "Debian");
        *value.borrow_mut() = Some(String::new());
        assert_eq!(distro.resolve(lookup), "Placeholder");
        *value.borrow_mut() = None;
        assert_eq!(distro.resolve(lookup), "Placeholder");
    }
}
