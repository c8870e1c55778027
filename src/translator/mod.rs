//! Linux path to Windows path translation
//!
//! A path handed to `xdg-open` lives either on a Windows drive mounted into
//! the Linux environment (`/mnt/c/...`) or on the Linux filesystem itself.
//! The first kind becomes a drive-letter path (`C:\...`), the second a UNC
//! locator into the distro (`\\wsl$\<distro>\...`).
//!
//! Translation always resolves the path first: relative paths are made
//! absolute and every symlink is followed, so Windows is pointed at the file
//! that actually exists on disk.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::config::{StrategyKind, TranslationConfig};
use crate::error::{OpenError, Result};

/// Prefix stripped from `file://` URIs before resolution
pub const FILE_URI_PREFIX: &str = "file://";

/// Network locator Windows uses to reach files inside a distro
pub const WSL_UNC_ROOT: &str = r"\\wsl$\";

/// A Linux directory under which a Windows drive is visible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountMapping {
    /// e.g. `/mnt/c/`
    pub linux_prefix: String,
    /// e.g. `C:/`
    pub windows_prefix: String,
}

impl MountMapping {
    pub fn new(linux_prefix: impl Into<String>, windows_prefix: impl Into<String>) -> Self {
        Self {
            linux_prefix: linux_prefix.into(),
            windows_prefix: windows_prefix.into(),
        }
    }
}

/// Windows-addressable path handed to a Windows program
///
/// Never contains a forward slash. It is a terminal representation: feeding
/// it back into translation is meaningless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowsPath(String);

impl WindowsPath {
    fn from_slashed(path: &str) -> Self {
        Self(path.replace('/', "\\"))
    }

    fn in_distro(path: &str, distro: &str) -> Self {
        Self(format!("{WSL_UNC_ROOT}{distro}{}", path.replace('/', "\\")))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the path is a network locator rather than a drive-letter path
    #[must_use]
    pub fn is_unc(&self) -> bool {
        self.0.starts_with(r"\\")
    }
}

impl fmt::Display for WindowsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip a leading `file://` from the argument
#[must_use]
pub fn strip_file_uri(input: &str) -> &str {
    input.strip_prefix(FILE_URI_PREFIX).unwrap_or(input)
}

/// Resolve the argument to its canonical absolute form
///
/// # Errors
/// Returns [`OpenError::Resolve`] if the path or any link target does not
/// exist or cannot be read
pub async fn canonicalize(input: &str) -> Result<PathBuf> {
    let path = PathBuf::from(strip_file_uri(input));
    let canonical = tokio::fs::canonicalize(&path)
        .await
        .map_err(|source| OpenError::Resolve {
            path: path.clone(),
            source,
        })?;
    debug!("Resolved {:?} -> {:?}", input, canonical);
    Ok(canonical)
}

/// Map an already canonical path through a mount table
///
/// The first mapping whose Linux prefix starts the path wins and its prefix
/// is replaced exactly once. Paths under no mapping are addressed through
/// the distro's network locator.
#[must_use]
pub fn map_through_mounts(canonical: &str, distro: &str, mounts: &[MountMapping]) -> WindowsPath {
    let native = mounts.iter().find_map(|mount| {
        canonical
            .strip_prefix(mount.linux_prefix.as_str())
            .map(|rest| format!("{}{rest}", mount.windows_prefix))
    });

    match native {
        Some(path) => WindowsPath::from_slashed(&path),
        None => WindowsPath::in_distro(canonical, distro),
    }
}

/// Translate an argument with a static mount table
///
/// Resolution is strict: the path must exist, so `/tmp/remote-loc.txt`
/// only translates to `\\wsl$\<distro>\tmp\remote-loc.txt` while that file
/// is present. [`map_through_mounts`] maps an already canonical path without
/// touching the filesystem.
///
/// # Errors
/// Returns a translation error if the path cannot be resolved
pub async fn translate(input: &str, distro: &str, mounts: &[MountMapping]) -> Result<WindowsPath> {
    PathTranslationStrategy::MountTable(mounts.to_vec())
        .translate(input, distro)
        .await
}

/// How canonical paths are turned into Windows paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathTranslationStrategy {
    /// Ask the host's path translation utility (`wslpath -w`), which knows
    /// the live mount layout
    Delegated { wslpath: PathBuf },
    /// Look the path up in a fixed, ordered mount table
    MountTable(Vec<MountMapping>),
}

impl PathTranslationStrategy {
    #[must_use]
    pub fn from_config(config: &TranslationConfig) -> Self {
        match config.strategy {
            StrategyKind::Delegated => Self::Delegated {
                wslpath: PathBuf::from(&config.wslpath),
            },
            StrategyKind::MountTable => Self::MountTable(config.mounts.clone()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Delegated { .. } => "delegated",
            Self::MountTable(_) => "mount-table",
        }
    }

    /// Strip, resolve and translate an argument
    ///
    /// `distro` is only used by the mount table strategy for paths that live
    /// on the Linux side.
    ///
    /// # Errors
    /// Returns a translation error if resolution or the external utility
    /// fails
    pub async fn translate(&self, input: &str, distro: &str) -> Result<WindowsPath> {
        let canonical = canonicalize(input).await?;
        self.to_windows(&canonical, distro).await
    }

    /// Translate a path that is already canonical
    ///
    /// # Errors
    /// Returns a translation error if the path is not Unicode or the external
    /// utility fails
    pub async fn to_windows(&self, canonical: &Path, distro: &str) -> Result<WindowsPath> {
        let windows = match self {
            Self::MountTable(mounts) => {
                let path = canonical.to_str().ok_or_else(|| OpenError::NonUnicodePath {
                    path: canonical.to_path_buf(),
                })?;
                map_through_mounts(path, distro, mounts)
            }
            Self::Delegated { wslpath } => run_wslpath(wslpath, canonical).await?,
        };
        debug!("Translated {:?} -> {} ({})", canonical, windows, self.name());
        Ok(windows)
    }
}

async fn run_wslpath(wslpath: &Path, canonical: &Path) -> Result<WindowsPath> {
    let output = Command::new(wslpath)
        .arg("-w")
        .arg(canonical)
        .output()
        .await
        .map_err(|source| OpenError::TranslatorSpawn {
            program: wslpath.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(OpenError::TranslatorFailed {
            program: wslpath.to_path_buf(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let unusable = || OpenError::TranslatorOutput {
        program: wslpath.to_path_buf(),
        path: canonical.to_path_buf(),
    };
    let stdout = String::from_utf8(output.stdout).map_err(|_| unusable())?;
    let translated = stdout.trim_end_matches(['\r', '\n']);
    if translated.is_empty() {
        return Err(unusable());
    }

    Ok(WindowsPath::from_slashed(translated))
}
