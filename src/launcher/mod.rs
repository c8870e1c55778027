use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::ExecutableConfig;
use crate::dispatcher::LaunchSpec;
use crate::error::{OpenError, Result};

/// Located Windows executables, as Linux-side paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executables {
    pub command_shell: PathBuf,
    pub file_browser: PathBuf,
}

/// How a launched process finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchOutcome {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
}

impl LaunchOutcome {
    #[must_use]
    pub fn from_status(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code to report for this invocation
    ///
    /// Codes that do not fit in a byte and signal terminations become 1.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self.code {
            Some(0) => 0,
            Some(code) => u8::try_from(code).unwrap_or(1),
            None => 1,
        }
    }
}

impl fmt::Display for LaunchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Runs a [`LaunchSpec`] and waits for it
#[allow(async_fn_in_trait)]
pub trait ProcessLauncher {
    /// Launch the command and wait for completion
    ///
    /// # Errors
    /// Returns [`OpenError::Launch`] if the executable cannot be started
    async fn launch(&self, spec: &LaunchSpec) -> Result<LaunchOutcome>;
}

/// Spawns the real Windows executable through WSL interop
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    async fn launch(&self, spec: &LaunchSpec) -> Result<LaunchOutcome> {
        info!("Launching {}", spec);

        let status = Command::new(spec.program())
            .args(spec.args())
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| OpenError::Launch {
                program: spec.program().clone(),
                source,
            })?;

        Ok(LaunchOutcome::from_status(status))
    }
}

/// Prints the command instead of running it
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunLauncher;

impl ProcessLauncher for DryRunLauncher {
    async fn launch(&self, spec: &LaunchSpec) -> Result<LaunchOutcome> {
        println!("{}", spec.argv().join(" "));
        Ok(LaunchOutcome { code: Some(0) })
    }
}

/// Find a Windows executable from the Linux side
///
/// Explicit paths are used as given. Bare names are searched on `PATH`, then
/// the configured native location is converted with `wslpath -u`. When all
/// of that fails the bare name is returned and launching it reports the
/// error.
pub async fn locate(exe: &ExecutableConfig, wslpath: &str) -> PathBuf {
    let program = Path::new(&exe.program);
    if program.components().count() > 1 {
        return program.to_path_buf();
    }

    if let Ok(found) = which::which(program) {
        debug!("Found {} at {:?}", exe.program, found);
        return found;
    }

    if let Some(native) = &exe.native_path {
        match native_to_linux(wslpath, native).await {
            Some(path) if path.exists() => {
                debug!("Found {} at {:?} via {}", exe.program, path, wslpath);
                return path;
            }
            _ => warn!("Could not locate {} through {} {:?}", exe.program, wslpath, native),
        }
    }

    program.to_path_buf()
}

async fn native_to_linux(wslpath: &str, native: &str) -> Option<PathBuf> {
    let output = Command::new(wslpath)
        .arg("-u")
        .arg(native)
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8(output.stdout).ok()?;
    let path = stdout.trim_end_matches(['\r', '\n']);
    (!path.is_empty()).then(|| PathBuf::from(path))
}
