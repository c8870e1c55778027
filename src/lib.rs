//! xdg-open-wsl - open Linux files and URLs with their Windows handlers
//!
//! Inside WSL there is no desktop to hand `xdg-open` requests to. This crate
//! routes them to Windows instead: URLs go through `cmd.exe /c start`, files
//! are translated to a Windows path and opened with `explorer.exe`.
//!
//! # Modules
//!
//! - [`dispatcher`]: URL vs. file classification and launch command building
//! - [`translator`]: Linux path to drive-letter or `\\wsl$` path translation
//! - [`escape`]: `cmd.exe` argument escaping
//! - [`launcher`]: process launching and Windows executable discovery
//! - [`config`]: configuration management and serialization
//! - [`logging`]: append-only diagnostic log
//! - [`error`]: error taxonomy and exit codes

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod escape;
pub mod launcher;
pub mod logging;
pub mod translator;

pub use dispatcher::{Branch, Dispatcher, LaunchSpec};
pub use error::{OpenError, Result};
pub use launcher::{LaunchOutcome, ProcessLauncher};
pub use translator::{MountMapping, PathTranslationStrategy, WindowsPath};

use tracing::{error, info, warn};

/// Dispatch one argument and launch the result
///
/// Every step is logged as a self-contained record carrying the argument.
/// Nothing is launched if dispatch fails.
///
/// # Errors
/// Returns a translation error if the argument is an unusable path, or a
/// launch error if the handler cannot be started
pub async fn open<L: ProcessLauncher>(
    dispatcher: &Dispatcher,
    launcher: &L,
    arg: &str,
) -> Result<LaunchOutcome> {
    let spec = match dispatcher.dispatch(arg).await {
        Ok(spec) => spec,
        Err(e) => {
            error!(argument = %arg, "Translation failed: {}", e);
            return Err(e);
        }
    };
    info!(argument = %arg, branch = %spec.branch(), "Dispatching {}", spec);

    let outcome = match launcher.launch(&spec).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(argument = %arg, "Launch failed: {}", e);
            return Err(e);
        }
    };

    if outcome.success() {
        info!(argument = %arg, "Done: {}", outcome);
    } else {
        warn!(argument = %arg, "Done: {} from {}", outcome, spec);
    }
    Ok(outcome)
}
