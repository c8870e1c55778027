//! URL vs. file dispatch
//!
//! Decides how the single `xdg-open` argument reaches Windows.
//!
//! # Branches
//! - Arguments starting with a recognized `scheme:` (http, https, zotero)
//!   are URLs and go through `cmd.exe /c start ""`, which activates URL
//!   handlers more reliably than `explorer.exe`.
//! - Everything else is a path. It is translated to a Windows path and
//!   handed to `explorer.exe`, which resolves file type associations.
//!
//! # Security
//! Whatever is passed through the command shell is escaped for `cmd.exe`
//! first, so characters such as `&` or `|` in a URL cannot start a second
//! command.

use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use crate::config::{Config, DistroConfig, Handler};
use crate::error::Result;
use crate::escape::escape_argument;
use crate::launcher::{locate, Executables};
use crate::translator::PathTranslationStrategy;

/// Which branch an argument was routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Url,
    File,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Branch::Url => f.write_str("url"),
            Branch::File => f.write_str("file"),
        }
    }
}

/// A fully built external process invocation
///
/// Not modified after construction; consumed once by a launcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    branch: Branch,
    program: PathBuf,
    args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(branch: Branch, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            branch,
            program: program.into(),
            args,
        }
    }

    #[must_use]
    pub fn branch(&self) -> Branch {
        self.branch
    }

    #[must_use]
    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Program followed by its arguments
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

impl fmt::Display for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.argv())
    }
}

/// Check whether `arg` starts with `scheme:` (case-sensitive)
#[must_use]
pub fn has_scheme(arg: &str, scheme: &str) -> bool {
    arg.strip_prefix(scheme)
        .is_some_and(|rest| rest.starts_with(':'))
}

/// Routes an argument to a launch command
pub struct Dispatcher {
    schemes: Vec<String>,
    url_handler: Handler,
    file_handler: Handler,
    start_args: Vec<String>,
    executables: Executables,
    strategy: PathTranslationStrategy,
    distro: DistroConfig,
}

impl Dispatcher {
    /// Create a dispatcher with already located executables
    #[must_use]
    pub fn new(config: &Config, executables: Executables) -> Self {
        Self {
            schemes: config.schemes.clone(),
            url_handler: config.handlers.url,
            file_handler: config.handlers.file,
            start_args: config.handlers.start_args.clone(),
            executables,
            strategy: PathTranslationStrategy::from_config(&config.translation),
            distro: config.distro.clone(),
        }
    }

    /// Create a dispatcher, locating `cmd.exe` and `explorer.exe` first
    pub async fn from_config(config: &Config) -> Self {
        let wslpath = &config.translation.wslpath;
        let executables = Executables {
            command_shell: locate(&config.handlers.command_shell, wslpath).await,
            file_browser: locate(&config.handlers.file_browser, wslpath).await,
        };
        Self::new(config, executables)
    }

    /// Replace the translation strategy
    #[must_use]
    pub fn with_strategy(mut self, strategy: PathTranslationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn strategy(&self) -> &PathTranslationStrategy {
        &self.strategy
    }

    /// Classify an argument; never fails
    ///
    /// Anything without a recognized scheme is a path.
    #[must_use]
    pub fn classify(&self, arg: &str) -> Branch {
        if self.schemes.iter().any(|scheme| has_scheme(arg, scheme)) {
            Branch::Url
        } else {
            Branch::File
        }
    }

    /// Build the launch command for an argument
    ///
    /// # Errors
    /// Returns a translation error if `arg` is a path that cannot be
    /// resolved or translated. Nothing should be launched in that case.
    pub async fn dispatch(&self, arg: &str) -> Result<LaunchSpec> {
        let branch = self.classify(arg);
        debug!("Classified {:?} as {}", arg, branch);

        let spec = match branch {
            Branch::Url => self.build(branch, self.url_handler, arg.to_string()),
            Branch::File => {
                let distro = self.distro.current();
                let windows = self.strategy.translate(arg, &distro).await?;
                self.build(branch, self.file_handler, windows.into_string())
            }
        };
        Ok(spec)
    }

    fn build(&self, branch: Branch, handler: Handler, target: String) -> LaunchSpec {
        let (program, args) = match handler {
            Handler::CommandShell => {
                let mut args = self.start_args.clone();
                args.push(escape_argument(&target));
                (self.executables.command_shell.clone(), args)
            }
            Handler::FileBrowser => (self.executables.file_browser.clone(), vec![target]),
        };
        LaunchSpec::new(branch, program, args)
    }
}
