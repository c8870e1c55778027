//! End-to-end verification of the open flow
//!
//! These tests drive `open` with a recording launcher, so the launch command
//! that would reach Windows is checked without needing Windows.

use std::cell::RefCell;
use std::path::PathBuf;
use xdg_open_wsl::config::{Config, Handler};
use xdg_open_wsl::launcher::Executables;
use xdg_open_wsl::{
    open, Branch, Dispatcher, LaunchOutcome, LaunchSpec, MountMapping, PathTranslationStrategy,
    ProcessLauncher, Result,
};

/// Launcher that records what it was asked to run
struct RecordingLauncher {
    launched: RefCell<Vec<LaunchSpec>>,
    code: i32,
}

impl RecordingLauncher {
    fn exiting_with(code: i32) -> Self {
        Self {
            launched: RefCell::new(Vec::new()),
            code,
        }
    }
}

impl ProcessLauncher for RecordingLauncher {
    async fn launch(&self, spec: &LaunchSpec) -> Result<LaunchOutcome> {
        self.launched.borrow_mut().push(spec.clone());
        Ok(LaunchOutcome {
            code: Some(self.code),
        })
    }
}

fn dispatcher(config: &Config, mounts: Vec<MountMapping>) -> Dispatcher {
    Dispatcher::new(
        config,
        Executables {
            command_shell: PathBuf::from("/mnt/c/Windows/System32/cmd.exe"),
            file_browser: PathBuf::from("/mnt/c/Windows/explorer.exe"),
        },
    )
    .with_strategy(PathTranslationStrategy::MountTable(mounts))
}

/// Test the URL branch
#[cfg(test)]
mod url_tests {
    use super::*;

    #[tokio::test]
    async fn test_web_urls_go_through_command_shell() {
        let d = dispatcher(&Config::default(), Vec::new());
        let launcher = RecordingLauncher::exiting_with(0);

        for url in ["http://example.com", "https://example.com/a?b=1&c=(2)"] {
            let outcome = open(&d, &launcher, url).await.unwrap();
            assert!(outcome.success());
        }

        let launched = launcher.launched.borrow();
        assert_eq!(launched.len(), 2);
        assert!(launched.iter().all(|s| s.branch() == Branch::Url));
        assert_eq!(
            launched[1].argv(),
            vec![
                "/mnt/c/Windows/System32/cmd.exe",
                "/c",
                "start",
                "",
                "https://example.com/a?b=1^&c=^(2^)",
            ]
        );
    }

    #[tokio::test]
    async fn test_zotero_links_are_urls() {
        let d = dispatcher(&Config::default(), Vec::new());
        let launcher = RecordingLauncher::exiting_with(0);

        open(&d, &launcher, "zotero://select/library/items/ABCD1234")
            .await
            .unwrap();

        let launched = launcher.launched.borrow();
        assert_eq!(launched[0].branch(), Branch::Url);
        assert_eq!(launched[0].args()[3], "zotero://select/library/items/ABCD1234");
    }

    #[tokio::test]
    async fn test_custom_scheme_list() {
        let mut config = Config::default();
        config.schemes.push("evernote".to_string());
        let d = dispatcher(&config, Vec::new());

        assert_eq!(d.classify("evernote:///view/123"), Branch::Url);
        assert_eq!(d.classify("ftp://example.com"), Branch::File);
    }
}

/// Test the file branch
#[cfg(test)]
mod file_tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_linux_file_goes_to_file_browser() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("notes & plans.txt");
        std::fs::write(&file, b"x").unwrap();
        let canonical = std::fs::canonicalize(&file).unwrap();

        let mut config = Config::default();
        config.distro.env_var = "XDG_OPEN_WSL_E2E_UNSET_DISTRO".to_string();
        config.distro.fallback = "Ubuntu-20.04".to_string();
        let d = dispatcher(&config, Vec::new());
        let launcher = RecordingLauncher::exiting_with(1);

        let outcome = open(&d, &launcher, file.to_str().unwrap()).await.unwrap();
        assert_eq!(outcome.exit_code(), 1);

        let launched = launcher.launched.borrow();
        let spec = &launched[0];
        assert_eq!(spec.branch(), Branch::File);
        assert_eq!(spec.program(), &PathBuf::from("/mnt/c/Windows/explorer.exe"));
        let expected = format!(r"\\wsl$\Ubuntu-20.04{}", canonical.display()).replace('/', "\\");
        assert_eq!(spec.args(), &[expected]);
    }

    #[tokio::test]
    async fn test_mounted_file_uses_drive_letter() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("mydoc.pdf"), b"%PDF").unwrap();
        let prefix = format!("{}/", std::fs::canonicalize(dir.path()).unwrap().display());

        let d = dispatcher(&Config::default(), vec![MountMapping::new(prefix, "C:/")]);
        let launcher = RecordingLauncher::exiting_with(0);
        let uri = format!("file://{}/mydoc.pdf", dir.path().display());

        open(&d, &launcher, &uri).await.unwrap();

        let launched = launcher.launched.borrow();
        assert_eq!(launched[0].args(), &[r"C:\mydoc.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_file_through_command_shell_is_escaped() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a&b.txt"), b"x").unwrap();
        let prefix = format!("{}/", std::fs::canonicalize(dir.path()).unwrap().display());

        let mut config = Config::default();
        config.handlers.file = Handler::CommandShell;
        let d = dispatcher(&config, vec![MountMapping::new(prefix, "C:/")]);
        let launcher = RecordingLauncher::exiting_with(0);

        open(&d, &launcher, dir.path().join("a&b.txt").to_str().unwrap())
            .await
            .unwrap();

        let launched = launcher.launched.borrow();
        assert_eq!(
            launched[0].argv(),
            vec!["/mnt/c/Windows/System32/cmd.exe", "/c", "start", "", r"C:\a^&b.txt"]
        );
    }

    #[tokio::test]
    async fn test_translation_failure_launches_nothing() {
        let d = dispatcher(&Config::default(), Vec::new());
        let launcher = RecordingLauncher::exiting_with(0);

        let err = open(&d, &launcher, "/no/such/file/for/xdg-open-wsl.pdf")
            .await
            .unwrap_err();

        assert!(err.is_translation());
        assert_eq!(err.exit_code(), 2);
        assert!(launcher.launched.borrow().is_empty());
    }
}

/// Test the real process launcher
#[cfg(all(test, unix))]
mod launcher_tests {
    use super::*;
    use xdg_open_wsl::launcher::SystemLauncher;
    use xdg_open_wsl::OpenError;

    #[tokio::test]
    async fn test_exit_status_propagated() {
        let spec = LaunchSpec::new(
            Branch::File,
            "sh",
            vec!["-c".to_string(), "exit 7".to_string()],
        );
        let outcome = SystemLauncher.launch(&spec).await.unwrap();
        assert_eq!(outcome.code, Some(7));
        assert_eq!(outcome.exit_code(), 7);
    }

    #[tokio::test]
    async fn test_successful_launch() {
        let spec = LaunchSpec::new(Branch::Url, "true", Vec::new());
        let outcome = SystemLauncher.launch(&spec).await.unwrap();
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn test_missing_executable_is_launch_error() {
        let spec = LaunchSpec::new(Branch::File, "/nonexistent/explorer.exe", Vec::new());
        let err = SystemLauncher.launch(&spec).await.unwrap_err();
        assert!(matches!(err, OpenError::Launch { .. }));
        assert_eq!(err.exit_code(), 3);
    }
}

/// Property tests for cmd.exe escaping
#[cfg(test)]
mod escape_properties {
    use proptest::prelude::*;
    use xdg_open_wsl::escape::{escape_argument, escape_for_cmd_exe, is_cmd_meta};

    /// Undo caret escaping, failing on any unescaped meta-character
    fn unescape(escaped: &str) -> Option<String> {
        let mut out = String::new();
        let mut chars = escaped.chars();
        while let Some(c) = chars.next() {
            if c == '^' {
                let next = chars.next()?;
                if !is_cmd_meta(next) {
                    return None;
                }
                out.push(next);
            } else if is_cmd_meta(c) {
                return None;
            } else {
                out.push(c);
            }
        }
        Some(out)
    }

    proptest! {
        #[test]
        fn escaping_is_deterministic(s in ".*") {
            prop_assert_eq!(escape_argument(&s), escape_argument(&s));
        }

        #[test]
        fn safe_strings_unchanged(s in "[A-Za-z0-9_./:=?#@~+,-]+") {
            prop_assert_eq!(escape_argument(&s), s);
        }

        #[test]
        fn no_meta_char_left_unescaped(s in ".+") {
            prop_assert!(unescape(&escape_argument(&s)).is_some());
        }

        #[test]
        fn caret_escaping_is_reversible(s in ".*") {
            prop_assert_eq!(unescape(&escape_for_cmd_exe(&s)), Some(s));
        }

        #[test]
        fn quoted_when_whitespace(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            let arg = format!("{a} {b}");
            prop_assert_eq!(escape_argument(&arg), format!("^\"{a} {b}^\""));
        }
    }
}
