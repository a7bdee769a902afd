use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::domain::AppError;
use crate::services::atomic_write;

pub const BINARY_NAME: &str = "zap2xml-manager";
pub const DEFAULT_PREFIX: &str = "/opt/zap2xml-manager";
pub const DEFAULT_BIN_DIR: &str = "/usr/local/bin";

#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Binary to install, normally the running executable.
    pub source: PathBuf,
    pub prefix: PathBuf,
    pub bin_dir: PathBuf,
    /// Replace a regular file sitting where the symlink goes.
    pub force: bool,
}

impl InstallOptions {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            prefix: PathBuf::from(DEFAULT_PREFIX),
            bin_dir: PathBuf::from(DEFAULT_BIN_DIR),
            force: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub binary_path: PathBuf,
    pub link_path: PathBuf,
    /// An older link or file was replaced.
    pub replaced_link: bool,
}

pub fn execute(options: &InstallOptions) -> Result<InstallOutcome, AppError> {
    let install_bin = options.prefix.join("bin");
    let binary_path = install_bin.join(BINARY_NAME);
    let link_path = options.bin_dir.join(BINARY_NAME);

    create_dir(&install_bin)?;
    create_dir(&options.bin_dir)?;

    let content = fs::read(&options.source)?;
    atomic_write(&binary_path, &content, Some(0o755)).map_err(|e| with_path(e, &binary_path))?;
    info!("Installed {} to {}", options.source.display(), binary_path.display());

    let replaced_link = replace_link(&binary_path, &link_path, options.force)?;
    info!("Linked {} -> {}", link_path.display(), binary_path.display());

    Ok(InstallOutcome { binary_path, link_path, replaced_link })
}

fn create_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir).map_err(|e| with_path(e.into(), dir))
}

/// Point `link` at `target`, returning whether something was already there.
fn replace_link(target: &Path, link: &Path, force: bool) -> Result<bool, AppError> {
    let existing = match fs::symlink_metadata(link) {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(with_path(e.into(), link)),
    };

    if let Some(meta) = &existing {
        if !meta.file_type().is_symlink() && (meta.is_dir() || !force) {
            return Err(AppError::LinkConflict(link.to_path_buf()));
        }
        fs::remove_file(link).map_err(|e| with_path(e.into(), link))?;
    }

    symlink(target, link).map_err(|e| with_path(e.into(), link))?;
    Ok(existing.is_some())
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

fn with_path(error: AppError, path: &Path) -> AppError {
    match error {
        AppError::Io(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            AppError::PermissionDenied { path: path.to_path_buf() }
        }
        other => other,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(dir: &TempDir) -> InstallOptions {
        let source = dir.path().join("build").join("zap2xml-manager");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, b"#!/bin/sh\necho zap2xml\n").unwrap();
        InstallOptions {
            source,
            prefix: dir.path().join("opt"),
            bin_dir: dir.path().join("bin"),
            force: false,
        }
    }

    #[test]
    fn installs_executable_and_link() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let opts = options(&dir);

        let outcome = execute(&opts).unwrap();

        assert_eq!(outcome.binary_path, dir.path().join("opt/bin/zap2xml-manager"));
        assert!(!outcome.replaced_link);
        let mode = fs::metadata(&outcome.binary_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(fs::read_link(&outcome.link_path).unwrap(), outcome.binary_path);
        assert_eq!(
            fs::read(&outcome.link_path).unwrap(),
            b"#!/bin/sh\necho zap2xml\n".to_vec()
        );
    }

    #[test]
    fn repeated_install_keeps_same_target() {
        let dir = TempDir::new().unwrap();
        let opts = options(&dir);

        let first = execute(&opts).unwrap();
        let second = execute(&opts).unwrap();

        assert!(second.replaced_link);
        assert_eq!(
            fs::read_link(&first.link_path).unwrap(),
            fs::read_link(&second.link_path).unwrap()
        );
    }

    #[test]
    fn regular_file_at_link_path_needs_force() {
        let dir = TempDir::new().unwrap();
        let mut opts = options(&dir);
        fs::create_dir_all(&opts.bin_dir).unwrap();
        fs::write(opts.bin_dir.join(BINARY_NAME), "stale").unwrap();

        let err = execute(&opts).unwrap_err();
        assert!(matches!(err, AppError::LinkConflict(_)));

        opts.force = true;
        let outcome = execute(&opts).unwrap();
        assert!(outcome.replaced_link);
        assert!(fs::symlink_metadata(&outcome.link_path).unwrap().file_type().is_symlink());
    }

    #[test]
    fn missing_source_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut opts = options(&dir);
        opts.source = dir.path().join("nope");

        assert!(matches!(execute(&opts), Err(AppError::Io(_))));
    }
}
