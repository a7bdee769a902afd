use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::domain::AppError;

/// Write `content` to a temporary sibling of `path`, then rename it into
/// place. Readers never observe a partially written file.
///
/// `mode` sets unix permission bits on the new file before the rename.
pub fn atomic_write(path: &Path, content: &[u8], mode: Option<u32>) -> Result<(), AppError> {
    let tmp_path = temp_sibling(path)?;
    let result = write_temp(&tmp_path, content, mode).and_then(|()| fs::rename(&tmp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result.map_err(AppError::from)
}

fn write_temp(tmp_path: &Path, content: &[u8], mode: Option<u32>) -> io::Result<()> {
    fs::write(tmp_path, content)?;

    #[cfg(unix)]
    if let Some(mode) = mode {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp_path, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}

fn temp_sibling(path: &Path) -> Result<PathBuf, AppError> {
    let parent = path.parent().ok_or_else(|| io::Error::other("no parent directory"))?;
    let name = path.file_name().ok_or_else(|| io::Error::other("no file name"))?;
    let suffix: u32 = rand::thread_rng().gen_range(0..=u32::MAX);
    Ok(parent.join(format!(".{}.{:08x}.tmp", name.to_string_lossy(), suffix)))
}
