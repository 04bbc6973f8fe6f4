//! Filesystem primitives shared by install and uninstall.

use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::Path;

use crate::error::SetupError;

/// True for anything present at `path`, including dangling symlinks.
pub fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

pub fn ensure_parent(path: &Path) -> Result<(), SetupError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

/// Deletes whatever is at `path` without following symlinks. Returns
/// `Ok(false)` when there was nothing to delete, including when the entry
/// vanished between the lookup and the removal.
pub fn remove_path(path: &Path) -> Result<bool, SetupError> {
    let removal = fs::symlink_metadata(path).and_then(|meta| {
        if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        }
    });
    match removal {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err.into()),
    }
}

/// Points `link` at `target`, replacing a previous link or regular file.
/// A directory in the way is an error rather than something to delete.
pub fn force_symlink(target: &Path, link: &Path) -> Result<(), SetupError> {
    ensure_parent(link)?;
    if fs::symlink_metadata(link).is_ok_and(|meta| meta.is_dir()) {
        return Err(SetupError::Config(format!(
            "refusing to replace directory with symlink: {}",
            link.display()
        )));
    }
    remove_path(link)?;
    symlink(target, link)?;
    Ok(())
}
