//! macOS disk image handling.
//!
//! A mounted volume is owned by a [`MountGuard`]; dropping the guard detaches
//! the image, so every return path out of the copy step releases it. The
//! mount directory is only removed after a successful detach, and only while
//! empty.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::error::SetupError;

pub trait ImageMounter {
    fn mount(&self, image: &Path, mountpoint: &Path) -> Result<(), SetupError>;
    fn unmount(&self, mountpoint: &Path) -> Result<(), SetupError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Hdiutil;

impl ImageMounter for Hdiutil {
    fn mount(&self, image: &Path, mountpoint: &Path) -> Result<(), SetupError> {
        let output = Command::new("hdiutil")
            .arg("attach")
            .arg("-quiet")
            .arg(image)
            .arg("-mountpoint")
            .arg(mountpoint)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| SetupError::MountFailure(format!("failed to run hdiutil: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SetupError::MountFailure(format!(
                "hdiutil attach {} failed with status {}: {}",
                image.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn unmount(&self, mountpoint: &Path) -> Result<(), SetupError> {
        let output = Command::new("hdiutil")
            .arg("detach")
            .arg("-quiet")
            .arg(mountpoint)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| SetupError::MountFailure(format!("failed to run hdiutil: {err}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SetupError::MountFailure(format!(
                "hdiutil detach {} failed with status {}: {}",
                mountpoint.display(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

pub struct MountGuard<'a> {
    mounter: &'a dyn ImageMounter,
    mountpoint: PathBuf,
}

impl<'a> MountGuard<'a> {
    pub fn mount(
        mounter: &'a dyn ImageMounter,
        image: &Path,
        mountpoint: PathBuf,
    ) -> Result<Self, SetupError> {
        fs::create_dir_all(&mountpoint)?;
        if let Err(err) = mounter.mount(image, &mountpoint) {
            let _ = fs::remove_dir(&mountpoint);
            return Err(err);
        }
        debug!("mounted {} at {}", image.display(), mountpoint.display());
        Ok(MountGuard {
            mounter,
            mountpoint,
        })
    }

    pub fn path(&self) -> &Path {
        &self.mountpoint
    }
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        match self.mounter.unmount(&self.mountpoint) {
            Ok(()) => {
                debug!("unmounted {}", self.mountpoint.display());
                if let Err(err) = fs::remove_dir(&self.mountpoint) {
                    debug!("left mount directory {}: {err}", self.mountpoint.display());
                }
            }
            Err(err) => warn!(
                "failed to unmount {}: {err}; the volume stays mounted there",
                self.mountpoint.display()
            ),
        }
    }
}

/// Returns the single `.app` bundle at the top level of a mounted volume.
pub fn find_app_bundle(volume: &Path) -> Result<PathBuf, SetupError> {
    let mut bundles = Vec::new();
    for entry in fs::read_dir(volume)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("app") {
            bundles.push(path);
        }
    }
    match bundles.len() {
        1 => Ok(bundles.remove(0)),
        0 => Err(SetupError::MountFailure(format!(
            "no .app bundle found in {}",
            volume.display()
        ))),
        count => Err(SetupError::MountFailure(format!(
            "expected one .app bundle in {}, found {count}",
            volume.display()
        ))),
    }
}

/// Copies a bundle with `ditto` when present, otherwise `cp -R`.
pub fn copy_bundle(source: &Path, destination: &Path) -> Result<(), SetupError> {
    let mut cmd = if which::which("ditto").is_ok() {
        let mut cmd = Command::new("ditto");
        cmd.arg(source).arg(destination);
        cmd
    } else {
        let mut cmd = Command::new("cp");
        cmd.arg("-R").arg(source).arg(destination);
        cmd
    };
    let status = cmd.stdin(Stdio::null()).status()?;
    if !status.success() {
        return Err(SetupError::MountFailure(format!(
            "copying {} to {} failed with status {status}",
            source.display(),
            destination.display()
        )));
    }
    Ok(())
}
