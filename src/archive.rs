use std::fs::{self, File};
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::error::SetupError;

/// Unpacks a gzip-compressed tarball into `destination_dir`.
pub fn extract_tarball(tarball: &Path, destination_dir: &Path) -> Result<(), SetupError> {
    fs::create_dir_all(destination_dir)?;
    let file = File::open(tarball).map_err(|err| {
        SetupError::ExtractionFailure(format!("failed to open {}: {err}", tarball.display()))
    })?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.unpack(destination_dir).map_err(|err| {
        SetupError::ExtractionFailure(format!(
            "failed to unpack {} into {}: {err}",
            tarball.display(),
            destination_dir.display()
        ))
    })
}
