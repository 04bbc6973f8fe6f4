//! Artifact download through an external HTTP client.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::debug;

use crate::error::SetupError;
use crate::fs_ops::ensure_parent;
use crate::platform::Target;

pub trait Fetcher {
    fn name(&self) -> &'static str;
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), SetupError>;
}

#[derive(Debug, Clone)]
pub struct Curl {
    program: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Wget {
    program: PathBuf,
}

impl Curl {
    pub fn new(program: PathBuf) -> Self {
        Curl { program }
    }
}

impl Wget {
    pub fn new(program: PathBuf) -> Self {
        Wget { program }
    }
}

impl Fetcher for Curl {
    fn name(&self) -> &'static str {
        "curl"
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<(), SetupError> {
        ensure_parent(dest)?;
        let mut cmd = Command::new(&self.program);
        cmd.arg("-fL").arg("-o").arg(dest).arg(url);
        run_download(cmd, url)
    }
}

impl Fetcher for Wget {
    fn name(&self) -> &'static str {
        "wget"
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<(), SetupError> {
        ensure_parent(dest)?;
        let mut cmd = Command::new(&self.program);
        cmd.arg("-O").arg(dest).arg(url);
        run_download(cmd, url)
    }
}

fn run_download(mut cmd: Command, url: &str) -> Result<(), SetupError> {
    let status = cmd
        .stdin(Stdio::null())
        .status()
        .map_err(|err| SetupError::DownloadFailure {
            url: url.to_string(),
            reason: format!("failed to run {}: {err}", program_name(&cmd)),
        })?;
    if !status.success() {
        return Err(SetupError::DownloadFailure {
            url: url.to_string(),
            reason: format!("{} exited with {status}", program_name(&cmd)),
        });
    }
    Ok(())
}

fn program_name(cmd: &Command) -> String {
    Path::new(cmd.get_program())
        .file_name()
        .unwrap_or(OsStr::new("http client"))
        .to_string_lossy()
        .to_string()
}

/// Picks the first available client in priority order: curl, then wget.
pub fn probe_fetcher() -> Result<Box<dyn Fetcher>, SetupError> {
    select_fetcher(|program| which::which(program).ok())
}

/// Probes a specific search path instead of `$PATH`.
#[cfg(test)]
fn probe_fetcher_in(search_path: &OsStr) -> Result<Box<dyn Fetcher>, SetupError> {
    let cwd = std::env::current_dir()?;
    select_fetcher(|program| which::which_in(program, Some(search_path), &cwd).ok())
}

fn select_fetcher<F>(locate: F) -> Result<Box<dyn Fetcher>, SetupError>
where
    F: Fn(&str) -> Option<PathBuf>,
{
    if let Some(program) = locate("curl") {
        debug!("using curl at {}", program.display());
        return Ok(Box::new(Curl::new(program)));
    }
    if let Some(program) = locate("wget") {
        debug!("using wget at {}", program.display());
        return Ok(Box::new(Wget::new(program)));
    }
    Err(SetupError::MissingHttpClient)
}

pub fn release_url(base: &str, channel: &str, version: &str, target: Target) -> String {
    format!(
        "{}/{channel}/{version}/download?asset=zublime&arch={}&os={}&source=install.sh",
        base.trim_end_matches('/'),
        target.arch,
        target.os
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, Os};
    use std::fs;
    #[cfg(unix)]
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    #[cfg(unix)]
    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn release_url_encodes_channel_version_and_target() {
        let target = Target {
            os: Os::Linux,
            arch: Arch::Aarch64,
        };
        assert_eq!(
            release_url("https://cloud.zublime.dev/releases/", "nightly", "latest", target),
            "https://cloud.zublime.dev/releases/nightly/latest/download?asset=zublime&arch=aarch64&os=linux&source=install.sh"
        );
    }

    #[cfg(unix)]
    #[test]
    fn probe_prefers_curl_over_wget() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "wget", "exit 0");
        write_script(dir.path(), "curl", "exit 0");
        let fetcher = probe_fetcher_in(dir.path().as_os_str()).unwrap();
        assert_eq!(fetcher.name(), "curl");
    }

    #[cfg(unix)]
    #[test]
    fn probe_falls_back_to_wget() {
        let dir = tempdir().unwrap();
        write_script(dir.path(), "wget", "exit 0");
        let fetcher = probe_fetcher_in(dir.path().as_os_str()).unwrap();
        assert_eq!(fetcher.name(), "wget");
    }

    #[test]
    fn probe_without_clients_is_missing_http_client() {
        let dir = tempdir().unwrap();
        let err = match probe_fetcher_in(dir.path().as_os_str()) {
            Ok(fetcher) => panic!("unexpected fetcher {}", fetcher.name()),
            Err(err) => err,
        };
        assert!(matches!(err, SetupError::MissingHttpClient));
    }

    #[cfg(unix)]
    #[test]
    fn failing_client_is_download_failure() {
        let dir = tempdir().unwrap();
        let program = write_script(dir.path(), "curl", "exit 22");
        let err = Curl::new(program)
            .fetch("https://example.invalid/a.tar.gz", &dir.path().join("out"))
            .unwrap_err();
        match err {
            SetupError::DownloadFailure { url, .. } => {
                assert_eq!(url, "https://example.invalid/a.tar.gz")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn wget_writes_to_requested_destination() {
        let dir = tempdir().unwrap();
        // Fake wget: `-O <dest> <url>`
        let program = write_script(dir.path(), "wget", "printf '%s' \"$3\" > \"$2\"");
        let dest = dir.path().join("nested").join("artifact");
        Wget::new(program)
            .fetch("https://example.invalid/artifact", &dest)
            .unwrap();
        assert_eq!(
            fs::read_to_string(&dest).unwrap(),
            "https://example.invalid/artifact"
        );
    }
}
