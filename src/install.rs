//! Install state machine.
//!
//! Stages run strictly in order: resolve platform, resolve channel, acquire
//! the artifact, unpack it, place shared directories, link the CLI, write the
//! desktop launcher (Linux only), report.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::archive::extract_tarball;
use crate::channel::ChannelInfo;
use crate::desktop::write_desktop_entry;
use crate::disk_image::{copy_bundle, find_app_bundle, Hdiutil, ImageMounter, MountGuard};
use crate::error::SetupError;
use crate::fetch::{probe_fetcher, release_url, Fetcher};
use crate::fs_ops::{force_symlink, path_exists, remove_path};
use crate::paths::PathSet;
use crate::platform::{Os, Target};
use crate::settings::Settings;

static HDIUTIL: Hdiutil = Hdiutil;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    ResolvePlatform,
    ResolveChannel,
    AcquireArtifact,
    ExtractOrMount,
    PlacePrimaryFiles,
    LinkExecutable,
    WriteDesktopIntegration,
    ReportOutcome,
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InstallStage::ResolvePlatform => "resolve platform",
            InstallStage::ResolveChannel => "resolve channel",
            InstallStage::AcquireArtifact => "acquire artifact",
            InstallStage::ExtractOrMount => "extract or mount",
            InstallStage::PlacePrimaryFiles => "place primary files",
            InstallStage::LinkExecutable => "link executable",
            InstallStage::WriteDesktopIntegration => "write desktop integration",
            InstallStage::ReportOutcome => "report outcome",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct InstallReport {
    pub target: Target,
    pub channel: ChannelInfo,
    pub app_path: PathBuf,
    pub cli_link: PathBuf,
    pub cli_target: PathBuf,
    pub desktop_file: Option<PathBuf>,
    pub on_path: bool,
    pub stages: Vec<InstallStage>,
}

impl InstallReport {
    /// Text shown to the user once the install has finished.
    pub fn summary_lines(&self, shell: Option<&str>) -> Vec<String> {
        if self.on_path {
            return vec!["Zublime has been installed. Run with 'zublime'".to_string()];
        }
        let mut lines = vec![
            "To run Zublime from your terminal, you must add ~/.local/bin to your PATH".to_string(),
            "Run:".to_string(),
        ];
        match shell.unwrap_or_default() {
            s if s.ends_with("zsh") => {
                lines.push("   echo 'export PATH=$HOME/.local/bin:$PATH' >> ~/.zshrc".to_string());
                lines.push("   source ~/.zshrc".to_string());
            }
            s if s.ends_with("fish") => {
                lines.push("   fish_add_path -U $HOME/.local/bin".to_string());
            }
            _ => {
                lines.push("   echo 'export PATH=$HOME/.local/bin:$PATH' >> ~/.bashrc".to_string());
                lines.push("   source ~/.bashrc".to_string());
            }
        }
        lines.push(format!("To run Zublime now, '{}'", self.cli_link.display()));
        lines
    }
}

pub struct Installer<'a> {
    settings: &'a Settings,
    mounter: &'a dyn ImageMounter,
    fetcher: Option<&'a dyn Fetcher>,
}

impl<'a> Installer<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Installer {
            settings,
            mounter: &HDIUTIL,
            fetcher: None,
        }
    }

    pub fn with_mounter(mut self, mounter: &'a dyn ImageMounter) -> Self {
        self.mounter = mounter;
        self
    }

    /// Uses `fetcher` instead of probing for curl or wget.
    pub fn with_fetcher(mut self, fetcher: &'a dyn Fetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn install(&self, target: Target) -> Result<InstallReport, SetupError> {
        let mut stages = Vec::new();
        enter(&mut stages, InstallStage::ResolvePlatform);
        debug!("installing for {} {}", target.os, target.arch);

        enter(&mut stages, InstallStage::ResolveChannel);
        let channel = ChannelInfo::resolve(&self.settings.channel);
        let paths = PathSet::plan_in(
            &self.settings.home,
            &self.settings.applications_dir,
            target.os,
            &channel,
        );

        let staging = tempfile::Builder::new()
            .prefix("zublime-")
            .tempdir_in(&self.settings.temp_root)?;

        enter(&mut stages, InstallStage::AcquireArtifact);
        let artifact = self.acquire(&channel, target, staging.path())?;

        enter(&mut stages, InstallStage::ExtractOrMount);
        let app_path = match target.os {
            Os::Linux => self.unpack_tarball(&artifact, &paths)?,
            Os::MacOs => self.copy_from_image(&artifact, staging.path(), &paths)?,
        };

        enter(&mut stages, InstallStage::PlacePrimaryFiles);
        fs::create_dir_all(&paths.bin_dir)?;
        if let Some(parent) = paths.desktop.as_ref().and_then(|d| d.destination.parent()) {
            fs::create_dir_all(parent)?;
        }

        enter(&mut stages, InstallStage::LinkExecutable);
        let cli_target = link_executable(&paths, &app_path)?;

        let desktop_file = match &paths.desktop {
            Some(desktop) => {
                enter(&mut stages, InstallStage::WriteDesktopIntegration);
                write_desktop_entry(desktop)?;
                Some(desktop.destination.clone())
            }
            None => None,
        };

        enter(&mut stages, InstallStage::ReportOutcome);
        let on_path = which::which("zublime")
            .map(|found| found == paths.cli_link)
            .unwrap_or(false);

        Ok(InstallReport {
            target,
            channel,
            app_path,
            cli_link: paths.cli_link,
            cli_target,
            desktop_file,
            on_path,
            stages,
        })
    }

    fn acquire(
        &self,
        channel: &ChannelInfo,
        target: Target,
        staging: &Path,
    ) -> Result<PathBuf, SetupError> {
        let file_name = match target.os {
            Os::Linux => format!("zublime-linux-{}.tar.gz", target.arch),
            Os::MacOs => format!("Zublime-{}.dmg", target.arch),
        };
        let artifact = staging.join(file_name);

        if let Some(bundle) = &self.settings.bundle_path {
            info!("Using local bundle {}", bundle.display());
            fs::copy(bundle, &artifact).map_err(|err| {
                SetupError::Config(format!(
                    "failed to copy local bundle {}: {err}",
                    bundle.display()
                ))
            })?;
            return Ok(artifact);
        }

        let url = release_url(
            &self.settings.releases_url,
            channel.requested(),
            &self.settings.version,
            target,
        );
        info!("Downloading Zublime version: {}", self.settings.version);
        match self.fetcher {
            Some(fetcher) => fetcher.fetch(&url, &artifact)?,
            None => probe_fetcher()?.fetch(&url, &artifact)?,
        }
        Ok(artifact)
    }

    fn unpack_tarball(&self, tarball: &Path, paths: &PathSet) -> Result<PathBuf, SetupError> {
        if remove_path(&paths.app_dir)? {
            debug!("removed previous {}", paths.app_dir.display());
        }
        fs::create_dir_all(&paths.app_dir)?;
        extract_tarball(tarball, &paths.install_root)?;
        Ok(paths.app_dir.clone())
    }

    fn copy_from_image(
        &self,
        image: &Path,
        staging: &Path,
        paths: &PathSet,
    ) -> Result<PathBuf, SetupError> {
        let volume = MountGuard::mount(self.mounter, image, mount_dir(staging))?;
        let bundle = find_app_bundle(volume.path())?;
        let Some(name) = bundle.file_name() else {
            return Err(SetupError::MountFailure(format!(
                "invalid bundle path {}",
                bundle.display()
            )));
        };
        let destination = paths.install_root.join(name);
        if destination != paths.app_dir {
            warn!(
                "disk image contains {}, expected {}",
                destination.display(),
                paths.app_dir.display()
            );
        }

        info!("Installing {}", name.to_string_lossy());
        if path_exists(&destination) {
            info!("Removing existing {}", name.to_string_lossy());
            remove_path(&destination)?;
        }
        fs::create_dir_all(&paths.install_root)?;
        copy_bundle(&bundle, &destination)?;
        Ok(destination)
    }
}

/// Sibling of the staging directory, so removing staging never recurses into
/// a volume that failed to detach.
fn mount_dir(staging: &Path) -> PathBuf {
    let mut name = staging.file_name().unwrap_or_default().to_os_string();
    name.push(".mount");
    staging.with_file_name(name)
}

fn enter(stages: &mut Vec<InstallStage>, stage: InstallStage) {
    debug!("install stage: {stage}");
    stages.push(stage);
}

/// Links the CLI entry point of the installed app, falling back to the
/// pre-versioned layout when the current one is absent.
fn link_executable(paths: &PathSet, app_path: &Path) -> Result<PathBuf, SetupError> {
    let candidates = std::iter::once(&paths.cli_target).chain(paths.legacy_cli_target.as_ref());
    for planned in candidates {
        let candidate = rebase(planned, &paths.app_dir, app_path);
        if candidate.is_file() {
            force_symlink(&candidate, &paths.cli_link)?;
            debug!(
                "linked {} -> {}",
                paths.cli_link.display(),
                candidate.display()
            );
            return Ok(candidate);
        }
    }
    Err(SetupError::ExtractionFailure(format!(
        "no CLI entry point found in {}",
        app_path.display()
    )))
}

fn rebase(path: &Path, from: &Path, to: &Path) -> PathBuf {
    match path.strip_prefix(from) {
        Ok(relative) => to.join(relative),
        Err(_) => path.to_path_buf(),
    }
}
