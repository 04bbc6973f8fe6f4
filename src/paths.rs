//! Filesystem layout for one channel's installation.
//!
//! Planning is a pure function of its inputs: no path is created, read or
//! canonicalized here. Other tools (the editor and its updater) depend on
//! these exact paths.

use std::path::{Path, PathBuf};

use crate::channel::{Channel, ChannelInfo};
use crate::platform::Os;
use crate::settings::DEFAULT_APPLICATIONS_DIR;

const CLI_NAME: &str = "zublime";
const LINUX_APP_PREFIX: &str = "zublime";
const MACOS_APP_PREFIX: &str = "Zublime";
const APP_EXTENSION: &str = ".app";
const LINUX_SHARED_DIR: &str = "zublime";
const MACOS_SHARED_DIR: &str = "Zublime";
const SOCKET_PREFIX: &str = "zed";
const PREFERENCES_DIR: &str = "zublime";
const LEGACY_SERVER_DIR: &str = ".zed_server";
const RECENT_DOCUMENTS_DIR: &str =
    "com.apple.sharedfilelist/com.apple.LSSharedFileList.ApplicationRecentDocuments";

/// Desktop launcher copied out of the installed app directory (Linux only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopEntryPaths {
    pub template: PathBuf,
    pub destination: PathBuf,
    pub icon: PathBuf,
    pub exec: PathBuf,
}

/// Directory entries whose file name starts with `prefix` and ends with
/// `suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPattern {
    pub dir: PathBuf,
    pub prefix: String,
    pub suffix: String,
}

impl EntryPattern {
    pub fn matches(&self, file_name: &str) -> bool {
        file_name.len() >= self.prefix.len() + self.suffix.len()
            && file_name.starts_with(&self.prefix)
            && file_name.ends_with(&self.suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSet {
    pub os: Os,
    pub install_root: PathBuf,
    pub app_dir: PathBuf,
    pub bin_dir: PathBuf,
    pub cli_link: PathBuf,
    pub cli_target: PathBuf,
    pub legacy_cli_target: Option<PathBuf>,
    pub desktop: Option<DesktopEntryPaths>,
    pub shared_root: PathBuf,
    pub db_dir: PathBuf,
    pub socket: Option<PathBuf>,
    pub preferences_dir: PathBuf,
    pub legacy_server_dir: PathBuf,
    /// Shared state outside `shared_root`, for every channel.
    pub auxiliary_state: Vec<PathBuf>,
    pub recent_documents: Vec<EntryPattern>,
    pub installations: EntryPattern,
}

impl PathSet {
    pub fn plan(home: &Path, os: Os, channel: &ChannelInfo) -> Self {
        PathSet::plan_in(home, Path::new(DEFAULT_APPLICATIONS_DIR), os, channel)
    }

    /// Same as [`PathSet::plan`] with the macOS applications root supplied by
    /// the caller.
    pub fn plan_in(home: &Path, applications_dir: &Path, os: Os, channel: &ChannelInfo) -> Self {
        match os {
            Os::Linux => plan_linux(home, channel),
            Os::MacOs => plan_macos(home, applications_dir, channel),
        }
    }

    /// Paths removed for this channel alone, in removal order.
    pub fn per_channel_artifacts(&self) -> Vec<&Path> {
        let mut paths = vec![self.app_dir.as_path()];
        if self.os == Os::Linux {
            paths.push(self.cli_link.as_path());
        }
        if let Some(desktop) = &self.desktop {
            paths.push(desktop.destination.as_path());
        }
        paths.push(self.db_dir.as_path());
        if let Some(socket) = &self.socket {
            paths.push(socket.as_path());
        }
        paths
    }

    /// Per-channel artifacts named after the application identifier or
    /// display name rather than the channel suffix. An unrecognized channel
    /// borrows stable's identifiers, so these belong to stable in that case.
    pub fn identifier_keyed_artifacts(&self) -> Vec<&Path> {
        match self.os {
            Os::Linux => self
                .desktop
                .iter()
                .map(|desktop| desktop.destination.as_path())
                .collect(),
            Os::MacOs => vec![self.app_dir.as_path()],
        }
    }
}

fn plan_linux(home: &Path, channel: &ChannelInfo) -> PathSet {
    let local = home.join(".local");
    let app_dir = local.join(format!(
        "{LINUX_APP_PREFIX}{}{APP_EXTENSION}",
        channel.path_suffix()
    ));
    let bin_dir = local.join("bin");
    let shared_root = local.join("share").join(LINUX_SHARED_DIR);
    let state = channel.state_suffix();

    let desktop = DesktopEntryPaths {
        template: app_dir
            .join("share")
            .join("applications")
            .join(format!("{CLI_NAME}{}.desktop", channel.path_suffix())),
        destination: local
            .join("share")
            .join("applications")
            .join(format!("{}.desktop", channel.application_id())),
        icon: app_dir
            .join("share")
            .join("icons")
            .join("hicolor")
            .join("512x512")
            .join("apps")
            .join(format!("{CLI_NAME}.png")),
        exec: app_dir.join("bin").join(CLI_NAME),
    };

    PathSet {
        os: Os::Linux,
        cli_link: bin_dir.join(CLI_NAME),
        cli_target: app_dir.join("bin").join(CLI_NAME),
        legacy_cli_target: Some(app_dir.join("bin").join("cli")),
        desktop: Some(desktop),
        db_dir: shared_root.join("db").join(format!("0-{state}")),
        socket: Some(shared_root.join(format!("{SOCKET_PREFIX}-{state}.sock"))),
        preferences_dir: home.join(".config").join(PREFERENCES_DIR),
        legacy_server_dir: home.join(LEGACY_SERVER_DIR),
        auxiliary_state: Vec::new(),
        recent_documents: Vec::new(),
        installations: EntryPattern {
            dir: local.clone(),
            prefix: LINUX_APP_PREFIX.to_string(),
            suffix: APP_EXTENSION.to_string(),
        },
        install_root: local,
        app_dir,
        bin_dir,
        shared_root,
    }
}

fn plan_macos(home: &Path, applications_dir: &Path, channel: &ChannelInfo) -> PathSet {
    let library = home.join("Library");
    let app_support = library.join("Application Support");
    let shared_root = app_support.join(MACOS_SHARED_DIR);
    let app_dir = applications_dir.join(format!("{}{APP_EXTENSION}", channel.display_name()));
    let bin_dir = home.join(".local").join("bin");

    // Library state is keyed by application id. It is only torn down once no
    // channel is installed, so it covers the ids of every channel.
    let mut auxiliary_state = vec![library.join("Logs").join(MACOS_SHARED_DIR)];
    let mut recent_documents = Vec::new();
    for app_id in Channel::ALL.map(Channel::application_id) {
        auxiliary_state.extend([
            library.join("Caches").join(app_id),
            library.join("HTTPStorages").join(app_id),
            library.join("Preferences").join(format!("{app_id}.plist")),
            library
                .join("Saved Application State")
                .join(format!("{app_id}.savedState")),
        ]);
        recent_documents.push(EntryPattern {
            dir: app_support.join(RECENT_DOCUMENTS_DIR),
            prefix: format!("{app_id}.sfl"),
            suffix: String::new(),
        });
    }

    PathSet {
        os: Os::MacOs,
        install_root: applications_dir.to_path_buf(),
        cli_link: bin_dir.join(CLI_NAME),
        cli_target: app_dir.join("Contents").join("MacOS").join("cli"),
        legacy_cli_target: None,
        desktop: None,
        db_dir: shared_root
            .join("db")
            .join(format!("0-{}", channel.state_suffix())),
        socket: None,
        preferences_dir: home.join(".config").join(PREFERENCES_DIR),
        legacy_server_dir: home.join(LEGACY_SERVER_DIR),
        auxiliary_state,
        recent_documents,
        installations: EntryPattern {
            dir: applications_dir.to_path_buf(),
            prefix: MACOS_APP_PREFIX.to_string(),
            suffix: APP_EXTENSION.to_string(),
        },
        app_dir,
        bin_dir,
        shared_root,
    }
}
