//! Per-user installer and uninstaller for Zublime release channels.

pub mod archive;
pub mod channel;
pub mod desktop;
pub mod disk_image;
pub mod error;
pub mod fetch;
pub mod fs_ops;
pub mod install;
pub mod paths;
pub mod platform;
pub mod settings;
pub mod uninstall;

pub use channel::{Channel, ChannelInfo};
pub use error::SetupError;
pub use install::{InstallReport, InstallStage, Installer};
pub use paths::PathSet;
pub use platform::{Arch, Os, Target};
pub use settings::Settings;
pub use uninstall::{PreferenceDecision, TerminalPrompt, UninstallReport, Uninstaller};

/// Installs the configured channel on the current host.
pub fn run_install(settings: &Settings) -> Result<InstallReport, SetupError> {
    let target = Target::detect()?;
    Installer::new(settings).install(target)
}

/// Uninstalls the configured channel, asking on the terminal about
/// preferences when it was the last installation.
pub fn run_uninstall(settings: &Settings) -> Result<UninstallReport, SetupError> {
    let os = Os::detect()?;
    let mut prompt = TerminalPrompt;
    let report = Uninstaller::new(settings, &mut prompt).uninstall(os)?;
    Ok(report)
}

/// Logging setup shared by both binaries: `info` unless `RUST_LOG` says
/// otherwise, without timestamps or module paths.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
