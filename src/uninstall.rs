//! Uninstall state machine.
//!
//! Per-channel artifacts go first. Shared state and the preferences prompt
//! are only reached once no installation of any channel is left.

use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use log::{debug, info, warn};

use crate::channel::ChannelInfo;
use crate::error::SetupError;
use crate::fs_ops::remove_path;
use crate::paths::{EntryPattern, PathSet};
use crate::platform::Os;
use crate::settings::Settings;

pub const KEEP_PREFERENCES_PROMPT: &str = "Do you wish to keep your Zublime preferences? (Y/n)";

pub trait PreferencePrompt {
    /// Returns `true` when preferences should be kept.
    fn keep_preferences(&mut self) -> Result<bool, SetupError>;
}

/// Asks on the terminal, or reads a single line when stdin is piped.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl PreferencePrompt for TerminalPrompt {
    fn keep_preferences(&mut self) -> Result<bool, SetupError> {
        let answer = if io::stdin().is_terminal() {
            Input::<String>::with_theme(&ColorfulTheme::default())
                .with_prompt(KEEP_PREFERENCES_PROMPT)
                .allow_empty(true)
                .interact_text()?
        } else {
            print!("{KEEP_PREFERENCES_PROMPT} ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)?;
            line
        };
        Ok(keeps_preferences(&answer))
    }
}

/// Default is keep; only an explicit `n`/`no` deletes.
pub fn keeps_preferences(answer: &str) -> bool {
    !matches!(answer.trim().to_ascii_lowercase().as_str(), "n" | "no")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceDecision {
    /// Other installations remain, so the question never came up.
    NotAsked,
    Kept,
    Deleted,
}

#[derive(Debug, Clone)]
pub struct UninstallReport {
    pub channel: ChannelInfo,
    pub removed: Vec<PathBuf>,
    pub absent: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub remaining_installations: usize,
    pub shared_state_removed: bool,
    pub preferences: PreferenceDecision,
}

impl UninstallReport {
    fn new(channel: ChannelInfo) -> Self {
        UninstallReport {
            channel,
            removed: Vec::new(),
            absent: Vec::new(),
            skipped: Vec::new(),
            remaining_installations: 0,
            shared_state_removed: false,
            preferences: PreferenceDecision::NotAsked,
        }
    }

    fn remove(&mut self, path: &Path) -> Result<(), SetupError> {
        if remove_path(path)? {
            debug!("removed {}", path.display());
            self.removed.push(path.to_path_buf());
        } else {
            debug!("already absent: {}", path.display());
            self.absent.push(path.to_path_buf());
        }
        Ok(())
    }
}

pub struct Uninstaller<'a> {
    settings: &'a Settings,
    prompt: &'a mut dyn PreferencePrompt,
}

impl<'a> Uninstaller<'a> {
    pub fn new(settings: &'a Settings, prompt: &'a mut dyn PreferencePrompt) -> Self {
        Uninstaller { settings, prompt }
    }

    pub fn uninstall(&mut self, os: Os) -> Result<UninstallReport, SetupError> {
        let channel = ChannelInfo::resolve(&self.settings.channel);
        let paths = PathSet::plan_in(
            &self.settings.home,
            &self.settings.applications_dir,
            os,
            &channel,
        );
        let mut report = UninstallReport::new(channel);

        let outcome = self.remove_installation(&paths, &mut report);
        // Legacy cleanup runs even when an earlier step failed.
        if let Err(err) = report.remove(&paths.legacy_server_dir) {
            warn!(
                "failed to remove {}: {err}",
                paths.legacy_server_dir.display()
            );
        }
        outcome?;
        Ok(report)
    }

    fn remove_installation(
        &mut self,
        paths: &PathSet,
        report: &mut UninstallReport,
    ) -> Result<(), SetupError> {
        info!("Removing files for the {} channel", report.channel.requested());
        let borrowed: Vec<&Path> = if report.channel.is_recognized() {
            Vec::new()
        } else {
            paths.identifier_keyed_artifacts()
        };
        for path in paths.per_channel_artifacts() {
            if borrowed.contains(&path) {
                warn!(
                    "Leaving {} in place: it belongs to the stable channel",
                    path.display()
                );
                report.skipped.push(path.to_path_buf());
                continue;
            }
            report.remove(path)?;
        }

        report.remaining_installations = count_installations(&paths.installations)?;
        if report.remaining_installations > 0 {
            debug!(
                "{} installation(s) remain in {}",
                report.remaining_installations,
                paths.installations.dir.display()
            );
            return Ok(());
        }

        info!("No installations remain; removing shared state");
        remove_shared_state(paths, report)?;
        report.preferences = if self.prompt.keep_preferences()? {
            PreferenceDecision::Kept
        } else {
            report.remove(&paths.preferences_dir)?;
            PreferenceDecision::Deleted
        };
        Ok(())
    }
}

/// Shared tree plus Library state of every channel. Only called once no
/// installation is left.
fn remove_shared_state(paths: &PathSet, report: &mut UninstallReport) -> Result<(), SetupError> {
    report.remove(&paths.shared_root)?;
    for path in &paths.auxiliary_state {
        report.remove(path)?;
    }
    for pattern in &paths.recent_documents {
        for path in matching_entries(pattern)? {
            report.remove(&path)?;
        }
    }
    report.shared_state_removed = true;
    Ok(())
}

/// Installations of any channel still present under the pattern's root.
pub fn count_installations(pattern: &EntryPattern) -> Result<usize, SetupError> {
    Ok(matching_entries(pattern)?.len())
}

fn matching_entries(pattern: &EntryPattern) -> Result<Vec<PathBuf>, SetupError> {
    let entries = match fs::read_dir(&pattern.dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(SetupError::Io(err)),
    };
    let mut matches = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| pattern.matches(name))
        {
            matches.push(entry.path());
        }
    }
    matches.sort();
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    /// `keep: None` behaves like an interrupted prompt.
    struct ScriptedPrompt {
        keep: Option<bool>,
        asked: usize,
    }

    impl ScriptedPrompt {
        fn answering(keep: bool) -> Self {
            ScriptedPrompt {
                keep: Some(keep),
                asked: 0,
            }
        }

        fn interrupted() -> Self {
            ScriptedPrompt {
                keep: None,
                asked: 0,
            }
        }
    }

    impl PreferencePrompt for ScriptedPrompt {
        fn keep_preferences(&mut self) -> Result<bool, SetupError> {
            self.asked += 1;
            self.keep.ok_or_else(|| {
                SetupError::Io(io::Error::new(io::ErrorKind::Interrupted, "prompt interrupted"))
            })
        }
    }

    fn settings(root: &TempDir, channel: &str) -> Settings {
        Settings {
            home: root.path().join("home"),
            channel: channel.to_string(),
            version: "latest".to_string(),
            bundle_path: None,
            temp_root: root.path().to_path_buf(),
            releases_url: "https://releases.invalid".to_string(),
            applications_dir: root.path().join("Applications"),
            shell: None,
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    /// Lays down what a Linux install of `channel` leaves behind.
    fn seed_linux(settings: &Settings) -> PathSet {
        let paths = PathSet::plan_in(
            &settings.home,
            &settings.applications_dir,
            Os::Linux,
            &ChannelInfo::resolve(&settings.channel),
        );
        touch(&paths.cli_target);
        touch(&paths.desktop.as_ref().unwrap().destination);
        touch(&paths.db_dir.join("db.sqlite"));
        touch(paths.socket.as_ref().unwrap());
        touch(&paths.preferences_dir.join("settings.json"));
        fs::create_dir_all(&paths.bin_dir).unwrap();
        let _ = fs::remove_file(&paths.cli_link);
        std::os::unix::fs::symlink(&paths.cli_target, &paths.cli_link).unwrap();
        paths
    }

    fn uninstall(settings: &Settings, os: Os, prompt: &mut ScriptedPrompt) -> UninstallReport {
        Uninstaller::new(settings, prompt).uninstall(os).unwrap()
    }

    #[test]
    fn answers_other_than_no_keep_preferences() {
        for answer in ["", "\n", "y", "Y", "yes", "maybe", "nope"] {
            assert!(keeps_preferences(answer), "{answer:?} should keep");
        }
        for answer in ["n", "N", "no", "No", " NO \n", "n\n"] {
            assert!(!keeps_preferences(answer), "{answer:?} should delete");
        }
    }

    #[test]
    fn last_channel_removal_clears_shared_state() {
        let root = tempdir().unwrap();
        let settings = settings(&root, "nightly");
        let paths = seed_linux(&settings);
        touch(&settings.home.join(".zed_server/state"));

        let mut prompt = ScriptedPrompt::answering(false);
        let report = uninstall(&settings, Os::Linux, &mut prompt);

        assert_eq!(prompt.asked, 1);
        assert_eq!(report.remaining_installations, 0);
        assert!(report.shared_state_removed);
        assert_eq!(report.preferences, PreferenceDecision::Deleted);
        assert!(!paths.app_dir.exists());
        assert!(!paths.cli_link.exists());
        assert!(!settings.home.join(".local/share/zublime").exists());
        assert!(!paths.preferences_dir.exists());
        assert!(!settings.home.join(".zed_server").exists());
    }

    #[test]
    fn keeping_preferences_leaves_config_dir() {
        let root = tempdir().unwrap();
        let settings = settings(&root, "stable");
        let paths = seed_linux(&settings);

        let mut prompt = ScriptedPrompt::answering(true);
        let report = uninstall(&settings, Os::Linux, &mut prompt);

        assert_eq!(report.preferences, PreferenceDecision::Kept);
        assert!(paths.preferences_dir.join("settings.json").is_file());
        assert!(!paths.shared_root.exists());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let root = tempdir().unwrap();
        let settings = settings(&root, "preview");
        seed_linux(&settings);

        uninstall(&settings, Os::Linux, &mut ScriptedPrompt::answering(false));
        let second = uninstall(&settings, Os::Linux, &mut ScriptedPrompt::answering(false));

        assert!(second.removed.is_empty());
        assert!(!second.absent.is_empty());
        assert_eq!(second.remaining_installations, 0);
    }

    #[test]
    fn removing_one_channel_keeps_the_others() {
        let root = tempdir().unwrap();
        let stable = seed_linux(&settings(&root, "stable"));
        let dev_settings = settings(&root, "dev");
        let dev = seed_linux(&dev_settings);

        let mut prompt = ScriptedPrompt::answering(false);
        let report = uninstall(&dev_settings, Os::Linux, &mut prompt);

        assert_eq!(prompt.asked, 0);
        assert_eq!(report.preferences, PreferenceDecision::NotAsked);
        assert_eq!(report.remaining_installations, 1);
        assert!(!report.shared_state_removed);

        assert!(!dev.app_dir.exists());
        assert!(!dev.db_dir.exists());
        assert!(!dev.socket.as_ref().unwrap().exists());

        assert!(stable.cli_target.is_file());
        assert!(stable.db_dir.join("db.sqlite").is_file());
        assert!(stable.socket.as_ref().unwrap().is_file());
        assert!(stable.desktop.as_ref().unwrap().destination.is_file());
        assert!(stable.shared_root.is_dir());
        assert!(stable.preferences_dir.is_dir());
    }

    #[test]
    fn unknown_channel_leaves_stable_launcher_alone() {
        let root = tempdir().unwrap();
        let stable = seed_linux(&settings(&root, "stable"));
        let typo = settings(&root, "nightlyy");

        let report = uninstall(&typo, Os::Linux, &mut ScriptedPrompt::answering(true));

        let launcher = stable.desktop.as_ref().unwrap().destination.clone();
        assert!(launcher.is_file());
        assert_eq!(report.skipped, vec![launcher]);
        assert!(stable.app_dir.is_dir());
        assert_eq!(report.remaining_installations, 1);
    }

    #[test]
    fn macos_removes_bundle_and_library_state() {
        let root = tempdir().unwrap();
        let settings = settings(&root, "nightly");
        let paths = PathSet::plan_in(
            &settings.home,
            &settings.applications_dir,
            Os::MacOs,
            &ChannelInfo::resolve("nightly"),
        );
        touch(&paths.cli_target);
        touch(&paths.db_dir.join("db.sqlite"));
        for path in &paths.auxiliary_state {
            touch(path);
        }
        let recent = &paths.recent_documents[0];
        touch(&recent.dir.join("dev.zublime.Zublime-Nightly.sfl3"));
        touch(&recent.dir.join("com.apple.Safari.sfl3"));
        touch(&settings.applications_dir.join("Safari.app/Contents/Info.plist"));
        touch(&paths.cli_link);

        let mut prompt = ScriptedPrompt::answering(true);
        let report = uninstall(&settings, Os::MacOs, &mut prompt);

        assert_eq!(report.remaining_installations, 0);
        assert!(!paths.app_dir.exists());
        assert!(!paths.shared_root.exists());
        for path in &paths.auxiliary_state {
            assert!(!path.exists(), "{} should be gone", path.display());
        }
        assert!(!recent.dir.join("dev.zublime.Zublime-Nightly.sfl3").exists());
        assert!(recent.dir.join("com.apple.Safari.sfl3").exists());
        assert!(settings.applications_dir.join("Safari.app").is_dir());
        // The CLI link is not channel specific on macOS.
        assert!(paths.cli_link.exists());
        assert_eq!(prompt.asked, 1);
    }

    #[test]
    fn macos_other_bundle_blocks_shared_cleanup() {
        let root = tempdir().unwrap();
        let settings = settings(&root, "preview");
        touch(&settings.applications_dir.join("Zublime Preview.app/Contents/MacOS/cli"));
        touch(&settings.applications_dir.join("Zublime.app/Contents/MacOS/cli"));
        let shared = settings.home.join("Library/Application Support/Zublime/db/0-stable/db");
        touch(&shared);

        let mut prompt = ScriptedPrompt::answering(false);
        let report = uninstall(&settings, Os::MacOs, &mut prompt);

        assert!(!settings.applications_dir.join("Zublime Preview.app").exists());
        assert_eq!(report.remaining_installations, 1);
        assert!(shared.is_file());
        assert_eq!(prompt.asked, 0);
    }

    #[test]
    fn macos_last_uninstall_sweeps_library_state_of_earlier_channels() {
        let root = tempdir().unwrap();
        let nightly = settings(&root, "nightly");
        let stable = settings(&root, "stable");
        let library = nightly.home.join("Library");
        touch(&nightly.applications_dir.join("Zublime Nightly.app/Contents/MacOS/cli"));
        touch(&nightly.applications_dir.join("Zublime.app/Contents/MacOS/cli"));
        let leftovers = [
            library.join("Caches/dev.zublime.Zublime-Nightly/cache.db"),
            library.join("HTTPStorages/dev.zublime.Zublime-Nightly/cookies"),
            library.join("Preferences/dev.zublime.Zublime-Nightly.plist"),
            library.join("Saved Application State/dev.zublime.Zublime-Nightly.savedState/window"),
            library.join("Caches/dev.zublime.Zublime/cache.db"),
            library.join(
                "Application Support/com.apple.sharedfilelist/com.apple.LSSharedFileList.ApplicationRecentDocuments/dev.zublime.Zublime-Nightly.sfl3",
            ),
        ];
        for path in &leftovers {
            touch(path);
        }

        let first = uninstall(&nightly, Os::MacOs, &mut ScriptedPrompt::answering(true));
        assert_eq!(first.remaining_installations, 1);
        assert!(leftovers.iter().all(|path| path.exists()));

        let last = uninstall(&stable, Os::MacOs, &mut ScriptedPrompt::answering(true));
        assert_eq!(last.remaining_installations, 0);
        let leaked: Vec<_> = leftovers.iter().filter(|path| path.exists()).collect();
        assert!(leaked.is_empty(), "left behind: {leaked:?}");
    }

    #[test]
    fn legacy_server_dir_is_removed_when_prompt_fails() {
        let root = tempdir().unwrap();
        let settings = settings(&root, "stable");
        let paths = seed_linux(&settings);
        touch(&settings.home.join(".zed_server/state"));

        let mut prompt = ScriptedPrompt::interrupted();
        let result = Uninstaller::new(&settings, &mut prompt).uninstall(Os::Linux);

        assert!(matches!(result, Err(SetupError::Io(_))));
        assert_eq!(prompt.asked, 1);
        assert!(!settings.home.join(".zed_server").exists());
        assert!(paths.preferences_dir.is_dir());
    }

    #[test]
    fn count_installations_tolerates_missing_root() {
        let root = tempdir().unwrap();
        let pattern = EntryPattern {
            dir: root.path().join("missing"),
            prefix: "zublime".to_string(),
            suffix: ".app".to_string(),
        };
        assert_eq!(count_installations(&pattern).unwrap(), 0);
    }
}
