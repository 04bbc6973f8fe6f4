//! Environment-driven settings, resolved once at startup.

use std::env;
use std::path::PathBuf;

use dirs::home_dir;

use crate::channel::DEFAULT_CHANNEL;
use crate::error::SetupError;

pub const CHANNEL_ENV: &str = "ZUBLIME_CHANNEL";
pub const VERSION_ENVS: [&str; 2] = ["ZUBLIME_VERSION", "ZED_VERSION"];
pub const BUNDLE_PATH_ENV: &str = "ZUBLIME_BUNDLE_PATH";
pub const TEMP_ROOT_ENV: &str = "TMPDIR";
pub const RELEASES_URL_ENV: &str = "ZUBLIME_RELEASES_URL";
pub const APPLICATIONS_DIR_ENV: &str = "ZUBLIME_APPLICATIONS_DIR";

pub const DEFAULT_VERSION: &str = "latest";
pub const DEFAULT_RELEASES_URL: &str = "https://cloud.zublime.dev/releases";
pub const DEFAULT_TEMP_ROOT: &str = "/tmp";
pub const DEFAULT_APPLICATIONS_DIR: &str = "/Applications";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub home: PathBuf,
    pub channel: String,
    pub version: String,
    pub bundle_path: Option<PathBuf>,
    pub temp_root: PathBuf,
    pub releases_url: String,
    pub applications_dir: PathBuf,
    pub shell: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self, SetupError> {
        let home = home_dir().ok_or_else(|| {
            SetupError::Config("unable to resolve $HOME; set HOME to an existing directory".into())
        })?;
        Ok(Settings::from_lookup(home, |key| env::var(key).ok()))
    }

    /// Builds settings from an arbitrary variable source. Blank values count
    /// as unset.
    pub fn from_lookup<F>(home: PathBuf, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let channel = get(CHANNEL_ENV).unwrap_or_else(|| DEFAULT_CHANNEL.to_string());
        let version = VERSION_ENVS
            .iter()
            .find_map(|key| get(*key))
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let bundle_path = get(BUNDLE_PATH_ENV).map(PathBuf::from);
        let temp_root = get(TEMP_ROOT_ENV)
            .map(PathBuf::from)
            .filter(|path| path.is_dir())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMP_ROOT));
        let releases_url = get(RELEASES_URL_ENV)
            .unwrap_or_else(|| DEFAULT_RELEASES_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let applications_dir = get(APPLICATIONS_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_APPLICATIONS_DIR));

        Settings {
            home,
            channel,
            version,
            bundle_path,
            temp_root,
            releases_url,
            applications_dir,
            shell: get("SHELL"),
        }
    }
}
