//! Host operating system and architecture resolution.
//!
//! Inputs are the raw `uname -s` / `uname -m` spellings; outputs are the
//! canonical identifiers used in release URLs and path planning.

use std::env;
use std::fmt;
use std::process::Command;

use log::debug;

use crate::error::SetupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    MacOs,
    Linux,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Aarch64,
    X86_64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub os: Os,
    pub arch: Arch,
}

impl Os {
    pub fn resolve(raw: &str) -> Result<Self, SetupError> {
        match raw.trim() {
            "Darwin" => Ok(Os::MacOs),
            "Linux" => Ok(Os::Linux),
            other => Err(SetupError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn detect() -> Result<Self, SetupError> {
        Os::resolve(&host_uname("-s"))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Os::MacOs => "macos",
            Os::Linux => "linux",
        }
    }
}

impl Arch {
    pub fn resolve(os: Os, raw: &str) -> Result<Self, SetupError> {
        let raw = raw.trim();
        let arch = match os {
            Os::MacOs if raw.starts_with("arm64") => Some(Arch::Aarch64),
            Os::MacOs if raw.starts_with("x86") => Some(Arch::X86_64),
            Os::Linux if raw.starts_with("arm64") || raw == "armhf" || raw == "aarch64" => {
                Some(Arch::Aarch64)
            }
            Os::Linux if raw.starts_with("x86") || raw.starts_with("i686") => Some(Arch::X86_64),
            _ => None,
        };
        arch.ok_or_else(|| SetupError::UnsupportedArchitecture {
            os: os.to_string(),
            arch: raw.to_string(),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Aarch64 => "aarch64",
            Arch::X86_64 => "x86_64",
        }
    }
}

impl Target {
    pub fn resolve(raw_os: &str, raw_arch: &str) -> Result<Self, SetupError> {
        let os = Os::resolve(raw_os)?;
        let arch = Arch::resolve(os, raw_arch)?;
        Ok(Target { os, arch })
    }

    pub fn detect() -> Result<Self, SetupError> {
        Target::resolve(&host_uname("-s"), &host_uname("-m"))
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn host_uname(flag: &str) -> String {
    match Command::new("uname").arg(flag).output() {
        Ok(output) if output.status.success() => {
            let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !value.is_empty() {
                return value;
            }
        }
        Ok(output) => debug!("uname {flag} exited with {}", output.status),
        Err(err) => debug!("uname {flag} unavailable: {err}"),
    }
    fallback_uname(flag).to_string()
}

/// Compile-time host constants spelled the way `uname` reports them.
fn fallback_uname(flag: &str) -> &'static str {
    if flag == "-s" {
        match env::consts::OS {
            "macos" => "Darwin",
            "linux" => "Linux",
            other => other,
        }
    } else {
        match (env::consts::OS, env::consts::ARCH) {
            ("macos", "aarch64") => "arm64",
            (_, arch) => arch,
        }
    }
}
