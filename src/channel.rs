//! Release channel registry.

use std::fmt;

use log::warn;

pub const DEFAULT_CHANNEL: &str = "stable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Stable,
    Nightly,
    Preview,
    Dev,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Stable,
        Channel::Nightly,
        Channel::Preview,
        Channel::Dev,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Channel::ALL.into_iter().find(|channel| channel.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::Stable => "stable",
            Channel::Nightly => "nightly",
            Channel::Preview => "preview",
            Channel::Dev => "dev",
        }
    }

    pub fn application_id(self) -> &'static str {
        match self {
            Channel::Stable => "dev.zublime.Zublime",
            Channel::Nightly => "dev.zublime.Zublime-Nightly",
            Channel::Preview => "dev.zublime.Zublime-Preview",
            Channel::Dev => "dev.zublime.Zublime-Dev",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Channel::Stable => "Zublime",
            Channel::Nightly => "Zublime Nightly",
            Channel::Preview => "Zublime Preview",
            Channel::Dev => "Zublime Dev",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifiers for one invocation's channel, computed once and passed to
/// every later step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    requested: String,
    channel: Option<Channel>,
    application_id: &'static str,
    display_name: &'static str,
    path_suffix: String,
    state_suffix: String,
}

impl ChannelInfo {
    /// Unknown names never fail: identifiers fall back to `stable` while the
    /// path and state suffixes keep a sanitised form of the requested name.
    pub fn resolve(requested: &str) -> Self {
        let requested = requested.trim();
        let requested = if requested.is_empty() {
            DEFAULT_CHANNEL
        } else {
            requested
        };
        match Channel::from_name(requested) {
            Some(channel) => Self::known(channel),
            None => {
                warn!("Unknown release channel: {requested}. Using stable app ID.");
                let token = sanitize_channel_token(requested);
                ChannelInfo {
                    requested: requested.to_string(),
                    channel: None,
                    application_id: Channel::Stable.application_id(),
                    display_name: Channel::Stable.display_name(),
                    path_suffix: format!("-{token}"),
                    state_suffix: token,
                }
            }
        }
    }

    pub fn known(channel: Channel) -> Self {
        let path_suffix = match channel {
            Channel::Stable => String::new(),
            other => format!("-{}", other.name()),
        };
        ChannelInfo {
            requested: channel.name().to_string(),
            channel: Some(channel),
            application_id: channel.application_id(),
            display_name: channel.display_name(),
            path_suffix,
            state_suffix: channel.name().to_string(),
        }
    }

    pub fn requested(&self) -> &str {
        &self.requested
    }

    pub fn channel(&self) -> Option<Channel> {
        self.channel
    }

    pub fn is_recognized(&self) -> bool {
        self.channel.is_some()
    }

    pub fn application_id(&self) -> &str {
        self.application_id
    }

    pub fn display_name(&self) -> &str {
        self.display_name
    }

    pub fn path_suffix(&self) -> &str {
        &self.path_suffix
    }

    pub fn state_suffix(&self) -> &str {
        &self.state_suffix
    }
}

fn sanitize_channel_token(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
