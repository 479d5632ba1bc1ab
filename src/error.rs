/// Error types.
///
/// Only media start failures matter at runtime, and they never reach the
/// user: the executor logs them and feeds `Event::MediaRejected` back into
/// the controller. Config errors are logged and replaced by defaults.

use std::path::PathBuf;

use thiserror::Error;

use crate::sim::event::Channel;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{channel} start rejected: {reason}")]
    StartRejected { channel: Channel, reason: String },

    #[error("no audio output device")]
    NoOutputDevice,
}

impl MediaError {
    pub fn rejected(channel: Channel, reason: impl Into<String>) -> Self {
        MediaError::StartRejected { channel, reason: reason.into() }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config.toml parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("blessing pool is empty")]
    EmptyPool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_names_channel() {
        let err = MediaError::rejected(Channel::Audio, "autoplay denied");
        assert_eq!(err.to_string(), "audio start rejected: autoplay denied");
    }
}
