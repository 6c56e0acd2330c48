//! Error types, one enum per failure domain.
//!
//! None of these are fatal: environment errors lead back to re-targeting, channel errors
//! to a single reconnect and a transient notice, translation errors to a notice and an
//! unavailable translator.

use thiserror::Error;

use crate::host::NodeId;

/// The host tree could not serve a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("node {0:?} is detached from the host tree")]
    Detached(NodeId),

    #[error("node {0:?} is not an editable control")]
    NotEditable(NodeId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("no connection to {0}")]
    Unreachable(String),

    #[error("channel is not connected and has no known peer")]
    NotConnected,

    #[error("peer disconnected")]
    Disconnected,

    #[error("message dropped after reconnect to {peer} failed: {reason}")]
    Dropped { peer: String, reason: String },

    #[error("failed to encode message: {0}")]
    Encode(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("no translation available for {source_lang} -> {target_lang}")]
    Unavailable {
        source_lang: String,
        target_lang: String,
    },

    #[error("translator could not be created: {0}")]
    Create(String),

    #[error("translation model download failed: {0}")]
    Download(String),

    #[error("translation failed: {0}")]
    Translate(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config location unavailable: {0}")]
    Location(String),

    #[error("config io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config store failed: {0}")]
    Store(#[from] confy::ConfyError),

    #[error("invalid config: {0}")]
    Invalid(String),
}
