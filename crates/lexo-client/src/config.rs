//! Client configuration.

use lexo_core::ClockConfig;

use crate::submission::WordRules;

/// Who the client plays as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    /// Stable player identity.
    pub identity: String,
    /// Name shown to other participants.
    pub display_name: String,
    /// Bearer credential attached to the join handshake.
    pub auth_token: Option<String>,
}

impl ClientIdentity {
    /// Anonymous identity whose display name doubles as the identity.
    pub fn guest(name: impl Into<String>) -> Self {
        let name = name.into();
        Self { identity: name.clone(), display_name: name, auth_token: None }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Local word checks.
    pub rules: WordRules,
    /// Clock offset estimation.
    pub clock: ClockConfig,
}
