//! Backend kinds and their failure policies

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which inference backend a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process model loaded at startup.
    Local,
    /// OpenAI-compatible chat-completion endpoint over HTTP(S).
    #[default]
    Remote,
}

/// How a failed backend call is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The failure means a local resource is broken. Stop the process and
    /// let the supervisor restart it.
    FailFast,
    /// The failure is transient. Tell the client on the wire and keep serving.
    ReplyAndContinue,
}

impl BackendKind {
    /// The policy this kind of backend follows.
    ///
    /// Local failures (out of memory, corrupt weights) do not heal between
    /// requests; remote failures usually do.
    pub fn failure_policy(&self) -> FailurePolicy {
        match self {
            BackendKind::Local => FailurePolicy::FailFast,
            BackendKind::Remote => FailurePolicy::ReplyAndContinue,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Local => "local",
            BackendKind::Remote => "remote",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "remote" | "cloud" => Ok(BackendKind::Remote),
            other => Err(format!("unknown backend kind: {}", other)),
        }
    }
}
