//! Caller allow-list and response roles.

use lastmile_core::config::AccessConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Allow-list entry admitting every caller
pub const ALLOW_ALL: &str = "*";

/// How much a caller is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Facility, distance, threshold and verdict per technology
    Detailed,
    /// Verdict with distance and threshold only
    Summary,
}

/// Result of checking a caller against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Serve the caller with this role
    Granted(Role),
    /// Drop the message, optionally replying with this text
    Denied(Option<String>),
}

/// Static allow-list policy.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allow_all: bool,
    allowed: HashSet<String>,
    detailed: HashSet<String>,
    reject_message: Option<String>,
}

impl AccessPolicy {
    /// Policy admitting everyone with the summary role.
    pub fn open() -> Self {
        Self {
            allow_all: true,
            ..Self::default()
        }
    }

    /// Build from the `[access]` section. An empty allow-list admits everyone.
    pub fn from_config(config: &AccessConfig) -> Self {
        let allowed: HashSet<String> = config.allow_list.iter().map(|id| id.trim().to_string()).collect();
        Self {
            allow_all: allowed.is_empty() || allowed.contains(ALLOW_ALL),
            allowed,
            detailed: config.detailed.iter().map(|id| id.trim().to_string()).collect(),
            reject_message: config.reject_message.clone(),
        }
    }

    /// Builder-style method to admit a caller
    #[must_use]
    pub fn allow(mut self, chat_id: impl Into<String>) -> Self {
        self.allowed.insert(chat_id.into());
        self
    }

    /// Builder-style method to give a caller detailed responses
    #[must_use]
    pub fn detailed(mut self, chat_id: impl Into<String>) -> Self {
        self.detailed.insert(chat_id.into());
        self
    }

    /// True when every caller is admitted
    pub fn is_open(&self) -> bool {
        self.allow_all
    }

    /// Decide access and role for a caller, once per request.
    pub fn check(&self, chat_id: &str) -> Access {
        if !self.allow_all && !self.allowed.contains(chat_id) {
            return Access::Denied(self.reject_message.clone());
        }
        Access::Granted(self.role_for(chat_id))
    }

    /// Response role for an admitted caller
    pub fn role_for(&self, chat_id: &str) -> Role {
        if self.detailed.contains(chat_id) {
            Role::Detailed
        } else {
            Role::Summary
        }
    }
}
