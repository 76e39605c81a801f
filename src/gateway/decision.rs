use crate::config::ThresholdsConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Allow,
    Monitor,
    Block,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Allow => "ALLOW",
            Action::Monitor => "MONITOR",
            Action::Block => "BLOCK",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the gateway does with a request, and the score that led there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub block: f64,
    pub monitor: f64,
}

impl Thresholds {
    pub fn evaluate(&self, score: f64) -> Decision {
        let action = if score >= self.block {
            Action::Block
        } else if score >= self.monitor {
            Action::Monitor
        } else {
            Action::Allow
        };
        Decision { action, score }
    }
}

impl From<&ThresholdsConfig> for Thresholds {
    fn from(config: &ThresholdsConfig) -> Self {
        Self {
            block: config.block,
            monitor: config.monitor,
        }
    }
}
