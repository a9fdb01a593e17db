//! Governance configuration
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! poll_title = "Poll Proposal"
//! coin_transfer_title = "Coin Transfer Proposal"
//! strict_poll_options = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{GovernanceError, Result};

/// Title given to every poll proposal
pub const POLL_PROPOSAL_TITLE: &str = "Poll Proposal";

/// Title given to every coin transfer proposal
pub const COIN_TRANSFER_PROPOSAL_TITLE: &str = "Coin Transfer Proposal";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GovernanceConfig {
    pub poll_title: String,
    pub coin_transfer_title: String,
    /// Reject votes on poll proposals whose option code has no matching option.
    /// Off by default: any option code opens a new tally bucket.
    pub strict_poll_options: bool,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            poll_title: POLL_PROPOSAL_TITLE.to_string(),
            coin_transfer_title: COIN_TRANSFER_PROPOSAL_TITLE.to_string(),
            strict_poll_options: false,
        }
    }
}

impl GovernanceConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| GovernanceError::Config(e.to_string()))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            GovernanceError::Config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::from_toml_str(&contents)
    }
}
