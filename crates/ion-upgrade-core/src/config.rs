// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of ION Upgrade.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Transition limits shared by the engine and the binary's config file

use crate::error::{Result, UpgradeError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_steps() -> u32 {
    5
}

fn default_max_wait_secs() -> u64 {
    240
}

fn default_poll_interval_secs() -> u64 {
    10
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionConfig {
    /// Maximum firmware changes performed in one run
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Maximum time to wait for each firmware change (seconds)
    #[serde(default = "default_max_wait_secs")]
    pub max_wait_secs: u64,

    /// Interval between device version polls (seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            max_wait_secs: default_max_wait_secs(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl TransitionConfig {
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(UpgradeError::Config(
                "max_steps must be at least 1".to_owned(),
            ));
        }
        if self.poll_interval_secs == 0 {
            return Err(UpgradeError::Config(
                "poll_interval_secs must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
