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

//! Error types for the transition engine

use crate::direction::{Action, Direction};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpgradeError {
    #[error("malformed version: {0}")]
    MalformedVersion(String),

    #[error("firmware catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("version {specifier} not found in image repository")]
    CatalogResolution { specifier: String },

    #[error("no {direction} path entry matches current version {current}")]
    NoPathEntry {
        current: String,
        direction: Direction,
    },

    #[error("next hop {specifier} not found in image repository")]
    HopNotInCatalog { specifier: String },

    #[error("could not find device serial {serial} in tenant")]
    DeviceNotFound { serial: String },

    #[error("device {device_id} did not report a software version")]
    DeviceVersionUnavailable { device_id: String },

    #[error(
        "action was specified to be {requested} but the firmware change was detected to be {detected}"
    )]
    ActionConflict {
        requested: Action,
        detected: Direction,
    },

    #[error("firmware change request rejected: {0}")]
    ChangeRejected(String),

    #[error("device did not reach {expected} within {waited_secs}s")]
    WaitTimeout { expected: String, waited_secs: u64 },

    #[error("{operation} failed: {message}")]
    Api {
        operation: &'static str,
        message: String,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("transition cancelled")]
    Cancelled,
}

/// Coarse classification used to decide how a failure is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or setup; nothing was changed on the device
    Configuration,
    /// Catalog or path table could not produce a version
    Resolution,
    /// The remote API rejected or failed a call
    Transient,
    Cancelled,
}

impl UpgradeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedVersion(_)
            | Self::DeviceNotFound { .. }
            | Self::ActionConflict { .. }
            | Self::Config(_) => ErrorKind::Configuration,
            Self::CatalogResolution { .. }
            | Self::NoPathEntry { .. }
            | Self::HopNotInCatalog { .. } => ErrorKind::Resolution,
            Self::CatalogUnavailable(_)
            | Self::DeviceVersionUnavailable { .. }
            | Self::ChangeRejected(_)
            | Self::WaitTimeout { .. }
            | Self::Api { .. } => ErrorKind::Transient,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn api(operation: &'static str, err: &anyhow::Error) -> Self {
        Self::Api {
            operation,
            message: format!("{err:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpgradeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            UpgradeError::DeviceNotFound {
                serial: "abc".to_owned()
            }
            .kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            UpgradeError::HopNotInCatalog {
                specifier: "4.7.1".to_owned()
            }
            .kind(),
            ErrorKind::Resolution
        );
        assert_eq!(
            UpgradeError::WaitTimeout {
                expected: "4.7.1-b3".to_owned(),
                waited_secs: 240
            }
            .kind(),
            ErrorKind::Transient
        );
        assert_eq!(UpgradeError::Cancelled.kind(), ErrorKind::Cancelled);
    }

    #[test]
    fn test_action_conflict_message() {
        let err = UpgradeError::ActionConflict {
            requested: Action::Upgrade,
            detected: Direction::Downgrade,
        };
        assert_eq!(
            err.to_string(),
            "action was specified to be upgrade but the firmware change was detected to be downgrade"
        );
    }
}
