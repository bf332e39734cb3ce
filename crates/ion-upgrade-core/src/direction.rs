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

//! Direction decider: upgrade, downgrade, or nothing to do

use crate::catalog::Catalog;
use crate::error::{Result, UpgradeError};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Which path table a transition walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Upgrade,
    Downgrade,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Downgrade => "downgrade",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Action requested by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Upgrade,
    Downgrade,
    /// Let the decider pick the direction
    #[default]
    Auto,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[Self::Upgrade, Self::Downgrade, Self::Auto]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Downgrade => "downgrade",
            Self::Auto => "auto",
        }
    }

    /// Check the requested action against the detected direction
    pub fn reconcile(self, detected: Direction) -> Result<Direction> {
        match (self, detected) {
            (Self::Auto, _)
            | (Self::Upgrade, Direction::Upgrade)
            | (Self::Downgrade, Direction::Downgrade) => Ok(detected),
            (Self::Upgrade | Self::Downgrade, Direction::Upgrade | Direction::Downgrade) => {
                Err(UpgradeError::ActionConflict {
                    requested: self,
                    detected,
                })
            }
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "upgrade" => Ok(Self::Upgrade),
            "downgrade" => Ok(Self::Downgrade),
            "auto" => Ok(Self::Auto),
            _ => Err(anyhow::anyhow!(
                "Unknown action: '{}'. Supported actions: {}",
                s,
                Self::all()
                    .iter()
                    .map(Action::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}

/// Outcome of comparing the current version with the resolved target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Change(Direction),
    AtTarget,
}

impl Decision {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Self::Change(direction) => Some(direction),
            Self::AtTarget => None,
        }
    }
}

/// Decide whether reaching `target` from `current` is an upgrade or a downgrade.
///
/// An absent target means the highest version in the catalog. Major, minor and
/// micro are compared in that order; the first differing component wins.
pub fn decide(current: &str, target: Option<&str>, catalog: &Catalog) -> Result<Decision> {
    let exact_target = catalog
        .resolve_exact(target, Direction::Upgrade)
        .ok_or_else(|| UpgradeError::CatalogResolution {
            specifier: target.unwrap_or("<highest available>").to_owned(),
        })?;

    let current = Version::parse(current)?;
    let target = Version::parse(exact_target)?;

    let decision = match current.cmp(&target) {
        Ordering::Less => Decision::Change(Direction::Upgrade),
        Ordering::Greater => Decision::Change(Direction::Downgrade),
        Ordering::Equal => Decision::AtTarget,
    };

    tracing::debug!("{current} -> {target}: {decision:?}");
    Ok(decision)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FirmwareImage;

    fn catalog(versions: &[&str]) -> Catalog {
        Catalog::from_images(versions.iter().enumerate().map(|(i, v)| FirmwareImage {
            version: (*v).to_owned(),
            image_id: format!("img-{i}"),
        }))
    }

    #[test]
    fn test_decide_upgrade() {
        let catalog = catalog(&["4.5.3", "5.2.7-b22", "5.4.1"]);
        assert_eq!(
            decide("4.5.9", Some("5.2.7"), &catalog).unwrap(),
            Decision::Change(Direction::Upgrade)
        );
    }

    #[test]
    fn test_decide_downgrade() {
        let catalog = catalog(&["4.5.3", "5.2.7-b22", "5.4.1"]);
        assert_eq!(
            decide("5.4.1", Some("5.2.7"), &catalog).unwrap(),
            Decision::Change(Direction::Downgrade)
        );
    }

    #[test]
    fn test_decide_at_target() {
        let catalog = catalog(&["4.5.3", "5.2.7-b22"]);
        let decision = decide("5.2.7-b22", Some("5.2.7"), &catalog).unwrap();
        assert_eq!(decision, Decision::AtTarget);
        assert_eq!(decision.direction(), None);
    }

    #[test]
    fn test_decide_by_micro_when_major_minor_equal() {
        // Equal major and minor fall through to a numeric micro comparison
        let catalog = catalog(&["5.2.3", "5.2.7-b22", "5.2.10"]);
        assert_eq!(
            decide("5.2.3", Some("5.2.7"), &catalog).unwrap(),
            Decision::Change(Direction::Upgrade)
        );
        assert_eq!(
            decide("5.2.10", Some("5.2.7"), &catalog).unwrap(),
            Decision::Change(Direction::Downgrade)
        );
    }

    #[test]
    fn test_decide_defaults_to_highest() {
        let catalog = catalog(&["4.5.3", "5.4.3-b1", "5.2.7-b22"]);
        assert_eq!(
            decide("5.2.7-b22", None, &catalog).unwrap(),
            Decision::Change(Direction::Upgrade)
        );
        assert_eq!(decide("5.4.3-b1", None, &catalog).unwrap(), Decision::AtTarget);
    }

    #[test]
    fn test_decide_unknown_target() {
        let catalog = catalog(&["4.5.3"]);
        assert!(matches!(
            decide("4.5.3", Some("9.9.9"), &catalog),
            Err(UpgradeError::CatalogResolution { .. })
        ));
    }

    #[test]
    fn test_decide_malformed_current() {
        let catalog = catalog(&["4.5.3"]);
        assert!(matches!(
            decide("unknown", Some("4.5.3"), &catalog),
            Err(UpgradeError::MalformedVersion(_))
        ));
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!("upgrade".parse::<Action>().unwrap(), Action::Upgrade);
        assert_eq!("DOWNGRADE".parse::<Action>().unwrap(), Action::Downgrade);
        assert_eq!("Auto".parse::<Action>().unwrap(), Action::Auto);
        let err = "sideways".parse::<Action>().unwrap_err();
        assert!(err.to_string().contains("upgrade, downgrade, auto"));
    }

    #[test]
    fn test_action_reconcile() {
        assert_eq!(
            Action::Auto.reconcile(Direction::Downgrade).unwrap(),
            Direction::Downgrade
        );
        assert_eq!(
            Action::Upgrade.reconcile(Direction::Upgrade).unwrap(),
            Direction::Upgrade
        );
        assert!(matches!(
            Action::Upgrade.reconcile(Direction::Downgrade),
            Err(UpgradeError::ActionConflict { .. })
        ));
        assert!(matches!(
            Action::Downgrade.reconcile(Direction::Upgrade),
            Err(UpgradeError::ActionConflict { .. })
        ));
    }
}
