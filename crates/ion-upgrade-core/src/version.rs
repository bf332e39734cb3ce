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

//! Version parsing and comparison module

use crate::error::{Result, UpgradeError};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid version regex"));

/// Firmware version parsed from a possibly decorated string (e.g. "5.2.7-b22").
///
/// Ordering and equality only look at `(major, minor, micro)`; the raw string
/// is carried along so the catalog key can be recovered.
#[derive(Debug, Clone)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub micro: u32,
    raw: String,
}

impl Version {
    /// Parse the first `major.minor.micro` group found anywhere in `raw`
    pub fn parse(raw: &str) -> Result<Self> {
        let caps = VERSION_PATTERN.captures(raw).ok_or_else(|| {
            UpgradeError::MalformedVersion(format!("no major.minor.micro in {raw:?}"))
        })?;

        let component = |idx: usize, name: &str| -> Result<u32> {
            caps.get(idx)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .parse::<u32>()
                .map_err(|_| UpgradeError::MalformedVersion(format!("invalid {name} in {raw:?}")))
        };

        Ok(Self {
            major: component(1, "major")?,
            minor: component(2, "minor")?,
            micro: component(3, "micro")?,
            raw: raw.to_owned(),
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn triple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.micro)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.triple() == other.triple()
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.triple().hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.triple().cmp(&other.triple())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compare two version strings by their numeric components
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    Ok(Version::parse(a)?.cmp(&Version::parse(b)?))
}

/// True if the exact catalog string contains the loose specifier.
///
/// Vendors decorate builds unpredictably ("5.2.7-b22", "ion-5.2.7"), so this is
/// plain substring containment rather than a prefix check.
pub fn loose_match(specifier: &str, exact: &str) -> bool {
    exact.contains(specifier)
}
