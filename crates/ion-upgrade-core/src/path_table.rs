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

//! Directional path tables: current-version pattern -> next sanctioned hop

use crate::direction::Direction;
use crate::error::{Result, UpgradeError};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One hand-authored path entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRule {
    /// Regular expression matched at the start of the current exact version
    pub pattern: String,
    /// Loose specifier of the next hop
    pub target: String,
}

impl PathRule {
    pub fn new(pattern: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            target: target.into(),
        }
    }
}

/// Serializable form of both tables, as found in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathTablesConfig {
    #[serde(default = "default_upgrade_rules")]
    pub upgrade: Vec<PathRule>,

    #[serde(default = "default_downgrade_rules")]
    pub downgrade: Vec<PathRule>,
}

/// TAC recommended upgrade lattice: 4.5 -> 4.7 -> 5.0 -> 5.2 -> 5.4
pub fn default_upgrade_rules() -> Vec<PathRule> {
    vec![
        PathRule::new(r"4\.5\..*", "4.7.1"),
        PathRule::new(r"4\.7\..*", "5.0.3"),
        PathRule::new(r"5\.0\..*", "5.2.7"),
        PathRule::new(r"5\.1\..*", "5.2.7"),
        PathRule::new(r"5\.2\..*", "5.4.3"),
    ]
}

/// TAC recommended downgrade lattice: 5.4 -> 5.2 -> 5.0 -> 4.7 -> 4.5
pub fn default_downgrade_rules() -> Vec<PathRule> {
    vec![
        PathRule::new(r"4\.7\..*", "4.5.3"),
        PathRule::new(r"5\.0\..*", "4.7.1"),
        PathRule::new(r"5\.1\..*", "4.7.1"),
        PathRule::new(r"5\.2\..*", "5.0.3"),
        PathRule::new(r"5\.4\..*", "5.2.7"),
    ]
}

impl Default for PathTablesConfig {
    fn default() -> Self {
        Self {
            upgrade: default_upgrade_rules(),
            downgrade: default_downgrade_rules(),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    matcher: Regex,
    target: String,
}

/// Ordered table for one direction; the first matching entry wins
#[derive(Debug, Clone)]
pub struct PathTable {
    rules: Vec<CompiledRule>,
}

impl PathTable {
    pub fn compile(rules: &[PathRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                if rule.target.trim().is_empty() {
                    return Err(UpgradeError::Config(format!(
                        "path entry {:?} has an empty target",
                        rule.pattern
                    )));
                }
                let matcher = Regex::new(&format!("^(?:{})", rule.pattern)).map_err(|e| {
                    UpgradeError::Config(format!("invalid path pattern {:?}: {e}", rule.pattern))
                })?;
                Ok(CompiledRule {
                    matcher,
                    target: rule.target.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Target specifier for the first entry matching `current_exact`
    pub fn next_hop(&self, current_exact: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.is_match(current_exact))
            .map(|rule| rule.target.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Upgrade and downgrade tables, injected into the engine as configuration
#[derive(Debug, Clone)]
pub struct PathTables {
    upgrade: PathTable,
    downgrade: PathTable,
}

impl PathTables {
    pub fn from_config(config: &PathTablesConfig) -> Result<Self> {
        Ok(Self {
            upgrade: PathTable::compile(&config.upgrade)?,
            downgrade: PathTable::compile(&config.downgrade)?,
        })
    }

    pub fn table(&self, direction: Direction) -> &PathTable {
        match direction {
            Direction::Upgrade => &self.upgrade,
            Direction::Downgrade => &self.downgrade,
        }
    }

    pub fn next_hop(&self, current_exact: &str, direction: Direction) -> Option<&str> {
        self.table(direction).next_hop(current_exact)
    }
}
