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

use clap::Parser;
use ion_upgrade_core::Action;
use std::path::PathBuf;

/// Staged firmware transitions for CloudGenix ION appliances
#[derive(Debug, Parser)]
#[command(name = "ion-upgrade", version)]
#[command(about = "Move an ION appliance to a target firmware version through supported steps", long_about = None)]
pub struct Cli {
    /// Hardware serial of the ION to change
    #[arg(short = 'i', long = "ion-serial")]
    pub ion_serial: String,

    /// Target version; loose specifiers such as "5.2" are accepted. Defaults to the highest available
    #[arg(short = 'v', long = "version-target")]
    pub version_target: Option<String>,

    /// Auth token to use instead of an interactive login
    #[arg(short = 't', long)]
    pub token: Option<String>,

    /// File containing an auth token
    #[arg(short = 'f', long)]
    pub authtokenfile: Option<PathBuf>,

    /// Direction of the change: upgrade, downgrade or auto
    #[arg(short = 'a', long, default_value_t = Action::Auto)]
    pub action: Action,

    /// Maximum number of firmware changes in this run
    #[arg(short = 's', long)]
    pub max_steps: Option<u32>,

    /// Maximum seconds to wait for each change to take effect
    #[arg(short = 'w', long)]
    pub max_wait: Option<u64>,

    /// Configuration file (defaults to ./ion-upgrade.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging for this tool
    #[arg(long)]
    pub verbose: bool,
}
