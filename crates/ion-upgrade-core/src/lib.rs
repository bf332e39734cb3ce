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

//! ION Upgrade core - staged firmware transitions for network appliances
//!
//! Appliances only move between adjacent releases of a fixed lattice, so a
//! change to an arbitrary version is performed as a sequence of hops taken
//! from directional path tables, each one requested through the device API
//! and confirmed by polling before the next one starts.

pub mod api;
pub mod cancel;
pub mod catalog;
pub mod config;
pub mod direction;
pub mod driver;
pub mod engine;
pub mod error;
pub mod path_table;
pub mod protocol;
pub mod version;

pub use api::{DeviceApi, DeviceRecord, FirmwareImage, SoftwareState};
pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use catalog::Catalog;
pub use config::TransitionConfig;
pub use direction::{Action, Decision, Direction, decide};
pub use driver::{TransitionRequest, find_device_by_serial, go};
pub use engine::{HopRecord, StagedEngine, TransitionPlan, TransitionStatus, TransitionSummary};
pub use error::{ErrorKind, UpgradeError};
pub use path_table::{PathRule, PathTable, PathTables, PathTablesConfig};
pub use protocol::{WaitOutcome, WaitPolicy, apply_change, await_version};
pub use version::{Version, compare, loose_match};
