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

//! Entry point tying device lookup, direction deciding and the staged engine together

use crate::api::DeviceApi;
use crate::cancel::CancelToken;
use crate::catalog::Catalog;
use crate::config::TransitionConfig;
use crate::direction::{Action, Decision, decide};
use crate::engine::{StagedEngine, TransitionPlan, TransitionSummary};
use crate::error::{Result, UpgradeError};
use crate::path_table::PathTables;
use crate::protocol;
use tracing::info;

/// What the operator asked for
#[derive(Debug, Clone)]
pub struct TransitionRequest {
    pub serial: String,
    /// Loose target specifier; `None` targets the highest available version
    pub target: Option<String>,
    pub action: Action,
    pub limits: TransitionConfig,
}

/// Resolve a hardware serial to the device handle used by the API
pub async fn find_device_by_serial<A: DeviceApi + ?Sized>(api: &A, serial: &str) -> Result<String> {
    let devices = api
        .list_devices()
        .await
        .map_err(|e| UpgradeError::api("listing devices", &e))?;

    devices
        .into_iter()
        .find(|device| device.hardware_serial == serial)
        .map(|device| device.id)
        .ok_or_else(|| UpgradeError::DeviceNotFound {
            serial: serial.to_owned(),
        })
}

/// Bring the device identified by `request.serial` to the requested version.
///
/// Configuration problems (unknown serial, conflicting action) are returned as
/// errors before any change is requested. Everything after that is reported
/// through the summary's status.
pub async fn go<A: DeviceApi + ?Sized>(
    api: &A,
    tables: &PathTables,
    request: &TransitionRequest,
    cancel: CancelToken,
) -> Result<TransitionSummary> {
    request.limits.validate()?;

    let device_id = find_device_by_serial(api, &request.serial).await?;
    info!("Found device {} for serial {}", device_id, request.serial);

    let catalog = Catalog::snapshot(api).await?;
    let current = protocol::read_version(api, &device_id)
        .await?
        .ok_or_else(|| UpgradeError::DeviceVersionUnavailable {
            device_id: device_id.clone(),
        })?;

    let detected = match decide(&current, request.target.as_deref(), &catalog)? {
        Decision::Change(direction) => direction,
        Decision::AtTarget => {
            info!("Device already runs {current}; nothing to do");
            return Ok(TransitionSummary::already_at_target(
                device_id,
                request.target.clone(),
                current,
            ));
        }
    };

    let direction = request.action.reconcile(detected)?;
    if request.action == Action::Auto {
        info!("Current version {current} compared to target indicates {direction}");
    }

    let plan = TransitionPlan::new(device_id, request.target.clone(), direction, &request.limits);
    let engine = StagedEngine::new(api, tables)
        .with_poll_interval(request.limits.poll_interval())
        .with_cancel(cancel);

    Ok(engine.run(plan).await)
}
