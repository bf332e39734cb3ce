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

//! Change-and-wait protocol: request one firmware change, then poll until the
//! device reports the expected version.

use crate::api::DeviceApi;
use crate::cancel::CancelToken;
use crate::error::{Result, UpgradeError};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interval between version polls unless configured otherwise
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Reached { waited: Duration },
    Timeout { waited: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    pub fn new(max_wait: Duration) -> Self {
        Self {
            max_wait,
            poll_interval: POLL_INTERVAL,
        }
    }
}

/// Point the device's software state at `image_id`.
///
/// Single attempt: the state record is read, only its image reference is
/// replaced, and it is written back.
pub async fn apply_change<A: DeviceApi + ?Sized>(
    api: &A,
    device_id: &str,
    image_id: &str,
) -> Result<()> {
    let mut state = api.get_software_state(device_id).await.map_err(|e| {
        UpgradeError::ChangeRejected(format!("error getting software state of device: {e:#}"))
    })?;

    state.set_image_id(image_id);

    info!("Executing firmware change on {device_id} (image {image_id})");
    api.put_software_state(device_id, &state)
        .await
        .map_err(|e| {
            UpgradeError::ChangeRejected(format!(
                "error updating software state of device: {e:#}"
            ))
        })
}

/// Poll the device until it reports exactly `expected` or the wait budget is spent.
///
/// Read failures abort immediately; a missed deadline is `WaitOutcome::Timeout`.
pub async fn await_version<A: DeviceApi + ?Sized>(
    api: &A,
    device_id: &str,
    expected: &str,
    policy: WaitPolicy,
    cancel: &CancelToken,
) -> Result<WaitOutcome> {
    info!(
        "Waiting for firmware change to {expected} for up to {} seconds",
        policy.max_wait.as_secs()
    );

    let mut waited = Duration::ZERO;
    let mut current = read_version(api, device_id).await?;

    while current.as_deref() != Some(expected) && waited < policy.max_wait {
        debug!(
            "...Waiting {} seconds (device reports {})",
            policy.max_wait.saturating_sub(waited).as_secs(),
            current.as_deref().unwrap_or("nothing")
        );

        tokio::select! {
            () = tokio::time::sleep(policy.poll_interval) => {}
            () = cancel.cancelled() => {
                warn!("Wait for {expected} cancelled after {}s", waited.as_secs());
                return Err(UpgradeError::Cancelled);
            }
        }

        waited += policy.poll_interval;
        current = read_version(api, device_id).await?;
    }

    if current.as_deref() == Some(expected) {
        info!("Firmware change completed after {} seconds", waited.as_secs());
        Ok(WaitOutcome::Reached { waited })
    } else {
        warn!("Sleep timer expired waiting for device to reach {expected}");
        Ok(WaitOutcome::Timeout { waited })
    }
}

pub(crate) async fn read_version<A: DeviceApi + ?Sized>(
    api: &A,
    device_id: &str,
) -> Result<Option<String>> {
    api.get_device_version(device_id)
        .await
        .map_err(|e| UpgradeError::api("reading device version", &e))
}
