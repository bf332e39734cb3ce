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

//! Staged transition engine
//!
//! Walks the device one hop at a time along the path table for the chosen
//! direction until the target version is reached, the step budget runs out,
//! or a step fails. Each step works from a fresh catalog snapshot because the
//! image repository can change between calls.

use crate::api::DeviceApi;
use crate::cancel::CancelToken;
use crate::catalog::Catalog;
use crate::config::TransitionConfig;
use crate::direction::Direction;
use crate::error::{Result, UpgradeError};
use crate::path_table::PathTables;
use crate::protocol::{self, WaitOutcome, WaitPolicy};
use crate::version::loose_match;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};

/// Parameters and progress of one run; owned by the engine until it finishes
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub device_id: String,
    /// Loose target specifier; `None` means highest (upgrade) or lowest (downgrade)
    pub target: Option<String>,
    pub direction: Direction,
    pub max_steps: u32,
    pub max_wait: Duration,
    /// Hops completed so far
    pub step_count: u32,
}

impl TransitionPlan {
    pub fn new(
        device_id: impl Into<String>,
        target: Option<String>,
        direction: Direction,
        limits: &TransitionConfig,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            target,
            direction,
            max_steps: limits.max_steps,
            max_wait: limits.max_wait(),
            step_count: 0,
        }
    }

    fn target_label(&self) -> &str {
        self.target.as_deref().unwrap_or(match self.direction {
            Direction::Upgrade => "<highest available>",
            Direction::Downgrade => "<lowest available>",
        })
    }
}

/// One completed firmware change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopRecord {
    pub step: u32,
    pub from: String,
    pub to: String,
    pub waited_secs: u64,
}

#[derive(Debug)]
pub enum TransitionStatus {
    /// Device is at the target version
    Done,
    /// Step budget exhausted before the target was reached; safe to resume
    LimitReached { max_steps: u32 },
    /// A step failed; nothing after it was attempted
    StepFailed { step: u32, reason: UpgradeError },
}

impl TransitionStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for TransitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Done => write!(f, "DONE"),
            Self::LimitReached { max_steps } => write!(f, "LIMIT_REACHED ({max_steps} steps)"),
            Self::StepFailed { step, reason } => write!(f, "STEP_FAILED at step {step}: {reason}"),
        }
    }
}

/// Report handed back to the caller at the end of a run
#[derive(Debug)]
pub struct TransitionSummary {
    pub device_id: String,
    pub direction: Option<Direction>,
    pub target: Option<String>,
    pub hops: Vec<HopRecord>,
    pub final_version: Option<String>,
    pub status: TransitionStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl TransitionSummary {
    /// Summary for a device that needed no change at all
    pub fn already_at_target(
        device_id: impl Into<String>,
        target: Option<String>,
        version: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            device_id: device_id.into(),
            direction: None,
            target,
            hops: Vec::new(),
            final_version: Some(version.into()),
            status: TransitionStatus::Done,
            started_at: now,
            finished_at: now,
        }
    }

    pub fn steps_completed(&self) -> usize {
        self.hops.len()
    }
}

impl fmt::Display for TransitionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Device:        {}", self.device_id)?;
        if let Some(direction) = self.direction {
            writeln!(f, "Direction:     {direction}")?;
        }
        writeln!(
            f,
            "Target:        {}",
            self.target.as_deref().unwrap_or("<default>")
        )?;
        writeln!(f, "Steps:         {}", self.steps_completed())?;
        for hop in &self.hops {
            writeln!(
                f,
                "  {}. {} -> {} ({}s)",
                hop.step, hop.from, hop.to, hop.waited_secs
            )?;
        }
        writeln!(
            f,
            "Final version: {}",
            self.final_version.as_deref().unwrap_or("unknown")
        )?;
        write!(f, "Status:        {}", self.status)
    }
}

enum StepOutcome {
    AtTarget,
    Hopped(HopRecord),
}

/// Control loop driving a single device through its path table
pub struct StagedEngine<'a, A: DeviceApi + ?Sized> {
    api: &'a A,
    tables: &'a PathTables,
    poll_interval: Duration,
    cancel: CancelToken,
}

impl<A: DeviceApi + ?Sized> fmt::Debug for StagedEngine<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedEngine")
            .field("tables", &self.tables)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

impl<'a, A: DeviceApi + ?Sized> StagedEngine<'a, A> {
    pub fn new(api: &'a A, tables: &'a PathTables) -> Self {
        Self {
            api,
            tables,
            poll_interval: protocol::POLL_INTERVAL,
            cancel: CancelToken::never(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the plan to a terminal status; never makes more than `max_steps` change requests
    pub async fn run(&self, mut plan: TransitionPlan) -> TransitionSummary {
        let started_at = Utc::now();
        let mut hops = Vec::new();

        let status = loop {
            let step = plan.step_count + 1;

            if step > plan.max_steps {
                warn!("Max firmware steps ({}) reached. Aborting!", plan.max_steps);
                break TransitionStatus::LimitReached {
                    max_steps: plan.max_steps,
                };
            }

            if self.cancel.is_cancelled() {
                break TransitionStatus::StepFailed {
                    step,
                    reason: UpgradeError::Cancelled,
                };
            }

            match self.step(&plan, step).await {
                Ok(StepOutcome::AtTarget) => break TransitionStatus::Done,
                Ok(StepOutcome::Hopped(hop)) => {
                    hops.push(hop);
                    plan.step_count = step;
                }
                Err(reason) => {
                    error!("Step {step} failed: {reason}");
                    break TransitionStatus::StepFailed { step, reason };
                }
            }
        };

        let final_version = match protocol::read_version(self.api, &plan.device_id).await {
            Ok(version) => version,
            Err(e) => {
                warn!("Could not read final device version: {e}");
                None
            }
        };

        if status.is_done() && !hops.is_empty() {
            info!(
                "Completed firmware change to version {}",
                final_version.as_deref().unwrap_or("unknown")
            );
        }

        TransitionSummary {
            device_id: plan.device_id,
            direction: Some(plan.direction),
            target: plan.target,
            hops,
            final_version,
            status,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn step(&self, plan: &TransitionPlan, step: u32) -> Result<StepOutcome> {
        let catalog = Catalog::snapshot(self.api).await?;
        let current = protocol::read_version(self.api, &plan.device_id)
            .await?
            .ok_or_else(|| UpgradeError::DeviceVersionUnavailable {
                device_id: plan.device_id.clone(),
            })?;

        let exact_target = catalog.resolve_exact(plan.target.as_deref(), plan.direction);
        if reached_target(&current, plan.target.as_deref(), exact_target) {
            info!("Currently at target version {current}. Completed.");
            return Ok(StepOutcome::AtTarget);
        }

        let exact_target = exact_target.ok_or_else(|| UpgradeError::CatalogResolution {
            specifier: plan.target_label().to_owned(),
        })?;

        let hop_specifier = self
            .tables
            .next_hop(&current, plan.direction)
            .ok_or_else(|| UpgradeError::NoPathEntry {
                current: current.clone(),
                direction: plan.direction,
            })?;

        let hop = catalog
            .find_loose(hop_specifier)
            .and_then(|exact| catalog.get(exact))
            .ok_or_else(|| UpgradeError::HopNotInCatalog {
                specifier: hop_specifier.to_owned(),
            })?;

        info!(
            "Step {step}: performing {} from {current} to {} (target version: {exact_target})",
            plan.direction, hop.version
        );

        protocol::apply_change(self.api, &plan.device_id, &hop.image_id).await?;

        let policy = WaitPolicy {
            max_wait: plan.max_wait,
            poll_interval: self.poll_interval,
        };
        match protocol::await_version(self.api, &plan.device_id, &hop.version, policy, &self.cancel)
            .await?
        {
            WaitOutcome::Reached { waited } => Ok(StepOutcome::Hopped(HopRecord {
                step,
                from: current,
                to: hop.version.clone(),
                waited_secs: waited.as_secs(),
            })),
            WaitOutcome::Timeout { waited } => Err(UpgradeError::WaitTimeout {
                expected: hop.version.clone(),
                waited_secs: waited.as_secs(),
            }),
        }
    }
}

/// Current version counts as the target on exact equality with the specifier or
/// the resolved catalog key, or when it loosely contains the specifier.
fn reached_target(current: &str, specifier: Option<&str>, exact_target: Option<&str>) -> bool {
    if exact_target == Some(current) {
        return true;
    }
    specifier
        .filter(|s| !s.is_empty())
        .is_some_and(|s| s == current || loose_match(s, current))
}
