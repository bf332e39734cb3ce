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

//! ION Upgrade - command line entry point
//!
//! Authenticates to the controller, then moves one appliance to the requested
//! firmware version through the configured upgrade or downgrade path.

mod auth;
mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use ion_upgrade_cgx::CloudGenixClient;
use ion_upgrade_core::{
    CancelToken, PathTables, TransitionRequest, TransitionStatus, TransitionSummary, cancel_pair,
    go,
};
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::AppConfig;

const VERBOSE_DIRECTIVES: [&str; 3] = [
    "ion_upgrade=debug",
    "ion_upgrade_core=debug",
    "ion_upgrade_cgx=debug",
];

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(summary) => {
            println!("{summary}");
            exit_code(&summary.status)
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    // Respects RUST_LOG
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if verbose {
        for directive in VERBOSE_DIRECTIVES {
            if let Ok(directive) = directive.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<TransitionSummary> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.max_steps, cli.max_wait);
    config.validate()?;
    let tables = PathTables::from_config(&config.paths)?;

    info!(
        "Controller {}, max {} steps, {}s per step",
        config.controller.base_url, config.transition.max_steps, config.transition.max_wait_secs
    );

    let token = auth::resolve_token(cli.token.as_deref(), cli.authtokenfile.as_deref(), |var| {
        std::env::var(var).ok()
    })?;

    let mut client = CloudGenixClient::new(&config.controller.base_url, config.controller.timeout())
        .context("Failed to create controller client")?;
    auth::authenticate(&mut client, token).await?;

    let (handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current request");
            handle.cancel();
        }
    });

    let request = TransitionRequest {
        serial: cli.ion_serial,
        target: cli.version_target,
        action: cli.action,
        limits: config.transition,
    };
    transition(&mut client, &tables, &request, cancel).await
}

/// Run the transition on an authenticated session, then log out whatever the outcome
async fn transition(
    client: &mut CloudGenixClient,
    tables: &PathTables,
    request: &TransitionRequest,
    cancel: CancelToken,
) -> Result<TransitionSummary> {
    let result = go(&*client, tables, request, cancel).await;

    auth::logout(client).await;

    Ok(result?)
}

fn exit_code(status: &TransitionStatus) -> ExitCode {
    match status {
        TransitionStatus::Done => ExitCode::SUCCESS,
        TransitionStatus::LimitReached { .. } => ExitCode::from(2),
        TransitionStatus::StepFailed { .. } => ExitCode::FAILURE,
    }
}
