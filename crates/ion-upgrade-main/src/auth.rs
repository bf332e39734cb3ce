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

//! Credential acquisition for the controller session

use anyhow::{Context, Result, bail};
use console::Term;
use ion_upgrade_cgx::{CgxError, CloudGenixClient};
use std::path::Path;
use tracing::{info, warn};

const TOKEN_ENV_VARS: [&str; 2] = ["X_AUTH_TOKEN", "AUTH_TOKEN"];
const LOGIN_ATTEMPTS: u32 = 3;

/// Where the auth token came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Argument,
    File,
    Environment(&'static str),
}

/// Pick a token from, in order: the argument, the token file, then the environment.
///
/// `Ok(None)` means an interactive login is needed.
pub fn resolve_token(
    token: Option<&str>,
    token_file: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<(String, TokenSource)>> {
    if let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) {
        return Ok(Some((token.to_owned(), TokenSource::Argument)));
    }

    if let Some(path) = token_file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read auth token file {}", path.display()))?;
        let token = content.trim();
        if token.is_empty() {
            bail!("Auth token file {} is empty", path.display());
        }
        return Ok(Some((token.to_owned(), TokenSource::File)));
    }

    Ok(TOKEN_ENV_VARS.iter().find_map(|&var| {
        lookup(var)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .map(|value| (value, TokenSource::Environment(var)))
    }))
}

/// Establish the controller session, prompting for credentials when no token is available
pub async fn authenticate(
    client: &mut CloudGenixClient,
    token: Option<(String, TokenSource)>,
) -> Result<()> {
    if let Some((token, source)) = token {
        info!("Authenticating with token from {source:?}");
        return client
            .use_token(token)
            .await
            .context("Token authentication failed");
    }

    let term = Term::stderr();
    for attempt in 1..=LOGIN_ATTEMPTS {
        term.write_str("email: ")?;
        let email = term.read_line()?;
        term.write_str("password: ")?;
        let password = term.read_secure_line()?;

        match client.login(email.trim(), &password).await {
            Ok(()) => return Ok(()),
            Err(CgxError::AuthenticationFailed) if attempt < LOGIN_ATTEMPTS => {
                warn!("Login failed, please try again ({attempt}/{LOGIN_ATTEMPTS})");
            }
            Err(e) => return Err(e).context("Login failed"),
        }
    }

    bail!("Login failed after {LOGIN_ATTEMPTS} attempts")
}

/// End the session; failures are only logged
pub async fn logout(client: &mut CloudGenixClient) {
    if let Err(e) = client.logout().await {
        warn!("Logout failed: {e}");
    }
}
