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

//! Wire types of the CloudGenix controller API

use serde::{Deserialize, Serialize};

/// Envelope used by every list endpoint
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemsResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub x_auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// ION element as listed by the controller
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Element {
    pub id: String,
    #[serde(default)]
    pub hw_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub software_version: Option<String>,
}

/// Firmware image in the tenant's element image repository
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElementImage {
    pub id: String,
    pub version: String,
    #[serde(default)]
    pub state: Option<String>,
}
