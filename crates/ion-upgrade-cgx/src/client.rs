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

use crate::errors::{CgxError, CgxResult};
use crate::types::{Element, ElementImage, ItemsResponse, LoginRequest, LoginResponse, Profile};
use anyhow::Context;
use async_trait::async_trait;
use ion_upgrade_core::{DeviceApi, DeviceRecord, FirmwareImage, SoftwareState};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_CONTROLLER: &str = "https://api.elcapitan.cloudgenix.com";

const AUTH_HEADER: &str = "X-Auth-Token";
const LOGIN_PATH: &str = "/v2.0/api/login";
const LOGOUT_PATH: &str = "/v2.0/api/logout";
const PROFILE_PATH: &str = "/v2.0/api/profile";
const ELEMENTS_API: &str = "v2.6";
const IMAGES_API: &str = "v2.0";
const SOFTWARE_STATE_API: &str = "v2.0";

/// CloudGenix controller REST client.
///
/// Calls are single attempts: the transition engine treats any failure as the
/// failure of the enclosing operation.
#[derive(Clone)]
pub struct CloudGenixClient {
    base_url: String,
    client: Client,
    token: Option<String>,
    tenant_id: Option<String>,
}

impl fmt::Debug for CloudGenixClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudGenixClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

impl CloudGenixClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> CgxResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(CgxError::ConfigError(
                "controller base URL is empty".to_owned(),
            ));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CgxError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url,
            client,
            token: None,
            tenant_id: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.tenant_id.is_some()
    }

    /// Authenticate with an existing auth token
    pub async fn use_token(&mut self, token: impl Into<String>) -> CgxResult<()> {
        self.token = Some(token.into());
        self.tenant_id = None;

        let profile: Profile = match self.get_json(&self.url(PROFILE_PATH)).await {
            Ok(profile) => profile,
            Err(e) => {
                self.token = None;
                return Err(e);
            }
        };

        match profile.tenant_id {
            Some(tenant_id) => {
                info!("Authenticated to tenant {tenant_id}");
                self.tenant_id = Some(tenant_id);
                Ok(())
            }
            None => {
                error!("Profile did not contain a tenant id");
                self.token = None;
                Err(CgxError::AuthenticationFailed)
            }
        }
    }

    /// Authenticate with email and password, then load the profile
    pub async fn login(&mut self, email: &str, password: &str) -> CgxResult<()> {
        let url = self.url(LOGIN_PATH);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let login: LoginResponse = Self::decode(response).await?;

        let token = login.x_auth_token.ok_or_else(|| {
            warn!("Login response did not include an auth token");
            CgxError::AuthenticationFailed
        })?;
        self.use_token(token).await
    }

    /// End the session; the client is unauthenticated afterwards
    pub async fn logout(&mut self) -> CgxResult<()> {
        if self.token.is_none() {
            return Ok(());
        }
        let url = self.url(LOGOUT_PATH);
        debug!("GET {url}");

        let response = self.authorized(self.client.get(&url))?.send().await;
        self.token = None;
        self.tenant_id = None;
        Self::check(response?).await?;
        info!("Logged out");
        Ok(())
    }

    pub async fn elements(&self) -> CgxResult<Vec<Element>> {
        let url = self.tenant_url(ELEMENTS_API, "elements")?;
        let response: ItemsResponse<Element> = self.get_json(&url).await?;
        Ok(response.items)
    }

    pub async fn element(&self, element_id: &str) -> CgxResult<Element> {
        let url = self.tenant_url(ELEMENTS_API, &format!("elements/{element_id}"))?;
        self.get_json(&url).await
    }

    pub async fn element_images(&self) -> CgxResult<Vec<ElementImage>> {
        let url = self.tenant_url(IMAGES_API, "element_images")?;
        let response: ItemsResponse<ElementImage> = self.get_json(&url).await?;
        Ok(response.items)
    }

    pub async fn software_state(&self, element_id: &str) -> CgxResult<SoftwareState> {
        let url = self.software_state_url(element_id)?;
        self.get_json(&url).await
    }

    /// Write the software state; any 2xx reply counts as accepted, whatever its body
    pub async fn put_software_state(
        &self,
        element_id: &str,
        state: &SoftwareState,
    ) -> CgxResult<()> {
        let url = self.software_state_url(element_id)?;
        debug!("PUT {url}");
        let response = self
            .authorized(self.client.put(&url))?
            .json(state)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn tenant_url(&self, api_version: &str, resource: &str) -> CgxResult<String> {
        let tenant_id = self
            .tenant_id
            .as_deref()
            .ok_or_else(|| CgxError::ConfigError("not authenticated".to_owned()))?;
        Ok(format!(
            "{}/{api_version}/api/tenants/{tenant_id}/{resource}",
            self.base_url
        ))
    }

    fn software_state_url(&self, element_id: &str) -> CgxResult<String> {
        self.tenant_url(
            SOFTWARE_STATE_API,
            &format!("elements/{element_id}/software/state"),
        )
    }

    fn authorized(&self, request: RequestBuilder) -> CgxResult<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| CgxError::ConfigError("not authenticated".to_owned()))?;
        Ok(request.header(AUTH_HEADER, token))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> CgxResult<T> {
        debug!("GET {url}");
        let response = self.authorized(self.client.get(url))?.send().await?;
        Self::decode(response).await
    }

    async fn check(response: Response) -> CgxResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("Controller rejected credentials ({status})");
                Err(CgxError::AuthenticationFailed)
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                error!("Controller returned {status}: {message}");
                Err(CgxError::ApiError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> CgxResult<T> {
        let body = Self::check(response).await?.text().await?;
        serde_json::from_str(&body).map_err(|e| CgxError::InvalidResponse(format!("{e}: {body}")))
    }
}

#[async_trait]
impl DeviceApi for CloudGenixClient {
    async fn list_devices(&self) -> anyhow::Result<Vec<DeviceRecord>> {
        let elements = self.elements().await.context("Error getting a list of IONs")?;
        Ok(elements
            .into_iter()
            .filter_map(|element| {
                element.hw_id.map(|hardware_serial| DeviceRecord {
                    id: element.id,
                    hardware_serial,
                })
            })
            .collect())
    }

    async fn get_device_version(&self, device_id: &str) -> anyhow::Result<Option<String>> {
        let element = self
            .element(device_id)
            .await
            .with_context(|| format!("Error reading element {device_id}"))?;
        Ok(element.software_version)
    }

    async fn list_firmware_images(&self) -> anyhow::Result<Vec<FirmwareImage>> {
        let images = self
            .element_images()
            .await
            .context("Error getting element images")?;
        Ok(images
            .into_iter()
            .map(|image| FirmwareImage {
                version: image.version,
                image_id: image.id,
            })
            .collect())
    }

    async fn get_software_state(&self, device_id: &str) -> anyhow::Result<SoftwareState> {
        self.software_state(device_id)
            .await
            .context("Error getting software state of element")
    }

    async fn put_software_state(
        &self,
        device_id: &str,
        state: &SoftwareState,
    ) -> anyhow::Result<()> {
        CloudGenixClient::put_software_state(self, device_id, state)
            .await
            .context("Error updating software state of element")?;
        Ok(())
    }
}
