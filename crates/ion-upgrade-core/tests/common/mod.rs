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

//! Scripted in-memory appliance used as a `DeviceApi` stand-in

#![allow(dead_code)]

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use ion_upgrade_core::{DeviceApi, DeviceRecord, FirmwareImage, SoftwareState};
use serde_json::json;
use std::sync::Mutex;

pub const SERIAL: &str = "11114d56-0000-b727-d7e8-f46f53aaaaaa";
pub const DEVICE_ID: &str = "15000000000000001";

/// Catalog shaped like a real tenant repository: some builds decorated, some not
pub const CATALOG: &[(&str, &str)] = &[
    ("4.5.3", "img-453"),
    ("4.7.1-b5", "img-471"),
    ("5.0.3", "img-503"),
    ("5.2.7-b22", "img-527"),
    ("5.4.3-b9", "img-543"),
];

#[derive(Debug)]
struct Inner {
    images: Vec<FirmwareImage>,
    version: Option<String>,
    pending: Option<(String, u32)>,
    settle_reads: u32,
    stuck: bool,
    reject_changes: bool,
    catalog_unavailable: bool,
    fail_version_reads: bool,
    state: SoftwareState,
    change_requests: Vec<String>,
    version_reads: u32,
}

/// Appliance that switches to the requested image after a number of polls
#[derive(Debug)]
pub struct FakeAppliance {
    inner: Mutex<Inner>,
}

impl FakeAppliance {
    pub fn new(current: &str) -> Self {
        Self::with_catalog(current, CATALOG)
    }

    pub fn with_catalog(current: &str, catalog: &[(&str, &str)]) -> Self {
        let images = catalog
            .iter()
            .map(|(version, id)| FirmwareImage {
                version: (*version).to_owned(),
                image_id: (*id).to_owned(),
            })
            .collect();
        let state = serde_json::from_value(json!({
            "id": "sw-state-1",
            "image_id": "img-initial",
            "scheduled_upgrade": null,
            "download_interval": 0,
            "_etag": 3
        }))
        .unwrap();

        Self {
            inner: Mutex::new(Inner {
                images,
                version: Some(current.to_owned()),
                pending: None,
                settle_reads: 1,
                stuck: false,
                reject_changes: false,
                catalog_unavailable: false,
                fail_version_reads: false,
                state,
                change_requests: Vec::new(),
                version_reads: 0,
            }),
        }
    }

    /// Number of version reads after a change before the new version shows up
    pub fn settle_after(self, reads: u32) -> Self {
        self.inner.lock().unwrap().settle_reads = reads;
        self
    }

    /// Accept change requests but never move to the new version
    pub fn stuck(self) -> Self {
        self.inner.lock().unwrap().stuck = true;
        self
    }

    pub fn reject_changes(self) -> Self {
        self.inner.lock().unwrap().reject_changes = true;
        self
    }

    pub fn catalog_unavailable(self) -> Self {
        self.inner.lock().unwrap().catalog_unavailable = true;
        self
    }

    pub fn fail_version_reads(self) -> Self {
        self.inner.lock().unwrap().fail_version_reads = true;
        self
    }

    pub fn without_version(self) -> Self {
        self.inner.lock().unwrap().version = None;
        self
    }

    pub fn change_requests(&self) -> Vec<String> {
        self.inner.lock().unwrap().change_requests.clone()
    }

    pub fn version(&self) -> Option<String> {
        self.inner.lock().unwrap().version.clone()
    }

    pub fn version_reads(&self) -> u32 {
        self.inner.lock().unwrap().version_reads
    }

    pub fn state(&self) -> SoftwareState {
        self.inner.lock().unwrap().state.clone()
    }
}

#[async_trait]
impl DeviceApi for FakeAppliance {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        Ok(vec![
            DeviceRecord {
                id: "15000000000000099".to_owned(),
                hardware_serial: "other-serial".to_owned(),
            },
            DeviceRecord {
                id: DEVICE_ID.to_owned(),
                hardware_serial: SERIAL.to_owned(),
            },
        ])
    }

    async fn get_device_version(&self, device_id: &str) -> Result<Option<String>> {
        let mut inner = self.inner.lock().unwrap();
        if device_id != DEVICE_ID {
            bail!("unknown device {device_id}");
        }
        if inner.fail_version_reads {
            bail!("HTTP 502 Bad Gateway");
        }
        inner.version_reads += 1;

        if let Some((target, remaining)) = inner.pending.take() {
            if remaining <= 1 {
                inner.version = Some(target);
            } else {
                inner.pending = Some((target, remaining - 1));
            }
        }
        Ok(inner.version.clone())
    }

    async fn list_firmware_images(&self) -> Result<Vec<FirmwareImage>> {
        let inner = self.inner.lock().unwrap();
        if inner.catalog_unavailable {
            bail!("HTTP 503 Service Unavailable");
        }
        Ok(inner.images.clone())
    }

    async fn get_software_state(&self, _device_id: &str) -> Result<SoftwareState> {
        Ok(self.inner.lock().unwrap().state.clone())
    }

    async fn put_software_state(&self, _device_id: &str, state: &SoftwareState) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let image_id = state
            .image_id()
            .ok_or_else(|| anyhow!("software state without image_id"))?
            .to_owned();
        inner.change_requests.push(image_id.clone());

        if inner.reject_changes {
            bail!("HTTP 400 Bad Request: image not permitted");
        }

        let version = inner
            .images
            .iter()
            .find(|image| image.image_id == image_id)
            .map(|image| image.version.clone())
            .ok_or_else(|| anyhow!("unknown image {image_id}"))?;

        inner.state = state.clone();
        if !inner.stuck {
            let settle = inner.settle_reads;
            inner.pending = Some((version, settle));
        }
        Ok(())
    }
}
