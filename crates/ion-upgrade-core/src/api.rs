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

//! Device-management API seam consumed by the transition engine

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A managed appliance as listed by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Opaque handle used for every later call
    pub id: String,
    pub hardware_serial: String,
}

/// Firmware image available in the tenant's repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareImage {
    /// Exact, vendor-decorated version string (e.g. "5.2.7-b22")
    pub version: String,
    pub image_id: String,
}

/// Software-state record of a device.
///
/// Kept opaque so that a read-modify-write round trip preserves whatever the
/// controller put in it; only the image reference is ever touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SoftwareState(Map<String, Value>);

impl SoftwareState {
    pub const IMAGE_ID_FIELD: &'static str = "image_id";

    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn image_id(&self) -> Option<&str> {
        self.0.get(Self::IMAGE_ID_FIELD).and_then(Value::as_str)
    }

    pub fn set_image_id(&mut self, image_id: &str) {
        self.0.insert(
            Self::IMAGE_ID_FIELD.to_owned(),
            Value::String(image_id.to_owned()),
        );
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Remote device API used by the engine.
///
/// Implementations report failure through `Err`; the engine decides whether a
/// failure aborts the step.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// List every device visible to the session
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>>;

    /// Software version the device currently reports, if any
    async fn get_device_version(&self, device_id: &str) -> Result<Option<String>>;

    /// List firmware images available for installation
    async fn list_firmware_images(&self) -> Result<Vec<FirmwareImage>>;

    /// Read the device's software-state record
    async fn get_software_state(&self, device_id: &str) -> Result<SoftwareState>;

    /// Write back a software-state record, triggering the firmware change
    async fn put_software_state(&self, device_id: &str, state: &SoftwareState) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_image_id_preserves_other_fields() {
        let mut state: SoftwareState = serde_json::from_value(json!({
            "id": "sw-1",
            "image_id": "100",
            "scheduled_upgrade": null,
            "_etag": 7
        }))
        .unwrap();

        state.set_image_id("205");

        assert_eq!(state.image_id(), Some("205"));
        assert_eq!(
            serde_json::to_value(&state).unwrap(),
            json!({
                "id": "sw-1",
                "image_id": "205",
                "scheduled_upgrade": null,
                "_etag": 7
            })
        );
    }

    #[test]
    fn test_set_image_id_on_empty_state() {
        let mut state = SoftwareState::default();
        assert_eq!(state.image_id(), None);
        state.set_image_id("42");
        assert_eq!(state.fields().len(), 1);
        assert_eq!(state.image_id(), Some("42"));
    }
}
