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

//! Image catalog resolver
//!
//! Maps loose version specifiers ("5.2.7") onto the exact, vendor-decorated
//! versions ("5.2.7-b22") found in the firmware repository.

use crate::api::{DeviceApi, FirmwareImage};
use crate::direction::Direction;
use crate::error::{Result, UpgradeError};
use crate::version::{Version, loose_match};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::{debug, warn};

/// Snapshot of available firmware images keyed by exact version
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    images: BTreeMap<String, FirmwareImage>,
}

impl Catalog {
    /// Build a catalog; the first image listed for a version wins
    pub fn from_images(images: impl IntoIterator<Item = FirmwareImage>) -> Self {
        let mut map = BTreeMap::new();
        for image in images {
            match map.entry(image.version.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(image);
                }
                Entry::Occupied(existing) => {
                    warn!(
                        "Duplicate image for version {} ({} and {}), keeping the first",
                        image.version,
                        existing.get().image_id,
                        image.image_id
                    );
                }
            }
        }
        Self { images: map }
    }

    /// Fetch a fresh catalog from the device API
    pub async fn snapshot<A: DeviceApi + ?Sized>(api: &A) -> Result<Self> {
        let images = api
            .list_firmware_images()
            .await
            .map_err(|e| UpgradeError::CatalogUnavailable(format!("{e:#}")))?;
        debug!("Catalog snapshot: {} images", images.len());
        Ok(Self::from_images(images))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, exact_version: &str) -> Option<&FirmwareImage> {
        self.images.get(exact_version)
    }

    /// Exact versions in key order
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    /// Highest version by numeric ordering
    pub fn highest(&self) -> Option<&str> {
        self.extreme(Direction::Upgrade)
    }

    /// Lowest version by numeric ordering
    pub fn lowest(&self) -> Option<&str> {
        self.extreme(Direction::Downgrade)
    }

    /// Resolve a specifier to an exact catalog version.
    ///
    /// An absent or empty specifier resolves to the highest version when
    /// upgrading and the lowest when downgrading.
    pub fn resolve_exact(&self, specifier: Option<&str>, direction: Direction) -> Option<&str> {
        match specifier.filter(|s| !s.is_empty()) {
            Some(specifier) => self.find_loose(specifier),
            None => self.extreme(direction),
        }
    }

    /// Exact version containing `specifier`.
    ///
    /// Several keys can contain the same specifier; the shortest one wins so the
    /// choice does not depend on listing order.
    pub fn find_loose(&self, specifier: &str) -> Option<&str> {
        self.versions()
            .filter(|exact| loose_match(specifier, exact))
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
    }

    fn extreme(&self, direction: Direction) -> Option<&str> {
        let parsed = self.versions().filter_map(|raw| match Version::parse(raw) {
            Ok(version) => Some((version, raw)),
            Err(e) => {
                warn!("Skipping catalog entry: {e}");
                None
            }
        });

        let ordering = |a: &(Version, &str), b: &(Version, &str)| {
            a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1))
        };

        let best = match direction {
            Direction::Upgrade => parsed.max_by(ordering),
            Direction::Downgrade => parsed.min_by(ordering),
        };
        best.map(|(_, raw)| raw)
    }
}
