//! Farm registry of configured printers

use std::collections::{BTreeMap, HashSet};

use super::types::DeviceRecord;
use crate::{Error, Result};

/// Registry of configured printers keyed by id
#[derive(Debug, Clone, Default)]
pub struct Farm {
    devices: BTreeMap<String, DeviceRecord>,
}

impl Farm {
    /// Create a registry from device records
    ///
    /// A later record with a duplicate id replaces the earlier one.
    #[must_use]
    pub fn new(records: impl IntoIterator<Item = DeviceRecord>) -> Self {
        let devices = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self { devices }
    }

    /// Get a printer by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&DeviceRecord> {
        self.devices.get(id)
    }

    /// All printers, ordered by id
    #[must_use]
    pub fn all(&self) -> Vec<DeviceRecord> {
        self.devices.values().cloned().collect()
    }

    /// Resolve a comma-separated selection into device records
    ///
    /// Keeps selection order, skips blank entries and repeated ids.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDevice` for the first id that is not configured
    pub fn select(&self, selection: &str) -> Result<Vec<DeviceRecord>> {
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for id in selection.split(',').map(str::trim).filter(|id| !id.is_empty()) {
            if !seen.insert(id) {
                continue;
            }
            let record = self
                .devices
                .get(id)
                .ok_or_else(|| Error::UnknownDevice(id.to_string()))?;
            records.push(record.clone());
        }

        Ok(records)
    }

    /// Number of configured printers
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no printers are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
