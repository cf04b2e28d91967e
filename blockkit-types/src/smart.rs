// SPDX-License-Identifier: GPL-3.0-only

//! S.M.A.R.T. domain models

use serde::{Deserialize, Serialize};

/// One vendor attribute row from `smartctl -A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartAttribute {
    pub id: u8,
    pub name: String,
    pub value: u8,
    pub worst: u8,
    pub threshold: u8,

    /// Raw value column, tool-formatted
    pub raw: String,
}

/// Health summary for a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartInfo {
    /// Whether SMART reporting is enabled on the device
    pub enabled: bool,

    /// Overall health self-assessment, true = PASSED
    pub healthy: bool,

    pub attributes: Vec<SmartAttribute>,
}
