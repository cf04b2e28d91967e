// SPDX-License-Identifier: GPL-3.0-only

//! Btrfs domain models

use serde::{Deserialize, Serialize};

/// One subvolume row from `btrfs subvolume list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtrfsSubvolume {
    /// Subvolume id
    pub id: u64,

    /// Id of the containing subvolume
    pub parent_id: u64,

    /// Path relative to the filesystem root
    pub path: String,
}

/// Summary of a btrfs filesystem, from `btrfs filesystem show`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BtrfsFilesystemInfo {
    /// Filesystem label, if any
    pub label: Option<String>,

    /// Filesystem UUID
    pub uuid: String,

    /// Number of member devices
    pub num_devices: u64,

    /// Bytes used across all devices, when reported
    pub used: Option<u64>,
}
