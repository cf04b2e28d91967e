// SPDX-License-Identifier: GPL-3.0-only

//! MD RAID domain models

use serde::{Deserialize, Serialize};

/// Details of an assembled MD array, as reported by `mdadm --detail`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdDetail {
    /// Array device path (e.g. "/dev/md0")
    pub device: String,

    /// Array UUID in canonical 8-4-4-4-12 form
    pub uuid: Option<String>,

    /// RAID level (e.g. "raid1")
    pub level: Option<String>,

    /// Array name from the superblock (e.g. "host:0")
    pub name: Option<String>,

    /// Configured member count
    pub raid_devices: u32,

    /// Currently active member count
    pub active_devices: u32,

    /// Spare member count
    pub spare_devices: u32,

    /// Array size in bytes, when reported
    pub array_size: Option<u64>,

    /// Whether the array is running degraded
    pub degraded: bool,
}

/// One member device of an MD array, from `/proc/mdstat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MdMember {
    /// Kernel device name (e.g. "sda1")
    pub name: String,

    /// Slot number inside the array
    pub slot: Option<u32>,

    /// Whether the member is marked faulty
    pub faulty: bool,
}
