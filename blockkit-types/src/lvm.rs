// SPDX-License-Identifier: GPL-3.0-only

//! LVM domain models
//!
//! Row types for the `pvs`/`vgs`/`lvs` report queries. Sizes are bytes
//! (the backend queries with `--units b --nosuffix`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LvmPvInfo {
    /// PV device path
    pub pv_name: String,

    /// Volume group the PV belongs to, if any
    pub vg_name: Option<String>,

    pub pv_size: u64,
    pub pv_free: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LvmVgInfo {
    pub vg_name: String,
    pub vg_size: u64,
    pub vg_free: u64,

    /// Extent size in bytes
    pub extent_size: u64,

    pub pv_count: u32,
    pub lv_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LvmLvInfo {
    pub vg_name: String,
    pub lv_name: String,

    /// Activation node path (e.g. "/dev/vg0/root")
    pub lv_path: String,

    pub lv_size: u64,
    pub active: bool,
}
