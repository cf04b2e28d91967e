// SPDX-License-Identifier: GPL-3.0-only

use crate::Result;

/// Technologies of the device-mapper backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DmTech {
    Map = 0,
}

impl DmTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(DmTech::Map),
            _ => None,
        }
    }
}

/// Device-mapper operations (dmsetup).
pub trait DmOps: Send + Sync {
    /// Create a linear map of `length` sectors over `device`.
    fn create_linear(
        &self,
        map_name: &str,
        device: &str,
        length: u64,
        uuid: Option<&str>,
    ) -> Result<()>;

    fn remove(&self, map_name: &str) -> Result<()>;

    fn map_exists(&self, map_name: &str) -> Result<bool>;

    /// Map name for a dm node ("dm-0" → name).
    fn name_from_node(&self, node: &str) -> Result<String>;

    /// dm node for a map name (name → "dm-0").
    fn node_from_name(&self, name: &str) -> Result<String>;
}
