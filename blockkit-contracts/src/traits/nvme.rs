// SPDX-License-Identifier: GPL-3.0-only

use crate::Result;

/// Technologies of the NVMe backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum NvmeTech {
    Nvme = 0,
}

impl NvmeTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(NvmeTech::Nvme),
            _ => None,
        }
    }
}

/// NVMe device operations (nvme-cli, sysfs).
pub trait NvmeOps: Send + Sync {
    /// Namespace block devices of a controller ("nvme0" → ["nvme0n1"]).
    fn get_namespaces(&self, controller: &str) -> Result<Vec<String>>;

    /// Low-level format of a namespace.
    fn format(&self, device: &str) -> Result<()>;

    /// NVMe sanitize (block erase) on a controller.
    fn sanitize(&self, device: &str) -> Result<()>;

    /// Start a device self-test.
    fn self_test(&self, device: &str, extended: bool) -> Result<()>;
}
