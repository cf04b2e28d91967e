// SPDX-License-Identifier: GPL-3.0-only

use blockkit_types::MdDetail;

use crate::backend::ExtraArg;
use crate::Result;

/// Technologies of the MD RAID backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MdTech {
    Mdraid = 0,
}

impl MdTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(MdTech::Mdraid),
            _ => None,
        }
    }
}

/// MD RAID array operations (mdadm).
pub trait MdOps: Send + Sync {
    /// Create and start an array from `disks`, with the trailing
    /// `spares` count marked as spare devices.
    fn create(
        &self,
        device: &str,
        level: &str,
        disks: &[&str],
        spares: u32,
        version: Option<&str>,
        bitmap: bool,
        extra: &[ExtraArg],
    ) -> Result<()>;

    /// Zero the MD superblock on a member device.
    fn destroy(&self, device: &str) -> Result<()>;

    /// Assemble an array. With `device = None` mdadm scans for it by
    /// `uuid`.
    fn activate(
        &self,
        device: Option<&str>,
        members: &[&str],
        uuid: Option<&str>,
        extra: &[ExtraArg],
    ) -> Result<()>;

    fn deactivate(&self, device: &str) -> Result<()>;

    fn add(&self, raid: &str, device: &str, extra: &[ExtraArg]) -> Result<()>;

    /// Remove a member. With `fail = true` the member is failed first.
    fn remove(&self, raid: &str, device: &str, fail: bool, extra: &[ExtraArg]) -> Result<()>;

    fn detail(&self, raid: &str) -> Result<MdDetail>;

    /// Convert an mdadm-style UUID (`XXXXXXXX:XXXXXXXX:XXXXXXXX:XXXXXXXX`)
    /// to canonical 8-4-4-4-12 form.
    fn canonicalize_uuid(&self, uuid: &str) -> Result<String>;

    /// Array name ("md0" style or named array) for a device node.
    fn name_from_node(&self, node: &str) -> Result<String>;

    /// Device node for an array name.
    fn node_from_name(&self, name: &str) -> Result<String>;
}
