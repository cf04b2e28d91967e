// SPDX-License-Identifier: GPL-3.0-only

use blockkit_types::{LvmLvInfo, LvmPvInfo, LvmVgInfo};

use crate::backend::ExtraArg;
use crate::Result;

/// Technologies of the LVM backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LvmTech {
    Basic = 0,
    ThinProvisioning = 1,
}

impl LvmTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(LvmTech::Basic),
            1 => Some(LvmTech::ThinProvisioning),
            _ => None,
        }
    }
}

/// LVM operations (lvm2 CLI).
pub trait LvmOps: Send + Sync {
    fn pv_create(&self, device: &str, extra: &[ExtraArg]) -> Result<()>;

    fn pv_remove(&self, device: &str, extra: &[ExtraArg]) -> Result<()>;

    /// Create a volume group. `pe_size = 0` keeps the tool default.
    fn vg_create(&self, name: &str, devices: &[&str], pe_size: u64, extra: &[ExtraArg])
    -> Result<()>;

    fn vg_remove(&self, name: &str, extra: &[ExtraArg]) -> Result<()>;

    /// Create a logical volume of `size` bytes.
    fn lv_create(
        &self,
        vg: &str,
        name: &str,
        size: u64,
        pvs: &[&str],
        extra: &[ExtraArg],
    ) -> Result<()>;

    fn lv_remove(&self, vg: &str, name: &str, force: bool, extra: &[ExtraArg]) -> Result<()>;

    fn lv_resize(&self, vg: &str, name: &str, size: u64, extra: &[ExtraArg]) -> Result<()>;

    fn pvs(&self) -> Result<Vec<LvmPvInfo>>;

    fn vgs(&self) -> Result<Vec<LvmVgInfo>>;

    /// Logical volumes, optionally restricted to one volume group.
    fn lvs(&self, vg: Option<&str>) -> Result<Vec<LvmLvInfo>>;
}
