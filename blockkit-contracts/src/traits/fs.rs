// SPDX-License-Identifier: GPL-3.0-only

use crate::backend::ExtraArg;
use crate::Result;

/// Technologies of the filesystem backend, one per supported filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FsTech {
    Ext4 = 0,
    Xfs = 1,
    Vfat = 2,
}

impl FsTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(FsTech::Ext4),
            1 => Some(FsTech::Xfs),
            2 => Some(FsTech::Vfat),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FsTech::Ext4 => "ext4",
            FsTech::Xfs => "xfs",
            FsTech::Vfat => "vfat",
        }
    }
}

/// Filesystem operations (mkfs.*, wipefs, blkid and per-fs tools).
pub trait FsOps: Send + Sync {
    fn mkfs(&self, device: &str, fstype: &str, extra: &[ExtraArg]) -> Result<()>;

    /// Wipe filesystem signatures. With `all = false` only the first
    /// signature found is erased.
    fn wipe(&self, device: &str, all: bool) -> Result<()>;

    /// Resize a filesystem. `new_size = 0` grows to fill the device.
    /// `fstype = None` probes the device first.
    fn resize(&self, device: &str, new_size: u64, fstype: Option<&str>) -> Result<()>;

    /// Run the filesystem's checker in non-destructive mode.
    fn check(&self, device: &str, fstype: Option<&str>) -> Result<()>;

    /// Probe the filesystem type, `None` when nothing is recognized.
    fn get_fstype(&self, device: &str) -> Result<Option<String>>;
}
