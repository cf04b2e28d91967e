// SPDX-License-Identifier: GPL-3.0-only

use blockkit_types::{BtrfsFilesystemInfo, BtrfsSubvolume};

use crate::backend::ExtraArg;
use crate::Result;

/// Technologies of the btrfs backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BtrfsTech {
    Filesystem = 0,
    MultiDevice = 1,
    Subvolume = 2,
    Snapshot = 3,
}

impl BtrfsTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(BtrfsTech::Filesystem),
            1 => Some(BtrfsTech::MultiDevice),
            2 => Some(BtrfsTech::Subvolume),
            3 => Some(BtrfsTech::Snapshot),
            _ => None,
        }
    }
}

/// Btrfs volume and subvolume operations (btrfs-progs).
pub trait BtrfsOps: Send + Sync {
    fn create_volume(
        &self,
        devices: &[&str],
        label: Option<&str>,
        data_level: Option<&str>,
        md_level: Option<&str>,
        extra: &[ExtraArg],
    ) -> Result<()>;

    fn add_device(&self, mountpoint: &str, device: &str, extra: &[ExtraArg]) -> Result<()>;

    fn remove_device(&self, mountpoint: &str, device: &str, extra: &[ExtraArg]) -> Result<()>;

    fn create_subvolume(&self, mountpoint: &str, name: &str, extra: &[ExtraArg]) -> Result<()>;

    fn delete_subvolume(&self, mountpoint: &str, name: &str, extra: &[ExtraArg]) -> Result<()>;

    /// Subvolumes under `mountpoint`; with `snapshots_only` restricted to
    /// snapshot subvolumes.
    fn list_subvolumes(&self, mountpoint: &str, snapshots_only: bool)
    -> Result<Vec<BtrfsSubvolume>>;

    fn create_snapshot(
        &self,
        source: &str,
        dest: &str,
        read_only: bool,
        extra: &[ExtraArg],
    ) -> Result<()>;

    fn filesystem_info(&self, device: &str) -> Result<BtrfsFilesystemInfo>;
}
