// SPDX-License-Identifier: GPL-3.0-only

//! Btrfs façade

use blockkit_contracts::traits::{BtrfsOps, BtrfsTech};
use blockkit_contracts::{Error, ExtraArg, Result, TechModes};
use blockkit_types::{BackendId, BtrfsFilesystemInfo, BtrfsSubvolume};

pub use blockkit_contracts::traits::BtrfsTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn BtrfsOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Btrfs, |backend| {
        let btrfs = backend
            .as_btrfs()
            .ok_or_else(|| Error::not_available(BackendId::Btrfs))?;
        call(btrfs)
    })
}

pub fn create_volume(
    devices: &[&str],
    label: Option<&str>,
    data_level: Option<&str>,
    md_level: Option<&str>,
    extra: &[ExtraArg],
) -> Result<()> {
    ops(|btrfs| btrfs.create_volume(devices, label, data_level, md_level, extra))
}

pub fn add_device(mountpoint: &str, device: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|btrfs| btrfs.add_device(mountpoint, device, extra))
}

pub fn remove_device(mountpoint: &str, device: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|btrfs| btrfs.remove_device(mountpoint, device, extra))
}

pub fn create_subvolume(mountpoint: &str, name: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|btrfs| btrfs.create_subvolume(mountpoint, name, extra))
}

pub fn delete_subvolume(mountpoint: &str, name: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|btrfs| btrfs.delete_subvolume(mountpoint, name, extra))
}

pub fn list_subvolumes(mountpoint: &str, snapshots_only: bool) -> Result<Vec<BtrfsSubvolume>> {
    ops(|btrfs| btrfs.list_subvolumes(mountpoint, snapshots_only))
}

pub fn create_snapshot(
    source: &str,
    dest: &str,
    read_only: bool,
    extra: &[ExtraArg],
) -> Result<()> {
    ops(|btrfs| btrfs.create_snapshot(source, dest, read_only, extra))
}

pub fn filesystem_info(device: &str) -> Result<BtrfsFilesystemInfo> {
    ops(|btrfs| btrfs.filesystem_info(device))
}

pub fn is_tech_available(tech: BtrfsTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Btrfs, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
