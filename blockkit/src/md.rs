// SPDX-License-Identifier: GPL-3.0-only

//! MD RAID façade

use blockkit_contracts::traits::{MdOps, MdTech};
use blockkit_contracts::{Error, ExtraArg, Result, TechModes};
use blockkit_types::{BackendId, MdDetail};

pub use blockkit_contracts::traits::MdTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn MdOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::MdRaid, |backend| {
        let md = backend
            .as_md()
            .ok_or_else(|| Error::not_available(BackendId::MdRaid))?;
        call(md)
    })
}

/// Create and start an array; the trailing `spares` of `disks` become
/// spare devices.
pub fn create(
    device: &str,
    level: &str,
    disks: &[&str],
    spares: u32,
    version: Option<&str>,
    bitmap: bool,
    extra: &[ExtraArg],
) -> Result<()> {
    ops(|md| md.create(device, level, disks, spares, version, bitmap, extra))
}

/// Zero the MD superblock on a member device.
pub fn destroy(device: &str) -> Result<()> {
    ops(|md| md.destroy(device))
}

pub fn activate(
    device: Option<&str>,
    members: &[&str],
    uuid: Option<&str>,
    extra: &[ExtraArg],
) -> Result<()> {
    ops(|md| md.activate(device, members, uuid, extra))
}

pub fn deactivate(device: &str) -> Result<()> {
    ops(|md| md.deactivate(device))
}

pub fn add(raid: &str, device: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|md| md.add(raid, device, extra))
}

pub fn remove(raid: &str, device: &str, fail: bool, extra: &[ExtraArg]) -> Result<()> {
    ops(|md| md.remove(raid, device, fail, extra))
}

pub fn detail(raid: &str) -> Result<MdDetail> {
    ops(|md| md.detail(raid))
}

/// Convert an mdadm-style UUID to canonical 8-4-4-4-12 form.
pub fn canonicalize_uuid(uuid: &str) -> Result<String> {
    ops(|md| md.canonicalize_uuid(uuid))
}

pub fn name_from_node(node: &str) -> Result<String> {
    ops(|md| md.name_from_node(node))
}

pub fn node_from_name(name: &str) -> Result<String> {
    ops(|md| md.node_from_name(name))
}

pub fn is_tech_available(tech: MdTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::MdRaid, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
