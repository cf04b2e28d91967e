// SPDX-License-Identifier: GPL-3.0-only

//! LVM façade

use blockkit_contracts::traits::{LvmOps, LvmTech};
use blockkit_contracts::{Error, ExtraArg, Result, TechModes};
use blockkit_types::{BackendId, LvmLvInfo, LvmPvInfo, LvmVgInfo};

pub use blockkit_contracts::traits::LvmTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn LvmOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Lvm, |backend| {
        let lvm = backend
            .as_lvm()
            .ok_or_else(|| Error::not_available(BackendId::Lvm))?;
        call(lvm)
    })
}

pub fn pv_create(device: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|lvm| lvm.pv_create(device, extra))
}

pub fn pv_remove(device: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|lvm| lvm.pv_remove(device, extra))
}

/// Create a volume group; `pe_size = 0` keeps the tool default.
pub fn vg_create(name: &str, devices: &[&str], pe_size: u64, extra: &[ExtraArg]) -> Result<()> {
    ops(|lvm| lvm.vg_create(name, devices, pe_size, extra))
}

pub fn vg_remove(name: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|lvm| lvm.vg_remove(name, extra))
}

pub fn lv_create(
    vg: &str,
    name: &str,
    size: u64,
    pvs: &[&str],
    extra: &[ExtraArg],
) -> Result<()> {
    ops(|lvm| lvm.lv_create(vg, name, size, pvs, extra))
}

pub fn lv_remove(vg: &str, name: &str, force: bool, extra: &[ExtraArg]) -> Result<()> {
    ops(|lvm| lvm.lv_remove(vg, name, force, extra))
}

pub fn lv_resize(vg: &str, name: &str, size: u64, extra: &[ExtraArg]) -> Result<()> {
    ops(|lvm| lvm.lv_resize(vg, name, size, extra))
}

pub fn pvs() -> Result<Vec<LvmPvInfo>> {
    ops(|lvm| lvm.pvs())
}

pub fn vgs() -> Result<Vec<LvmVgInfo>> {
    ops(|lvm| lvm.vgs())
}

pub fn lvs(vg: Option<&str>) -> Result<Vec<LvmLvInfo>> {
    ops(|lvm| lvm.lvs(vg))
}

pub fn is_tech_available(tech: LvmTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Lvm, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
