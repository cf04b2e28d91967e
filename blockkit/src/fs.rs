// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem façade

use blockkit_contracts::traits::{FsOps, FsTech};
use blockkit_contracts::{Error, ExtraArg, Result, TechModes};
use blockkit_types::BackendId;

pub use blockkit_contracts::traits::FsTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn FsOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Fs, |backend| {
        let fs = backend
            .as_fs()
            .ok_or_else(|| Error::not_available(BackendId::Fs))?;
        call(fs)
    })
}

pub fn mkfs(device: &str, fstype: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|fs| fs.mkfs(device, fstype, extra))
}

/// Wipe filesystem signatures; `all = false` erases only the first one.
pub fn wipe(device: &str, all: bool) -> Result<()> {
    ops(|fs| fs.wipe(device, all))
}

/// Resize a filesystem; `new_size = 0` grows to fill the device.
pub fn resize(device: &str, new_size: u64, fstype: Option<&str>) -> Result<()> {
    ops(|fs| fs.resize(device, new_size, fstype))
}

pub fn check(device: &str, fstype: Option<&str>) -> Result<()> {
    ops(|fs| fs.check(device, fstype))
}

pub fn get_fstype(device: &str) -> Result<Option<String>> {
    ops(|fs| fs.get_fstype(device))
}

pub fn is_tech_available(tech: FsTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Fs, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
