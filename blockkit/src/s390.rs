// SPDX-License-Identifier: GPL-3.0-only

//! s390 DASD façade

use blockkit_contracts::traits::{S390Ops, S390Tech};
use blockkit_contracts::{Error, ExtraArg, Result, TechModes};
use blockkit_types::BackendId;

pub use blockkit_contracts::traits::S390Tech as Tech;

fn ops<T>(call: impl FnOnce(&dyn S390Ops) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::S390, |backend| {
        let s390 = backend
            .as_s390()
            .ok_or_else(|| Error::not_available(BackendId::S390))?;
        call(s390)
    })
}

pub fn dasd_format(device: &str, extra: &[ExtraArg]) -> Result<()> {
    ops(|s390| s390.dasd_format(device, extra))
}

pub fn set_dasd_online(device: &str, online: bool) -> Result<()> {
    ops(|s390| s390.set_dasd_online(device, online))
}

/// ccw device id ("0.0.0200") for a DASD block device.
pub fn device_id(device: &str) -> Result<String> {
    ops(|s390| s390.device_id(device))
}

pub fn is_tech_available(tech: S390Tech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::S390, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
