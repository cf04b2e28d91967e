// SPDX-License-Identifier: GPL-3.0-only

//! Multipath façade

use blockkit_contracts::traits::{MpathOps, MpathTech};
use blockkit_contracts::{Error, Result, TechModes};
use blockkit_types::BackendId;

pub use blockkit_contracts::traits::MpathTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn MpathOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Mpath, |backend| {
        let mpath = backend
            .as_mpath()
            .ok_or_else(|| Error::not_available(BackendId::Mpath))?;
        call(mpath)
    })
}

/// Flush all unused multipath maps.
pub fn flush_mpaths() -> Result<()> {
    ops(|mpath| mpath.flush_mpaths())
}

pub fn is_mpath_member(device: &str) -> Result<bool> {
    ops(|mpath| mpath.is_mpath_member(device))
}

pub fn set_friendly_names(enabled: bool) -> Result<()> {
    ops(|mpath| mpath.set_friendly_names(enabled))
}

pub fn is_tech_available(tech: MpathTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Mpath, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
