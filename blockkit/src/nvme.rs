// SPDX-License-Identifier: GPL-3.0-only

//! NVMe façade

use blockkit_contracts::traits::{NvmeOps, NvmeTech};
use blockkit_contracts::{Error, Result, TechModes};
use blockkit_types::BackendId;

pub use blockkit_contracts::traits::NvmeTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn NvmeOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Nvme, |backend| {
        let nvme = backend
            .as_nvme()
            .ok_or_else(|| Error::not_available(BackendId::Nvme))?;
        call(nvme)
    })
}

/// Namespace block devices of a controller ("nvme0" → ["nvme0n1"]).
pub fn get_namespaces(controller: &str) -> Result<Vec<String>> {
    ops(|nvme| nvme.get_namespaces(controller))
}

pub fn format(device: &str) -> Result<()> {
    ops(|nvme| nvme.format(device))
}

pub fn sanitize(device: &str) -> Result<()> {
    ops(|nvme| nvme.sanitize(device))
}

pub fn self_test(device: &str, extended: bool) -> Result<()> {
    ops(|nvme| nvme.self_test(device, extended))
}

pub fn is_tech_available(tech: NvmeTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Nvme, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
