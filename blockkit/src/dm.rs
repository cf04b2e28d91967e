// SPDX-License-Identifier: GPL-3.0-only

//! Device-mapper façade

use blockkit_contracts::traits::{DmOps, DmTech};
use blockkit_contracts::{Error, Result, TechModes};
use blockkit_types::BackendId;

pub use blockkit_contracts::traits::DmTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn DmOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Dm, |backend| {
        let dm = backend
            .as_dm()
            .ok_or_else(|| Error::not_available(BackendId::Dm))?;
        call(dm)
    })
}

/// Create a linear map of `length` sectors over `device`.
pub fn create_linear(map_name: &str, device: &str, length: u64, uuid: Option<&str>) -> Result<()> {
    ops(|dm| dm.create_linear(map_name, device, length, uuid))
}

pub fn remove(map_name: &str) -> Result<()> {
    ops(|dm| dm.remove(map_name))
}

pub fn map_exists(map_name: &str) -> Result<bool> {
    ops(|dm| dm.map_exists(map_name))
}

pub fn name_from_node(node: &str) -> Result<String> {
    ops(|dm| dm.name_from_node(node))
}

pub fn node_from_name(name: &str) -> Result<String> {
    ops(|dm| dm.node_from_name(name))
}

pub fn is_tech_available(tech: DmTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Dm, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
