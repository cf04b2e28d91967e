// SPDX-License-Identifier: GPL-3.0-only

//! NVDIMM façade

use blockkit_contracts::traits::{NvdimmOps, NvdimmTech};
use blockkit_contracts::{Error, Result, TechModes};
use blockkit_types::BackendId;

pub use blockkit_contracts::traits::NvdimmTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn NvdimmOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Nvdimm, |backend| {
        let nvdimm = backend
            .as_nvdimm()
            .ok_or_else(|| Error::not_available(BackendId::Nvdimm))?;
        call(nvdimm)
    })
}

pub fn list_namespaces() -> Result<Vec<String>> {
    ops(|nvdimm| nvdimm.list_namespaces())
}

pub fn enable_namespace(namespace: &str) -> Result<()> {
    ops(|nvdimm| nvdimm.enable_namespace(namespace))
}

pub fn disable_namespace(namespace: &str) -> Result<()> {
    ops(|nvdimm| nvdimm.disable_namespace(namespace))
}

pub fn is_tech_available(tech: NvdimmTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Nvdimm, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
