// SPDX-License-Identifier: GPL-3.0-only

use crate::Result;

/// Technologies of the NVDIMM backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum NvdimmTech {
    Namespace = 0,
}

impl NvdimmTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(NvdimmTech::Namespace),
            _ => None,
        }
    }
}

/// NVDIMM namespace operations (ndctl).
pub trait NvdimmOps: Send + Sync {
    /// Names of all namespaces ndctl reports.
    fn list_namespaces(&self) -> Result<Vec<String>>;

    fn enable_namespace(&self, namespace: &str) -> Result<()>;

    fn disable_namespace(&self, namespace: &str) -> Result<()>;
}
