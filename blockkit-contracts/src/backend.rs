// SPDX-License-Identifier: GPL-3.0-only

//! The capability contract every domain backend satisfies
//!
//! A backend is bound by the loader, probed for its external dependencies,
//! initialized, and then dispatched to through its operation accessors.
//! The accessors are the operation table: the loader resolves them once at
//! load time and the façade trampolines forward through them without any
//! name-keyed lookup per call.

use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};

use blockkit_types::BackendId;

use crate::Result;
use crate::traits::{
    BtrfsOps, CryptoOps, DmOps, FsOps, LoopOps, LvmOps, MdOps, MpathOps, NvdimmOps, NvmeOps,
    PartOps, S390Ops, SmartOps, SwapOps,
};

/// Operation classes a technology can be queried for.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechMode {
    Create = 1 << 0,
    Delete = 1 << 1,
    Modify = 1 << 2,
    Query = 1 << 3,
}

pub type TechModes = BitFlags<TechMode>;

/// One pass-through argument for the external tool a backend drives.
///
/// Extra arguments are appended in input order, after the backend's own
/// arguments and before positional device arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraArg {
    /// Option name as the tool expects it (e.g. "--sector-size")
    pub opt: String,

    /// Option value; empty for valueless switches
    pub val: String,
}

impl ExtraArg {
    pub fn new(opt: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            opt: opt.into(),
            val: val.into(),
        }
    }
}

/// Contract between the loader and a domain backend.
///
/// Lifecycle: `probe_dependencies` → `initialize` → operations →
/// `shutdown`. A backend whose probe or init fails stays unbound; the
/// loader never dispatches into it.
///
/// Backends need not be internally reentrant; the dispatcher imposes no
/// serialization of its own, and a backend that requires per-device
/// serialization documents it on the affected operations.
pub trait Backend: Send + Sync {
    fn id(&self) -> BackendId;

    /// Check external tools and their versions. Must not touch devices;
    /// version lookups go through the process-wide probe cache.
    fn probe_dependencies(&self) -> Result<()>;

    /// One-time initialization after a successful probe.
    fn initialize(&self) -> Result<()>;

    /// Release whatever `initialize` acquired. Infallible by contract.
    fn shutdown(&self);

    /// Whether the backend offers `tech` for all operation classes in
    /// `modes`. `tech` is a backend-specific discriminant (each domain
    /// trait module defines its technology enum). Must not perform device
    /// I/O beyond consulting cached tool state.
    fn is_tech_available(&self, tech: u32, modes: TechModes) -> Result<()>;

    // Operation table. A backend overrides exactly the accessor for its
    // own domain; the rest stay `None` so a mis-routed dispatch fails as
    // NotAvailable instead of reaching a foreign backend.

    fn as_part(&self) -> Option<&dyn PartOps> {
        None
    }
    fn as_crypto(&self) -> Option<&dyn CryptoOps> {
        None
    }
    fn as_md(&self) -> Option<&dyn MdOps> {
        None
    }
    fn as_btrfs(&self) -> Option<&dyn BtrfsOps> {
        None
    }
    fn as_lvm(&self) -> Option<&dyn LvmOps> {
        None
    }
    fn as_swap(&self) -> Option<&dyn SwapOps> {
        None
    }
    fn as_loop(&self) -> Option<&dyn LoopOps> {
        None
    }
    fn as_fs(&self) -> Option<&dyn FsOps> {
        None
    }
    fn as_dm(&self) -> Option<&dyn DmOps> {
        None
    }
    fn as_mpath(&self) -> Option<&dyn MpathOps> {
        None
    }
    fn as_nvme(&self) -> Option<&dyn NvmeOps> {
        None
    }
    fn as_nvdimm(&self) -> Option<&dyn NvdimmOps> {
        None
    }
    fn as_smart(&self) -> Option<&dyn SmartOps> {
        None
    }
    fn as_s390(&self) -> Option<&dyn S390Ops> {
        None
    }
}
