// SPDX-License-Identifier: GPL-3.0-only

//! Per-domain operation tables
//!
//! One trait per backend, defining exactly the façade entries that backend
//! services. The loader resolves a backend's trait object once at load
//! time; the façade trampolines in `blockkit` forward through it.

mod btrfs;
mod crypto;
mod dm;
mod fs;
mod loopdev;
mod lvm;
mod md;
mod mpath;
mod nvdimm;
mod nvme;
mod part;
mod s390;
mod smart;
mod swap;

pub use btrfs::{BtrfsOps, BtrfsTech};
pub use crypto::{CryptoOps, CryptoTech};
pub use dm::{DmOps, DmTech};
pub use fs::{FsOps, FsTech};
pub use loopdev::{LoopOps, LoopTech};
pub use lvm::{LvmOps, LvmTech};
pub use md::{MdOps, MdTech};
pub use mpath::{MpathOps, MpathTech};
pub use nvdimm::{NvdimmOps, NvdimmTech};
pub use nvme::{NvmeOps, NvmeTech};
pub use part::{PartOps, PartTech};
pub use s390::{S390Ops, S390Tech};
pub use smart::{SmartOps, SmartTech};
pub use swap::{SwapOps, SwapTech};
