// SPDX-License-Identifier: GPL-3.0-only

//! Domain backends for blockkit
//!
//! One module per storage technology, each wrapping its external tool
//! behind the [`blockkit_contracts::Backend`] contract: probe the tools
//! during `probe_dependencies`, build argument vectors, run through the
//! shared subprocess runner, parse output with plain string code. The
//! partition backend lives in its own crate (`blockkit-part`); everything
//! else is here.
//!
//! Backends are bound by name through the loader's image registry, never
//! referenced directly by consumers.

pub mod btrfs;
pub mod crypto;
pub mod dm;
pub mod fs;
pub mod loopdev;
pub mod lvm;
pub mod md;
pub mod mpath;
pub mod nvdimm;
pub mod nvme;
pub mod s390;
pub mod smart;
pub mod swap;

pub use btrfs::BtrfsBackend;
pub use crypto::CryptoBackend;
pub use dm::DmBackend;
pub use fs::FsBackend;
pub use loopdev::LoopBackend;
pub use lvm::LvmBackend;
pub use md::MdBackend;
pub use mpath::MpathBackend;
pub use nvdimm::NvdimmBackend;
pub use nvme::NvmeBackend;
pub use s390::S390Backend;
pub use smart::SmartBackend;
pub use swap::SwapBackend;
