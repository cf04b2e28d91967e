// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for blockkit
//!
//! This crate defines the value types shared across the stack:
//!
//! - **blockkit**: the loader keys its plugin table on [`BackendId`] and
//!   accepts [`BackendSpec`] overrides during init/reinit
//! - **blockkit-part**: partition specs, table types and flag bitsets
//! - **blockkit-backends**: size parsing when reading tool output
//!
//! Everything here is a plain value; no type in this crate performs I/O.

pub mod backend;
pub mod btrfs;
pub mod lvm;
pub mod md;
pub mod partition;
pub mod size;
pub mod smart;

pub use backend::{BackendId, BackendSpec};
pub use btrfs::{BtrfsFilesystemInfo, BtrfsSubvolume};
pub use lvm::{LvmLvInfo, LvmPvInfo, LvmVgInfo};
pub use md::{MdDetail, MdMember};
pub use partition::{
    PartAlign, PartFlag, PartFlags, PartSpec, PartTypeFlag, PartTypeFlags, PartTypeReq, TableType,
};
pub use size::{SizeParseError, format_size, parse_size};
pub use smart::{SmartAttribute, SmartInfo};
