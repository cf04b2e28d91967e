// SPDX-License-Identifier: GPL-3.0-only

//! blockkit — pluggable block-device management
//!
//! One stable façade over a set of per-technology backends: partition
//! tables, LUKS, MD RAID, btrfs, LVM, swap, loop devices, device-mapper,
//! multipath, NVMe, NVDIMM, S.M.A.R.T. and s390 DASD. Consumers call
//! [`init`] once and then use the per-domain namespaces; every entry is a
//! trampoline into whichever backend implementation is currently bound.
//!
//! ```no_run
//! use blockkit::{BackendId, TableType};
//!
//! blockkit::init(&[], None)?;
//! if blockkit::is_plugin_available(BackendId::Part) {
//!     blockkit::part::create_table("/dev/sdb", TableType::Gpt, false)?;
//! }
//! # Ok::<(), blockkit::Error>(())
//! ```
//!
//! Backends that fail to load (missing tools, forced missing images) stay
//! unavailable without affecting the rest; dispatch into them fails with
//! `NotAvailable`. All façade entries are safe to call from any thread
//! once `init` has returned; `init`/`reinit` serialize internally.

mod loader;
mod registry;

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
pub mod part;
pub mod s390;
pub mod smart;
pub mod swap;

use std::sync::LazyLock;

pub use blockkit_contracts::{
    Error, ErrorDomain, ErrorKind, ExtraArg, LogSink, Result, TechMode, TechModes,
};
pub use blockkit_types::{
    BackendId, BackendSpec, PartAlign, PartFlag, PartFlags, PartSpec, PartTypeFlag, PartTypeFlags,
    PartTypeReq, TableType, format_size, parse_size,
};

pub use loader::Loader;
pub use registry::{ImageFactory, register_image};

static GLOBAL: LazyLock<Loader> = LazyLock::new(Loader::new);

pub(crate) fn global() -> &'static Loader {
    &GLOBAL
}

/// Initialize the process-wide loader. See [`Loader::init`].
pub fn init(force: &[BackendSpec], sink: Option<LogSink>) -> Result<()> {
    global().init(force, sink)
}

/// Re-initialize the process-wide loader. See [`Loader::reinit`].
pub fn reinit(force: &[BackendSpec], reload_images: bool, sink: Option<LogSink>) -> Result<()> {
    global().reinit(force, reload_images, sink)
}

/// Whether the backend for `id` is loaded and initialized.
pub fn is_plugin_available(id: BackendId) -> bool {
    global().is_plugin_available(id)
}

/// Lowercase canonical names of the loaded backends, in identifier order.
pub fn available_plugin_names() -> Vec<&'static str> {
    global().available_plugin_names()
}

/// Image name actually bound for `id`, if its backend is loaded.
pub fn plugin_image_name(id: BackendId) -> Option<String> {
    global().plugin_image_name(id)
}

/// Canonical name of an identifier; infallible, the backend need not be
/// loaded.
pub fn plugin_canonical_name(id: BackendId) -> &'static str {
    id.canonical_name()
}
