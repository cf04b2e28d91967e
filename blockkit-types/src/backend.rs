// SPDX-License-Identifier: GPL-3.0-only

//! Backend identifiers and load-time specs

use serde::{Deserialize, Serialize};

/// Identifier of a storage technology backend.
///
/// The set is closed: every façade namespace maps onto exactly one
/// identifier, and the loader keeps exactly one plugin record per
/// identifier. `Undefined` is the "not found" sentinel and never owns a
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendId {
    Lvm,
    Btrfs,
    Swap,
    Loop,
    Crypto,
    Mpath,
    Dm,
    MdRaid,
    S390,
    Part,
    Fs,
    Nvdimm,
    Nvme,
    Smart,
    Undefined,
}

impl BackendId {
    /// Every real identifier, in canonical order. Loader iteration and
    /// `available_plugin_names()` follow this order.
    pub const ALL: [BackendId; 14] = [
        BackendId::Lvm,
        BackendId::Btrfs,
        BackendId::Swap,
        BackendId::Loop,
        BackendId::Crypto,
        BackendId::Mpath,
        BackendId::Dm,
        BackendId::MdRaid,
        BackendId::S390,
        BackendId::Part,
        BackendId::Fs,
        BackendId::Nvdimm,
        BackendId::Nvme,
        BackendId::Smart,
    ];

    /// Lowercase canonical name. Infallible and independent of whether the
    /// backend is loaded.
    pub fn canonical_name(self) -> &'static str {
        match self {
            BackendId::Lvm => "lvm",
            BackendId::Btrfs => "btrfs",
            BackendId::Swap => "swap",
            BackendId::Loop => "loop",
            BackendId::Crypto => "crypto",
            BackendId::Mpath => "mpath",
            BackendId::Dm => "dm",
            BackendId::MdRaid => "mdraid",
            BackendId::S390 => "s390",
            BackendId::Part => "part",
            BackendId::Fs => "fs",
            BackendId::Nvdimm => "nvdimm",
            BackendId::Nvme => "nvme",
            BackendId::Smart => "smart",
            BackendId::Undefined => "undefined",
        }
    }

    /// Name of the image the loader binds when no override is forced.
    pub fn default_image(self) -> &'static str {
        match self {
            BackendId::Lvm => "blockkit_lvm",
            BackendId::Btrfs => "blockkit_btrfs",
            BackendId::Swap => "blockkit_swap",
            BackendId::Loop => "blockkit_loop",
            BackendId::Crypto => "blockkit_crypto",
            BackendId::Mpath => "blockkit_mpath",
            BackendId::Dm => "blockkit_dm",
            BackendId::MdRaid => "blockkit_mdraid",
            BackendId::S390 => "blockkit_s390",
            BackendId::Part => "blockkit_part",
            BackendId::Fs => "blockkit_fs",
            BackendId::Nvdimm => "blockkit_nvdimm",
            BackendId::Nvme => "blockkit_nvme",
            BackendId::Smart => "blockkit_smart",
            BackendId::Undefined => "",
        }
    }

    /// Look an identifier up by its canonical name.
    pub fn from_name(name: &str) -> BackendId {
        BackendId::ALL
            .into_iter()
            .find(|id| id.canonical_name() == name)
            .unwrap_or(BackendId::Undefined)
    }
}

impl std::fmt::Display for BackendId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// A backend to load, optionally forcing a specific implementation image.
///
/// With `image = None` the loader binds the identifier's default image.
/// The override string is owned by the spec; `Clone` is a pure value copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSpec {
    pub id: BackendId,
    pub image: Option<String>,
}

impl BackendSpec {
    pub fn new(id: BackendId) -> Self {
        Self { id, image: None }
    }

    pub fn with_image(id: BackendId, image: impl Into<String>) -> Self {
        Self {
            id,
            image: Some(image.into()),
        }
    }

    /// Image name this spec asks for: the override if present, otherwise
    /// the identifier's default.
    pub fn image_name(&self) -> &str {
        self.image.as_deref().unwrap_or(self.id.default_image())
    }
}
