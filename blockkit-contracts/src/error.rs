// SPDX-License-Identifier: GPL-3.0-only

//! Uniform error envelope
//!
//! Every failure crossing the façade carries the domain it originated in
//! (which backend, or the loader/utility layers), a kind from a closed
//! taxonomy, and a human-readable message safe to surface. Success never
//! carries an error; Rust's `Result` makes that structural.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use blockkit_types::BackendId;

/// Where an error originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorDomain {
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
    Utils,
    Plugin,
}

impl From<BackendId> for ErrorDomain {
    fn from(id: BackendId) -> Self {
        match id {
            BackendId::Lvm => ErrorDomain::Lvm,
            BackendId::Btrfs => ErrorDomain::Btrfs,
            BackendId::Swap => ErrorDomain::Swap,
            BackendId::Loop => ErrorDomain::Loop,
            BackendId::Crypto => ErrorDomain::Crypto,
            BackendId::Mpath => ErrorDomain::Mpath,
            BackendId::Dm => ErrorDomain::Dm,
            BackendId::MdRaid => ErrorDomain::MdRaid,
            BackendId::S390 => ErrorDomain::S390,
            BackendId::Part => ErrorDomain::Part,
            BackendId::Fs => ErrorDomain::Fs,
            BackendId::Nvdimm => ErrorDomain::Nvdimm,
            BackendId::Nvme => ErrorDomain::Nvme,
            BackendId::Smart => ErrorDomain::Smart,
            BackendId::Undefined => ErrorDomain::Plugin,
        }
    }
}

impl std::fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorDomain::Lvm => "lvm",
            ErrorDomain::Btrfs => "btrfs",
            ErrorDomain::Swap => "swap",
            ErrorDomain::Loop => "loop",
            ErrorDomain::Crypto => "crypto",
            ErrorDomain::Mpath => "mpath",
            ErrorDomain::Dm => "dm",
            ErrorDomain::MdRaid => "mdraid",
            ErrorDomain::S390 => "s390",
            ErrorDomain::Part => "part",
            ErrorDomain::Fs => "fs",
            ErrorDomain::Nvdimm => "nvdimm",
            ErrorDomain::Nvme => "nvme",
            ErrorDomain::Smart => "smart",
            ErrorDomain::Utils => "utils",
            ErrorDomain::Plugin => "plugin",
        };
        f.write_str(name)
    }
}

/// Closed failure taxonomy.
///
/// Precondition kinds fail before any side effect; execution kinds report
/// a failed operation; `PluginInitFailed` is produced only by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    // preconditions
    NotAvailable,
    Inval,
    NoKey,
    Exists,
    // execution
    Fail,
    Device,
    FormatFailed,
    ResizeFailed,
    AddKey,
    RemoveKey,
    KeySlot,
    EscrowFailed,
    CertDecode,
    NssInitFailed,
    State,
    InvalidSpec,
    Parse,
    BadFormat,
    NoMatch,
    TechUnavail,
    // loader
    PluginInitFailed,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{domain} ({kind}): {message}")]
pub struct Error {
    pub domain: ErrorDomain,
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(domain: ErrorDomain, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            domain,
            kind,
            message: message.into(),
        }
    }

    /// Standard failure for a façade call into a backend that is not
    /// loaded and initialized.
    pub fn not_available(id: BackendId) -> Self {
        Self::new(
            ErrorDomain::Plugin,
            ErrorKind::NotAvailable,
            format!("The '{}' plugin is not loaded", id.canonical_name()),
        )
    }

}

impl From<blockkit_types::SizeParseError> for Error {
    fn from(err: blockkit_types::SizeParseError) -> Self {
        Self::new(ErrorDomain::Utils, ErrorKind::Inval, err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_roundtrips_through_json() {
        let error = Error::new(ErrorDomain::Crypto, ErrorKind::FormatFailed, "no space");
        let json = serde_json::to_string(&error).expect("serialize error");
        let parsed: Error = serde_json::from_str(&json).expect("deserialize error");
        assert_eq!(parsed, error);
    }

    #[test]
    fn display_names_domain_and_kind() {
        let error = Error::not_available(BackendId::Crypto);
        let rendered = error.to_string();
        assert!(rendered.contains("plugin"));
        assert!(rendered.contains("NotAvailable"));
        assert!(rendered.contains("crypto"));
    }
}
