// SPDX-License-Identifier: GPL-3.0-only

//! Filesystem backend (mkfs.*, wipefs, blkid and per-fs tools)

use blockkit_contracts::traits::{FsOps, FsTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, ExtraArg, Result, TechMode, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::{run_tool, run_tool_with_extra};
use blockkit_types::BackendId;

const DOMAIN: ErrorDomain = ErrorDomain::Fs;

pub struct FsBackend;

impl FsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FsBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// mkfs command line for a filesystem type; force switches keep repeated
/// formats from prompting.
fn mkfs_base(fstype: &str) -> Result<Vec<&'static str>> {
    match fstype {
        "ext4" => Ok(vec!["mkfs.ext4", "-F"]),
        "xfs" => Ok(vec!["mkfs.xfs", "-f"]),
        "vfat" => Ok(vec!["mkfs.vfat", "-I"]),
        _ => Err(Error::new(
            DOMAIN,
            ErrorKind::TechUnavail,
            format!("Filesystem '{fstype}' is not supported"),
        )),
    }
}

impl Backend for FsBackend {
    fn id(&self) -> BackendId {
        BackendId::Fs
    }

    fn probe_dependencies(&self) -> Result<()> {
        for tool in ["wipefs", "blkid"] {
            check_tool(DOMAIN, ToolSpec::new(tool))?;
        }
        // per-fs tools are probed by the capability query; one supported
        // mkfs is enough to initialize
        let any_mkfs = ["mkfs.ext4", "mkfs.xfs", "mkfs.vfat"]
            .iter()
            .any(|tool| check_tool(DOMAIN, ToolSpec::new(tool)).is_ok());
        if !any_mkfs {
            return Err(Error::new(
                DOMAIN,
                ErrorKind::TechUnavail,
                "No supported mkfs utility is available",
            ));
        }
        Ok(())
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, modes: TechModes) -> Result<()> {
        let tech = FsTech::from_raw(tech).ok_or_else(|| {
            Error::new(DOMAIN, ErrorKind::Inval, format!("Invalid fs technology: {tech}"))
        })?;

        if modes.contains(TechMode::Create) {
            let mkfs = mkfs_base(tech.as_str())?;
            check_tool(DOMAIN, ToolSpec::new(mkfs[0]))?;
        }
        if modes.contains(TechMode::Modify) {
            match tech {
                FsTech::Ext4 => check_tool(DOMAIN, ToolSpec::new("resize2fs"))?,
                _ => {
                    return Err(Error::new(
                        DOMAIN,
                        ErrorKind::TechUnavail,
                        format!("Resize is not supported for '{}'", tech.as_str()),
                    ));
                }
            }
        }
        if modes.contains(TechMode::Query) {
            let checker = match tech {
                FsTech::Ext4 => "e2fsck",
                FsTech::Xfs => "xfs_repair",
                FsTech::Vfat => "fsck.vfat",
            };
            check_tool(DOMAIN, ToolSpec::new(checker))?;
        }
        Ok(())
    }

    fn as_fs(&self) -> Option<&dyn FsOps> {
        Some(self)
    }
}

impl FsOps for FsBackend {
    fn mkfs(&self, device: &str, fstype: &str, extra: &[ExtraArg]) -> Result<()> {
        let base = mkfs_base(fstype)?;
        run_tool_with_extra(DOMAIN, &base, extra, &[device])
            .map(|_| ())
            .map_err(|err| Error::new(DOMAIN, ErrorKind::FormatFailed, err.message))
    }

    fn wipe(&self, device: &str, all: bool) -> Result<()> {
        let mut argv: Vec<&str> = vec!["wipefs"];
        if all {
            argv.push("--all");
        }
        argv.push(device);

        run_tool(DOMAIN, &argv).map(|_| ())
    }

    fn resize(&self, device: &str, new_size: u64, fstype: Option<&str>) -> Result<()> {
        let fstype = match fstype {
            Some(fstype) => fstype.to_string(),
            None => self.get_fstype(device)?.ok_or_else(|| {
                Error::new(
                    DOMAIN,
                    ErrorKind::NoMatch,
                    format!("No filesystem recognized on '{device}'"),
                )
            })?,
        };

        match fstype.as_str() {
            "ext4" => {
                // resize2fs takes the new size in kibibytes; no size
                // grows to fill the device
                let size_arg = format!("{}K", new_size / 1024);
                let mut argv: Vec<&str> = vec!["resize2fs", device];
                if new_size > 0 {
                    argv.push(&size_arg);
                }
                run_tool(DOMAIN, &argv)
                    .map(|_| ())
                    .map_err(|err| Error::new(DOMAIN, ErrorKind::ResizeFailed, err.message))
            }
            other => Err(Error::new(
                DOMAIN,
                ErrorKind::TechUnavail,
                format!("Resize is not supported for '{other}'"),
            )),
        }
    }

    fn check(&self, device: &str, fstype: Option<&str>) -> Result<()> {
        let fstype = match fstype {
            Some(fstype) => fstype.to_string(),
            None => self.get_fstype(device)?.ok_or_else(|| {
                Error::new(
                    DOMAIN,
                    ErrorKind::NoMatch,
                    format!("No filesystem recognized on '{device}'"),
                )
            })?,
        };

        let argv: Vec<&str> = match fstype.as_str() {
            "ext4" => vec!["e2fsck", "-f", "-n", device],
            "xfs" => vec!["xfs_repair", "-n", device],
            "vfat" => vec!["fsck.vfat", "-n", device],
            other => {
                return Err(Error::new(
                    DOMAIN,
                    ErrorKind::TechUnavail,
                    format!("Check is not supported for '{other}'"),
                ));
            }
        };

        run_tool(DOMAIN, &argv).map(|_| ())
    }

    fn get_fstype(&self, device: &str) -> Result<Option<String>> {
        // blkid exits non-zero when nothing is recognized
        match run_tool(
            DOMAIN,
            &["blkid", "-p", "-s", "TYPE", "-o", "value", device],
        ) {
            Ok(output) => {
                let fstype = output.trim().to_string();
                Ok((!fstype.is_empty()).then_some(fstype))
            }
            Err(_) => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mkfs_bases_carry_force_switches() {
        assert_eq!(mkfs_base("ext4").unwrap(), vec!["mkfs.ext4", "-F"]);
        assert_eq!(mkfs_base("xfs").unwrap(), vec!["mkfs.xfs", "-f"]);
        assert_eq!(mkfs_base("vfat").unwrap(), vec!["mkfs.vfat", "-I"]);
    }

    #[test]
    fn unsupported_filesystems_are_tech_unavail() {
        let err = mkfs_base("zfs").expect_err("unsupported");
        assert_eq!(err.kind, ErrorKind::TechUnavail);
    }
}
