// SPDX-License-Identifier: GPL-3.0-only

//! s390 DASD backend (dasdfmt, chccwdev, sysfs)

use std::fs;
use std::path::Path;

use blockkit_contracts::traits::{S390Ops, S390Tech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, ExtraArg, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::{run_tool, run_tool_with_extra};
use blockkit_types::BackendId;

const DOMAIN: ErrorDomain = ErrorDomain::S390;

const SYSFS_BLOCK: &str = "/sys/class/block";

pub struct S390Backend;

impl S390Backend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for S390Backend {
    fn default() -> Self {
        Self::new()
    }
}

/// ccw bus id of a DASD block device: the last component of its sysfs
/// `device` link ("0.0.0200").
fn device_id_in(sysfs_root: &Path, name: &str) -> Option<String> {
    let target = fs::read_link(sysfs_root.join(name).join("device")).ok()?;
    target
        .file_name()
        .map(|id| id.to_string_lossy().to_string())
}

impl Backend for S390Backend {
    fn id(&self) -> BackendId {
        BackendId::S390
    }

    fn probe_dependencies(&self) -> Result<()> {
        if !cfg!(target_arch = "s390x") {
            return Err(Error::new(
                DOMAIN,
                ErrorKind::TechUnavail,
                "DASD support requires an s390x system",
            ));
        }
        check_tool(DOMAIN, ToolSpec::new("dasdfmt"))?;
        check_tool(DOMAIN, ToolSpec::new("chccwdev"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        S390Tech::from_raw(tech).map(|_| ()).ok_or_else(|| {
            Error::new(DOMAIN, ErrorKind::Inval, format!("Invalid s390 technology: {tech}"))
        })
    }

    fn as_s390(&self) -> Option<&dyn S390Ops> {
        Some(self)
    }
}

impl S390Ops for S390Backend {
    fn dasd_format(&self, device: &str, extra: &[ExtraArg]) -> Result<()> {
        run_tool_with_extra(
            DOMAIN,
            &["dasdfmt", "-y", "-d", "cdl", "-b", "4096"],
            extra,
            &[device],
        )
        .map(|_| ())
        .map_err(|err| Error::new(DOMAIN, ErrorKind::FormatFailed, err.message))
    }

    fn set_dasd_online(&self, device: &str, online: bool) -> Result<()> {
        let switch = if online { "-e" } else { "-d" };
        run_tool(DOMAIN, &["chccwdev", switch, device]).map(|_| ())
    }

    fn device_id(&self, device: &str) -> Result<String> {
        let name = device.rsplit('/').next().unwrap_or(device);
        device_id_in(Path::new(SYSFS_BLOCK), name).ok_or_else(|| {
            Error::new(
                DOMAIN,
                ErrorKind::NoMatch,
                format!("No ccw device id found for '{device}'"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn reads_ccw_ids_from_sysfs_links() {
        let root = tempfile::tempdir().expect("tempdir");
        let bus_dir = root.path().join("bus/ccw/devices/0.0.0200");
        fs::create_dir_all(&bus_dir).expect("bus dir");
        fs::create_dir_all(root.path().join("dasda")).expect("block dir");

        #[cfg(unix)]
        std::os::unix::fs::symlink(&bus_dir, root.path().join("dasda/device"))
            .expect("device link");

        assert_eq!(device_id_in(root.path(), "dasda").as_deref(), Some("0.0.0200"));
        assert_eq!(device_id_in(root.path(), "dasdb"), None);
    }
}
