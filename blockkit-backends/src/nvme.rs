// SPDX-License-Identifier: GPL-3.0-only

//! NVMe backend (nvme-cli, sysfs)

use std::fs;
use std::path::Path;

use blockkit_contracts::traits::{NvmeOps, NvmeTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::run_tool;
use blockkit_types::BackendId;

const DOMAIN: ErrorDomain = ErrorDomain::Nvme;

const SYSFS_NVME: &str = "/sys/class/nvme";

pub struct NvmeBackend;

impl NvmeBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NvmeBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Namespace block devices of a controller, from its sysfs directory
/// ("nvme0" → ["nvme0n1", "nvme0n2"]).
fn namespaces_in(sysfs_root: &Path, controller: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(sysfs_root.join(controller)) else {
        return Vec::new();
    };

    let prefix = format!("{controller}n");
    let mut namespaces: Vec<String> = entries
        .flatten()
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| {
            name.strip_prefix(&prefix)
                .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        })
        .collect();
    namespaces.sort();
    namespaces
}

impl Backend for NvmeBackend {
    fn id(&self) -> BackendId {
        BackendId::Nvme
    }

    fn probe_dependencies(&self) -> Result<()> {
        check_tool(DOMAIN, ToolSpec::new("nvme"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        NvmeTech::from_raw(tech).map(|_| ()).ok_or_else(|| {
            Error::new(DOMAIN, ErrorKind::Inval, format!("Invalid NVMe technology: {tech}"))
        })
    }

    fn as_nvme(&self) -> Option<&dyn NvmeOps> {
        Some(self)
    }
}

impl NvmeOps for NvmeBackend {
    fn get_namespaces(&self, controller: &str) -> Result<Vec<String>> {
        let controller = controller.rsplit('/').next().unwrap_or(controller);
        Ok(namespaces_in(Path::new(SYSFS_NVME), controller))
    }

    fn format(&self, device: &str) -> Result<()> {
        run_tool(DOMAIN, &["nvme", "format", "--force", device])
            .map(|_| ())
            .map_err(|err| Error::new(DOMAIN, ErrorKind::FormatFailed, err.message))
    }

    fn sanitize(&self, device: &str) -> Result<()> {
        // block-erase sanitize action
        run_tool(DOMAIN, &["nvme", "sanitize", "--sanact=2", device]).map(|_| ())
    }

    fn self_test(&self, device: &str, extended: bool) -> Result<()> {
        let code = if extended { "2" } else { "1" };
        run_tool(DOMAIN, &["nvme", "device-self-test", "--self-test-code", code, device])
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn lists_namespaces_of_a_controller() {
        let root = tempfile::tempdir().expect("tempdir");
        for dir in ["nvme0/nvme0n1", "nvme0/nvme0n2", "nvme0/firmware", "nvme1/nvme1n1"] {
            fs::create_dir_all(root.path().join(dir)).expect("sysfs dirs");
        }

        assert_eq!(
            namespaces_in(root.path(), "nvme0"),
            vec!["nvme0n1".to_string(), "nvme0n2".to_string()]
        );
        assert_eq!(namespaces_in(root.path(), "nvme1"), vec!["nvme1n1".to_string()]);
        assert!(namespaces_in(root.path(), "nvme9").is_empty());
    }
}
