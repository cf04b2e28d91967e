// SPDX-License-Identifier: GPL-3.0-only

//! Device-mapper backend (dmsetup, sysfs)

use std::fs;
use std::path::Path;

use blockkit_contracts::traits::{DmOps, DmTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::run_tool;
use blockkit_types::BackendId;

const DOMAIN: ErrorDomain = ErrorDomain::Dm;

const SYSFS_BLOCK: &str = "/sys/class/block";

pub struct DmBackend;

impl DmBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DmBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn kernel_name(device: &str) -> &str {
    device.rsplit('/').next().unwrap_or(device)
}

/// Map name of a dm node from sysfs ("dm-0" → name).
fn map_name_in(sysfs_root: &Path, node: &str) -> Option<String> {
    fs::read_to_string(sysfs_root.join(node).join("dm/name"))
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|name| !name.is_empty())
}

/// dm node for a map name, scanning sysfs (name → "dm-0").
fn node_of_map_in(sysfs_root: &Path, map_name: &str) -> Option<String> {
    let entries = fs::read_dir(sysfs_root).ok()?;
    for entry in entries.flatten() {
        let node = entry.file_name().to_string_lossy().to_string();
        if !node.starts_with("dm-") {
            continue;
        }
        if map_name_in(sysfs_root, &node).as_deref() == Some(map_name) {
            return Some(node);
        }
    }
    None
}

impl Backend for DmBackend {
    fn id(&self) -> BackendId {
        BackendId::Dm
    }

    fn probe_dependencies(&self) -> Result<()> {
        check_tool(DOMAIN, ToolSpec::new("dmsetup"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        DmTech::from_raw(tech).map(|_| ()).ok_or_else(|| {
            Error::new(DOMAIN, ErrorKind::Inval, format!("Invalid dm technology: {tech}"))
        })
    }

    fn as_dm(&self) -> Option<&dyn DmOps> {
        Some(self)
    }
}

impl DmOps for DmBackend {
    fn create_linear(
        &self,
        map_name: &str,
        device: &str,
        length: u64,
        uuid: Option<&str>,
    ) -> Result<()> {
        let table = format!("0 {length} linear {device} 0");
        let mut argv: Vec<&str> = vec!["dmsetup", "create", map_name];
        if let Some(uuid) = uuid {
            argv.push("--uuid");
            argv.push(uuid);
        }
        argv.push("--table");
        argv.push(&table);

        run_tool(DOMAIN, &argv).map(|_| ())
    }

    fn remove(&self, map_name: &str) -> Result<()> {
        run_tool(DOMAIN, &["dmsetup", "remove", map_name]).map(|_| ())
    }

    fn map_exists(&self, map_name: &str) -> Result<bool> {
        // `dmsetup info` answers through its exit status
        Ok(run_tool(DOMAIN, &["dmsetup", "info", map_name]).is_ok())
    }

    fn name_from_node(&self, node: &str) -> Result<String> {
        map_name_in(Path::new(SYSFS_BLOCK), kernel_name(node)).ok_or_else(|| {
            Error::new(
                DOMAIN,
                ErrorKind::NoMatch,
                format!("No map name found for the node '{node}'"),
            )
        })
    }

    fn node_from_name(&self, name: &str) -> Result<String> {
        node_of_map_in(Path::new(SYSFS_BLOCK), name).ok_or_else(|| {
            Error::new(
                DOMAIN,
                ErrorKind::NoMatch,
                format!("No node found for the map '{name}'"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fake_sysfs(maps: &[(&str, &str)]) -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("tempdir");
        for (node, name) in maps {
            let dm_dir = root.path().join(node).join("dm");
            fs::create_dir_all(&dm_dir).expect("dm dir");
            fs::write(dm_dir.join("name"), format!("{name}\n")).expect("name file");
        }
        root
    }

    #[test]
    fn resolves_names_and_nodes() {
        let root = fake_sysfs(&[("dm-0", "cr_root"), ("dm-1", "vg0-home")]);

        assert_eq!(map_name_in(root.path(), "dm-0").as_deref(), Some("cr_root"));
        assert_eq!(
            node_of_map_in(root.path(), "vg0-home").as_deref(),
            Some("dm-1")
        );
        assert_eq!(map_name_in(root.path(), "dm-9"), None);
        assert_eq!(node_of_map_in(root.path(), "missing"), None);
    }
}
