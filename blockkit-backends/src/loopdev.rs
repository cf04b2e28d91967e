// SPDX-License-Identifier: GPL-3.0-only

//! Loop device backend (losetup, sysfs)

use std::fs;
use std::path::{Path, PathBuf};

use blockkit_contracts::traits::{LoopOps, LoopTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::run_tool;
use blockkit_types::BackendId;

const DOMAIN: ErrorDomain = ErrorDomain::Loop;

const SYSFS_BLOCK: &str = "/sys/class/block";

pub struct LoopBackend;

impl LoopBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LoopBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn kernel_name(device: &str) -> &str {
    device.rsplit('/').next().unwrap_or(device)
}

/// Backing file of one loop device from sysfs, `None` when unbound.
fn backing_file_in(sysfs_root: &Path, name: &str) -> Option<String> {
    let path = sysfs_root.join(name).join("loop/backing_file");
    fs::read_to_string(path)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|backing| !backing.is_empty())
}

/// Loop device currently backed by `file`, scanning sysfs.
fn loop_name_in(sysfs_root: &Path, file: &str) -> Option<String> {
    let entries = fs::read_dir(sysfs_root).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().to_string();
        if !name.starts_with("loop") {
            continue;
        }
        if backing_file_in(sysfs_root, &name).as_deref() == Some(file) {
            return Some(name);
        }
    }
    None
}

impl Backend for LoopBackend {
    fn id(&self) -> BackendId {
        BackendId::Loop
    }

    fn probe_dependencies(&self) -> Result<()> {
        check_tool(DOMAIN, ToolSpec::new("losetup"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        LoopTech::from_raw(tech).map(|_| ()).ok_or_else(|| {
            Error::new(DOMAIN, ErrorKind::Inval, format!("Invalid loop technology: {tech}"))
        })
    }

    fn as_loop(&self) -> Option<&dyn LoopOps> {
        Some(self)
    }
}

impl LoopOps for LoopBackend {
    fn setup(
        &self,
        file: &str,
        offset: u64,
        size: u64,
        read_only: bool,
        part_scan: bool,
    ) -> Result<String> {
        let offset_arg = offset.to_string();
        let size_arg = size.to_string();
        let mut argv: Vec<&str> = vec!["losetup", "--find", "--show"];
        if offset > 0 {
            argv.push("--offset");
            argv.push(&offset_arg);
        }
        if size > 0 {
            argv.push("--sizelimit");
            argv.push(&size_arg);
        }
        if read_only {
            argv.push("--read-only");
        }
        if part_scan {
            argv.push("--partscan");
        }
        argv.push(file);

        let output = run_tool(DOMAIN, &argv)?;
        let node = output.trim();
        if node.is_empty() {
            return Err(Error::new(
                DOMAIN,
                ErrorKind::Device,
                "losetup reported no loop device",
            ));
        }
        Ok(kernel_name(node).to_string())
    }

    fn teardown(&self, device: &str) -> Result<()> {
        let node = format!("/dev/{}", kernel_name(device));
        run_tool(DOMAIN, &["losetup", "--detach", &node]).map(|_| ())
    }

    fn get_backing_file(&self, device: &str) -> Result<Option<String>> {
        Ok(backing_file_in(
            Path::new(SYSFS_BLOCK),
            kernel_name(device),
        ))
    }

    fn get_loop_name(&self, file: &str) -> Result<Option<String>> {
        let resolved: PathBuf = fs::canonicalize(file)
            .unwrap_or_else(|_| PathBuf::from(file));
        Ok(loop_name_in(
            Path::new(SYSFS_BLOCK),
            &resolved.to_string_lossy(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fake_sysfs(entries: &[(&str, Option<&str>)]) -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("tempdir");
        for (name, backing) in entries {
            let loop_dir = root.path().join(name).join("loop");
            fs::create_dir_all(&loop_dir).expect("loop dir");
            if let Some(backing) = backing {
                fs::write(loop_dir.join("backing_file"), format!("{backing}\n"))
                    .expect("backing file");
            }
        }
        root
    }

    #[test]
    fn reads_backing_files_from_sysfs() {
        let root = fake_sysfs(&[("loop0", Some("/var/lib/disk.img")), ("loop1", None)]);

        assert_eq!(
            backing_file_in(root.path(), "loop0").as_deref(),
            Some("/var/lib/disk.img")
        );
        assert_eq!(backing_file_in(root.path(), "loop1"), None);
        assert_eq!(backing_file_in(root.path(), "loop9"), None);
    }

    #[test]
    fn finds_loop_by_backing_file() {
        let root = fake_sysfs(&[
            ("loop0", Some("/var/lib/a.img")),
            ("loop7", Some("/var/lib/b.img")),
            ("sda", None),
        ]);

        assert_eq!(
            loop_name_in(root.path(), "/var/lib/b.img").as_deref(),
            Some("loop7")
        );
        assert_eq!(loop_name_in(root.path(), "/var/lib/c.img"), None);
    }

    #[test]
    fn kernel_names_are_bare() {
        assert_eq!(kernel_name("/dev/loop0"), "loop0");
        assert_eq!(kernel_name("loop3"), "loop3");
    }
}
