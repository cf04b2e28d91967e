// SPDX-License-Identifier: GPL-3.0-only

//! Btrfs backend (btrfs-progs)

use blockkit_contracts::traits::{BtrfsOps, BtrfsTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, ExtraArg, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::{run_tool, run_tool_with_extra};
use blockkit_types::{BackendId, BtrfsFilesystemInfo, BtrfsSubvolume};

const DOMAIN: ErrorDomain = ErrorDomain::Btrfs;

pub struct BtrfsBackend;

impl BtrfsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BtrfsBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `btrfs subvolume list` rows
/// ("ID 256 gen 10 top level 5 path home").
fn parse_subvolume_list(output: &str) -> Vec<BtrfsSubvolume> {
    output
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let id_at = tokens.iter().position(|t| *t == "ID")?;
            let level_at = tokens.iter().position(|t| *t == "level")?;
            let path_at = tokens.iter().position(|t| *t == "path")?;

            Some(BtrfsSubvolume {
                id: tokens.get(id_at + 1)?.parse().ok()?,
                parent_id: tokens.get(level_at + 1)?.parse().ok()?,
                path: tokens.get(path_at + 1..)?.join(" "),
            })
        })
        .collect()
}

fn parse_first_u64(input: &str) -> Option<u64> {
    let digits: String = input
        .chars()
        .skip_while(|character| !character.is_ascii_digit())
        .take_while(|character| character.is_ascii_digit())
        .collect();

    if digits.is_empty() { None } else { digits.parse().ok() }
}

/// Parse `btrfs filesystem show --raw` output for a single filesystem.
fn parse_filesystem_show(output: &str) -> Option<BtrfsFilesystemInfo> {
    let mut info: Option<BtrfsFilesystemInfo> = None;

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with("Label:") {
            let label = line
                .split("Label:")
                .nth(1)
                .and_then(|rest| rest.split("uuid:").next())
                .map(str::trim)
                .map(|value| value.trim_matches('\''))
                .filter(|value| !value.is_empty() && *value != "none")
                .map(ToString::to_string);

            let uuid = line
                .split("uuid:")
                .nth(1)
                .map(str::trim)
                .unwrap_or_default()
                .to_string();

            info = Some(BtrfsFilesystemInfo {
                label,
                uuid,
                num_devices: 0,
                used: None,
            });
            continue;
        }

        if let Some(current) = info.as_mut() {
            if line.starts_with("Total devices") {
                current.num_devices = parse_first_u64(line).unwrap_or(0);
                if let Some(used_fragment) = line.split("FS bytes used").nth(1) {
                    current.used = parse_first_u64(used_fragment);
                }
            }
        }
    }

    info
}

impl Backend for BtrfsBackend {
    fn id(&self) -> BackendId {
        BackendId::Btrfs
    }

    fn probe_dependencies(&self) -> Result<()> {
        if !cfg!(feature = "btrfs-tools") {
            return Err(Error::new(
                DOMAIN,
                ErrorKind::TechUnavail,
                "Built without btrfs-tools support",
            ));
        }
        check_tool(DOMAIN, ToolSpec::with_version("btrfs", "--version", "4.0"))?;
        check_tool(DOMAIN, ToolSpec::new("mkfs.btrfs"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        match BtrfsTech::from_raw(tech) {
            Some(BtrfsTech::Filesystem | BtrfsTech::MultiDevice) => {
                check_tool(DOMAIN, ToolSpec::new("mkfs.btrfs"))
            }
            Some(BtrfsTech::Subvolume | BtrfsTech::Snapshot) => {
                check_tool(DOMAIN, ToolSpec::new("btrfs"))
            }
            None => Err(Error::new(
                DOMAIN,
                ErrorKind::Inval,
                format!("Invalid btrfs technology: {tech}"),
            )),
        }
    }

    fn as_btrfs(&self) -> Option<&dyn BtrfsOps> {
        Some(self)
    }
}

impl BtrfsOps for BtrfsBackend {
    fn create_volume(
        &self,
        devices: &[&str],
        label: Option<&str>,
        data_level: Option<&str>,
        md_level: Option<&str>,
        extra: &[ExtraArg],
    ) -> Result<()> {
        if devices.is_empty() {
            return Err(Error::new(
                DOMAIN,
                ErrorKind::Inval,
                "No devices given for the new volume",
            ));
        }

        let mut base: Vec<&str> = vec!["mkfs.btrfs"];
        if let Some(label) = label {
            base.push("-L");
            base.push(label);
        }
        if let Some(level) = data_level {
            base.push("-d");
            base.push(level);
        }
        if let Some(level) = md_level {
            base.push("-m");
            base.push(level);
        }

        run_tool_with_extra(DOMAIN, &base, extra, devices).map(|_| ())
    }

    fn add_device(&self, mountpoint: &str, device: &str, extra: &[ExtraArg]) -> Result<()> {
        run_tool_with_extra(
            DOMAIN,
            &["btrfs", "device", "add"],
            extra,
            &[device, mountpoint],
        )
        .map(|_| ())
    }

    fn remove_device(&self, mountpoint: &str, device: &str, extra: &[ExtraArg]) -> Result<()> {
        run_tool_with_extra(
            DOMAIN,
            &["btrfs", "device", "delete"],
            extra,
            &[device, mountpoint],
        )
        .map(|_| ())
    }

    fn create_subvolume(&self, mountpoint: &str, name: &str, extra: &[ExtraArg]) -> Result<()> {
        let path = format!("{}/{}", mountpoint.trim_end_matches('/'), name);
        run_tool_with_extra(DOMAIN, &["btrfs", "subvolume", "create"], extra, &[&path])
            .map(|_| ())
    }

    fn delete_subvolume(&self, mountpoint: &str, name: &str, extra: &[ExtraArg]) -> Result<()> {
        let path = format!("{}/{}", mountpoint.trim_end_matches('/'), name);
        run_tool_with_extra(DOMAIN, &["btrfs", "subvolume", "delete"], extra, &[&path])
            .map(|_| ())
    }

    fn list_subvolumes(
        &self,
        mountpoint: &str,
        snapshots_only: bool,
    ) -> Result<Vec<BtrfsSubvolume>> {
        let mut base: Vec<&str> = vec!["btrfs", "subvolume", "list"];
        if snapshots_only {
            base.push("-s");
        }
        base.push(mountpoint);

        let output = run_tool(DOMAIN, &base)?;
        Ok(parse_subvolume_list(&output))
    }

    fn create_snapshot(
        &self,
        source: &str,
        dest: &str,
        read_only: bool,
        extra: &[ExtraArg],
    ) -> Result<()> {
        let mut base: Vec<&str> = vec!["btrfs", "subvolume", "snapshot"];
        if read_only {
            base.push("-r");
        }
        run_tool_with_extra(DOMAIN, &base, extra, &[source, dest]).map(|_| ())
    }

    fn filesystem_info(&self, device: &str) -> Result<BtrfsFilesystemInfo> {
        let output = run_tool(DOMAIN, &["btrfs", "filesystem", "show", "--raw", device])?;
        parse_filesystem_show(&output).ok_or_else(|| {
            Error::new(
                DOMAIN,
                ErrorKind::Parse,
                format!("No btrfs filesystem found on '{device}'"),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subvolume_rows() {
        let parsed = parse_subvolume_list(
            "ID 256 gen 10 top level 5 path home\nID 257 gen 12 top level 5 path snapshots/day one\n",
        );

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].id, 256);
        assert_eq!(parsed[0].parent_id, 5);
        assert_eq!(parsed[0].path, "home");
        assert_eq!(parsed[1].path, "snapshots/day one");
    }

    #[test]
    fn parses_filesystem_show_output() {
        let info = parse_filesystem_show(
            "Label: 'rootfs'  uuid: 11111111-2222-3333-4444-555555555555\n\tTotal devices 2 FS bytes used 1048576\n\tdevid    1 size 4096 used 1024 path /dev/sda2\n\tdevid    2 size 4096 used 0 path /dev/sdb2\n",
        )
        .expect("one filesystem");

        assert_eq!(info.label.as_deref(), Some("rootfs"));
        assert_eq!(info.uuid, "11111111-2222-3333-4444-555555555555");
        assert_eq!(info.num_devices, 2);
        assert_eq!(info.used, Some(1048576));
    }

    #[test]
    fn show_without_label_keeps_none() {
        let info = parse_filesystem_show(
            "Label: none  uuid: 11111111-2222-3333-4444-555555555555\n\tTotal devices 1 FS bytes used 0\n",
        )
        .expect("one filesystem");
        assert_eq!(info.label, None);
        assert_eq!(info.num_devices, 1);
    }
}
