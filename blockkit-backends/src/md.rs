// SPDX-License-Identifier: GPL-3.0-only

//! MD RAID backend (mdadm)

use std::fs;
use std::path::Path;

use blockkit_contracts::traits::{MdOps, MdTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, ExtraArg, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::{run_tool, run_tool_with_extra};
use blockkit_types::{BackendId, MdDetail};

const DOMAIN: ErrorDomain = ErrorDomain::MdRaid;

pub struct MdBackend;

impl MdBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MdBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn device_node(device: &str) -> String {
    if device.starts_with('/') {
        device.to_string()
    } else {
        format!("/dev/{device}")
    }
}

/// mdadm spells array names with '/'; device-mapper-safe names replace
/// every occurrence with '-'.
fn sanitize_array_name(name: &str) -> String {
    name.replace('/', "-")
}

/// Convert an mdadm UUID (`XXXXXXXX:XXXXXXXX:XXXXXXXX:XXXXXXXX`) to the
/// canonical 8-4-4-4-12 form.
pub fn canonicalize_uuid(uuid: &str) -> Result<String> {
    let groups: Vec<&str> = uuid.split(':').collect();
    if groups.len() != 4 || groups.iter().any(|group| group.len() != 8) {
        return Err(Error::new(
            DOMAIN,
            ErrorKind::Inval,
            format!("Invalid mdadm UUID: '{uuid}'"),
        ));
    }

    let hex: String = groups.concat();
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::new(
            DOMAIN,
            ErrorKind::Inval,
            format!("Invalid mdadm UUID: '{uuid}'"),
        ));
    }

    let canonical = format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    );

    // parse back to guarantee the canonical form is a well-formed UUID
    uuid::Uuid::parse_str(&canonical)
        .map(|_| canonical)
        .map_err(|_| {
            Error::new(
                DOMAIN,
                ErrorKind::Inval,
                format!("Invalid mdadm UUID: '{uuid}'"),
            )
        })
}

/// Parse `mdadm --detail` output into an [`MdDetail`].
fn parse_detail(device: &str, output: &str) -> MdDetail {
    let mut detail = MdDetail {
        device: device.to_string(),
        ..MdDetail::default()
    };

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        match key {
            "Raid Level" => detail.level = Some(value.to_string()),
            "Raid Devices" => detail.raid_devices = value.parse().unwrap_or(0),
            "Active Devices" => detail.active_devices = value.parse().unwrap_or(0),
            "Spare Devices" => detail.spare_devices = value.parse().unwrap_or(0),
            // value is KiB, possibly followed by human-readable forms
            "Array Size" => {
                detail.array_size = value
                    .split_whitespace()
                    .next()
                    .and_then(|kib| kib.parse::<u64>().ok())
                    .map(|kib| kib * 1024);
            }
            "State" => detail.degraded = value.contains("degraded"),
            "Name" => {
                detail.name = value
                    .split_whitespace()
                    .next()
                    .map(ToString::to_string);
            }
            "UUID" => detail.uuid = canonicalize_uuid(value).ok(),
            _ => {}
        }
    }

    detail
}

impl Backend for MdBackend {
    fn id(&self) -> BackendId {
        BackendId::MdRaid
    }

    fn probe_dependencies(&self) -> Result<()> {
        if !cfg!(feature = "md-tools") {
            return Err(Error::new(
                DOMAIN,
                ErrorKind::TechUnavail,
                "Built without md-tools support",
            ));
        }
        check_tool(DOMAIN, ToolSpec::new("mdadm"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        MdTech::from_raw(tech).map(|_| ()).ok_or_else(|| {
            Error::new(DOMAIN, ErrorKind::Inval, format!("Invalid MD technology: {tech}"))
        })
    }

    fn as_md(&self) -> Option<&dyn MdOps> {
        Some(self)
    }
}

impl MdOps for MdBackend {
    fn create(
        &self,
        device: &str,
        level: &str,
        disks: &[&str],
        spares: u32,
        version: Option<&str>,
        bitmap: bool,
        extra: &[ExtraArg],
    ) -> Result<()> {
        if disks.len() as u32 <= spares {
            return Err(Error::new(
                DOMAIN,
                ErrorKind::Inval,
                "At least one non-spare disk is required",
            ));
        }
        let raid_devices = disks.len() as u32 - spares;

        let node = device_node(device);
        let level_arg = format!("--level={level}");
        let raid_devices_arg = format!("--raid-devices={raid_devices}");
        let mut base: Vec<&str> = vec![
            "mdadm", "--create", &node, "--run", &level_arg, &raid_devices_arg,
        ];

        let spares_arg = format!("--spare-devices={spares}");
        if spares > 0 {
            base.push(&spares_arg);
        }
        let version_arg = version.map(|v| format!("--metadata={v}"));
        if let Some(arg) = &version_arg {
            base.push(arg);
        }
        if bitmap {
            base.push("--bitmap=internal");
        }

        run_tool_with_extra(DOMAIN, &base, extra, disks).map(|_| ())
    }

    fn destroy(&self, device: &str) -> Result<()> {
        run_tool(DOMAIN, &["mdadm", "--zero-superblock", device]).map(|_| ())
    }

    fn activate(
        &self,
        device: Option<&str>,
        members: &[&str],
        uuid: Option<&str>,
        extra: &[ExtraArg],
    ) -> Result<()> {
        let node = device.map(device_node);
        let mut base: Vec<&str> = vec!["mdadm", "--assemble"];
        match &node {
            Some(node) => base.push(node),
            None => base.push("--scan"),
        }

        let uuid_arg = uuid.map(|u| format!("--uuid={u}"));
        if let Some(arg) = &uuid_arg {
            base.push(arg);
        }

        run_tool_with_extra(DOMAIN, &base, extra, members).map(|_| ())
    }

    fn deactivate(&self, device: &str) -> Result<()> {
        let node = device_node(device);
        run_tool(DOMAIN, &["mdadm", "--stop", &node]).map(|_| ())
    }

    fn add(&self, raid: &str, device: &str, extra: &[ExtraArg]) -> Result<()> {
        let node = device_node(raid);
        run_tool_with_extra(DOMAIN, &["mdadm", &node, "--add"], extra, &[device]).map(|_| ())
    }

    fn remove(&self, raid: &str, device: &str, fail: bool, extra: &[ExtraArg]) -> Result<()> {
        let node = device_node(raid);
        if fail {
            run_tool(DOMAIN, &["mdadm", &node, "--fail", device])?;
        }
        run_tool_with_extra(DOMAIN, &["mdadm", &node, "--remove"], extra, &[device]).map(|_| ())
    }

    fn detail(&self, raid: &str) -> Result<MdDetail> {
        let node = device_node(raid);
        let output = run_tool(DOMAIN, &["mdadm", "--detail", &node])?;
        Ok(parse_detail(&node, &output))
    }

    fn canonicalize_uuid(&self, uuid: &str) -> Result<String> {
        canonicalize_uuid(uuid)
    }

    /// Array name for a device node.
    ///
    /// The `/dev/md/*` symlink targets are compared against the bare node
    /// name even when the caller passes a qualified path; this matches
    /// the historical behavior of the interface and is kept on purpose.
    fn name_from_node(&self, node: &str) -> Result<String> {
        let bare = node.rsplit('/').next().unwrap_or(node);

        let entries = fs::read_dir("/dev/md").map_err(|err| {
            Error::new(
                DOMAIN,
                ErrorKind::NoMatch,
                format!("No name found for the node '{bare}': {err}"),
            )
        })?;

        for entry in entries.flatten() {
            let Ok(target) = fs::read_link(entry.path()) else {
                continue;
            };
            let matches_node = target
                .file_name()
                .is_some_and(|name| name.to_string_lossy() == bare);
            if matches_node {
                return Ok(sanitize_array_name(&entry.file_name().to_string_lossy()));
            }
        }

        Err(Error::new(
            DOMAIN,
            ErrorKind::NoMatch,
            format!("No name found for the node '{bare}'"),
        ))
    }

    fn node_from_name(&self, name: &str) -> Result<String> {
        let link = Path::new("/dev/md").join(name);
        let target = fs::read_link(&link).map_err(|err| {
            Error::new(
                DOMAIN,
                ErrorKind::NoMatch,
                format!("No node found for the name '{name}': {err}"),
            )
        })?;

        target
            .file_name()
            .map(|node| node.to_string_lossy().to_string())
            .ok_or_else(|| {
                Error::new(
                    DOMAIN,
                    ErrorKind::NoMatch,
                    format!("No node found for the name '{name}'"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_mdadm_uuids() {
        assert_eq!(
            canonicalize_uuid("3386ff85:f5012621:4a435f06:1eb47236").unwrap(),
            "3386ff85-f501-2621-4a43-5f061eb47236"
        );
    }

    #[test]
    fn rejects_malformed_mdadm_uuids() {
        for bad in [
            "",
            "3386ff85",
            "3386ff85:f5012621:4a435f06",
            "3386ff85:f5012621:4a435f06:1eb4723",
            "3386ff85:f5012621:4a435f06:1eb4723g",
            "3386ff85-f501-2621-4a43-5f061eb47236",
        ] {
            let err = canonicalize_uuid(bad).expect_err("invalid uuid");
            assert_eq!(err.kind, ErrorKind::Inval);
        }
    }

    #[test]
    fn sanitizer_replaces_every_occurrence() {
        assert_eq!(sanitize_array_name("host/vol/0"), "host-vol-0");
        assert_eq!(sanitize_array_name("plain"), "plain");
    }

    #[test]
    fn parses_mdadm_detail() {
        let output = "\
/dev/md0:
           Version : 1.2
     Creation Time : Mon Aug  4 10:00:00 2025
        Raid Level : raid1
        Array Size : 1046528 (1022.00 MiB 1071.64 MB)
      Raid Devices : 2
     Total Devices : 3
       Update Time : Mon Aug  4 10:05:00 2025
             State : clean, degraded
    Active Devices : 1
   Working Devices : 2
    Failed Devices : 0
     Spare Devices : 1
              Name : host:0  (local to host host)
              UUID : 3386ff85:f5012621:4a435f06:1eb47236
";
        let detail = parse_detail("/dev/md0", output);
        assert_eq!(detail.level.as_deref(), Some("raid1"));
        assert_eq!(detail.raid_devices, 2);
        assert_eq!(detail.active_devices, 1);
        assert_eq!(detail.spare_devices, 1);
        assert_eq!(detail.array_size, Some(1046528 * 1024));
        assert!(detail.degraded);
        assert_eq!(detail.name.as_deref(), Some("host:0"));
        assert_eq!(
            detail.uuid.as_deref(),
            Some("3386ff85-f501-2621-4a43-5f061eb47236")
        );
    }
}
