// SPDX-License-Identifier: GPL-3.0-only

//! sfdisk-backed table I/O
//!
//! Reads tables with `sfdisk --json`, stages edits in memory, and applies
//! them during the commit phases: the device phase feeds a dump script
//! back to `sfdisk --no-reread --no-tell-kernel`, the OS phase issues the
//! BLKRRPART ioctl. Tool failures are reported through the exception
//! callback with the captured stderr.

use std::io::Write;
use std::os::fd::AsRawFd;
use std::process::{Command, Stdio};

use serde::Deserialize;

use blockkit_contracts::ErrorDomain;
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::{BlockTopology, topology};
use blockkit_types::{PartFlag, PartFlags, PartTypeFlag, PartTypeFlags, TableType};

use crate::exception;
use crate::io::{DiskHandle, IoFailure, IoResult, RawPart, TableIo};

const GPT_RESERVED_SECTORS: u64 = 34;

/// Linux filesystem data, the default type for new GPT partitions.
const GUID_LINUX_DATA: &str = "0FC63DAF-8483-4772-8E79-3D69D8477DE4";
const GUID_ESP: &str = "C12A7328-F81F-11D2-BA4B-00A0C93EC93B";
const GUID_BIOS_GRUB: &str = "21686148-6449-6E6F-744E-656564454649";
const GUID_MSFT_RESERVED: &str = "E3C9E316-0B5C-4DB8-817D-F92DF00215AE";
const GUID_MSFT_DATA: &str = "EBD0A0A2-B9E5-4433-87C0-68B6B72699C7";
const GUID_PREP: &str = "9E1A2D38-C612-4316-AA26-8B49521E5A8B";
const GUID_SWAP: &str = "0657FD6D-A4AB-43C4-84E5-0933C84B4F4F";
const GUID_RAID: &str = "A19D880F-05FC-4D3B-A006-743F0F84911E";
const GUID_LVM: &str = "E6D6D379-F507-44C2-A23C-238F2A3DF928";

/// GPT attribute bits as sfdisk renders them.
const ATTR_LEGACY_BOOT: u64 = 1 << 2;
const ATTR_HIDDEN: u64 = 1 << 62;

nix::ioctl_none!(blkrrpart, 0x12, 95);

/// Table I/O over the sfdisk CLI and the kernel re-read ioctl.
#[derive(Debug, Default)]
pub struct SfdiskIo;

impl SfdiskIo {
    pub fn new() -> Self {
        Self
    }
}

impl TableIo for SfdiskIo {
    fn open(&self, device: &str) -> IoResult<Box<dyn DiskHandle>> {
        SfdiskDisk::open(device).map(|disk| Box::new(disk) as Box<dyn DiskHandle>)
    }

    fn probe(&self) -> blockkit_contracts::Result<()> {
        check_tool(
            ErrorDomain::Part,
            ToolSpec::with_version("sfdisk", "--version", "2.30"),
        )
    }
}

#[derive(Debug, Deserialize)]
struct SfdiskDump {
    partitiontable: SfdiskTable,
}

#[derive(Debug, Deserialize)]
struct SfdiskTable {
    label: String,
    #[serde(default)]
    lastlba: Option<u64>,
    #[serde(default)]
    partitions: Vec<SfdiskPart>,
}

#[derive(Debug, Deserialize)]
struct SfdiskPart {
    node: String,
    start: u64,
    size: u64,
    #[serde(rename = "type")]
    type_id: Option<String>,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    attrs: Option<String>,
    #[serde(default)]
    bootable: bool,
}

struct SfdiskDisk {
    device: String,
    sector_size: u64,
    length_sectors: u64,
    last_lba: Option<u64>,
    topology: BlockTopology,
    table: TableType,
    parts: Vec<RawPart>,
}

/// Trailing-digit partition number of a node path ("/dev/sda3" → 3).
fn node_number(node: &str) -> u32 {
    let digits: String = node
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    digits.parse().unwrap_or(0)
}

fn is_extended_id(type_id: &str) -> bool {
    matches!(
        type_id.trim_start_matches("0x").to_lowercase().as_str(),
        "5" | "05" | "f" | "0f" | "85"
    )
}

/// Parse sfdisk's attribute list ("LegacyBIOSBootable GUID:62") into raw
/// GPT attribute bits.
fn parse_attrs(attrs: &str) -> u64 {
    let mut bits = 0;
    for token in attrs.split(|c| c == ' ' || c == ',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match token {
            "RequiredPartition" => bits |= 1,
            "NoBlockIOProtocol" => bits |= 1 << 1,
            "LegacyBIOSBootable" => bits |= ATTR_LEGACY_BOOT,
            other => {
                if let Some(bit) = other.strip_prefix("GUID:").and_then(|n| n.parse::<u32>().ok())
                    && bit < 64
                {
                    bits |= 1u64 << bit;
                }
            }
        }
    }
    bits
}

/// Render raw GPT attribute bits back into sfdisk's attribute list.
fn format_attrs(bits: u64) -> String {
    let mut tokens = Vec::new();
    if bits & 1 != 0 {
        tokens.push("RequiredPartition".to_string());
    }
    if bits & (1 << 1) != 0 {
        tokens.push("NoBlockIOProtocol".to_string());
    }
    if bits & ATTR_LEGACY_BOOT != 0 {
        tokens.push("LegacyBIOSBootable".to_string());
    }
    for bit in 48..64 {
        if bits & (1u64 << bit) != 0 {
            tokens.push(format!("GUID:{bit}"));
        }
    }
    tokens.join(" ")
}

fn flags_from_gpt(type_guid: Option<&str>, attrs: u64) -> PartFlags {
    let mut flags = PartFlags::empty();
    match type_guid.map(str::to_uppercase).as_deref() {
        Some(GUID_ESP) => flags |= PartFlag::Boot | PartFlag::Esp,
        Some(GUID_BIOS_GRUB) => flags |= PartFlag::BiosGrub,
        Some(GUID_MSFT_RESERVED) => flags |= PartFlag::MsftReserved,
        Some(GUID_MSFT_DATA) => flags |= PartFlag::MsftData,
        Some(GUID_PREP) => flags |= PartFlag::Prep,
        Some(GUID_SWAP) => flags |= PartFlag::Swap,
        Some(GUID_RAID) => flags |= PartFlag::Raid,
        Some(GUID_LVM) => flags |= PartFlag::Lvm,
        _ => {}
    }
    if attrs & ATTR_LEGACY_BOOT != 0 {
        flags |= PartFlag::LegacyBoot;
    }
    if attrs & ATTR_HIDDEN != 0 {
        flags |= PartFlag::Hidden;
    }
    flags
}

fn flags_from_mbr(type_id: Option<&str>, bootable: bool) -> PartFlags {
    let mut flags = PartFlags::empty();
    if bootable {
        flags |= PartFlag::Boot;
    }
    match type_id
        .map(|id| id.trim_start_matches("0x").to_lowercase())
        .as_deref()
    {
        Some("c" | "0c" | "e" | "0e") => flags |= PartFlag::Lba,
        Some("82") => flags |= PartFlag::Swap,
        Some("fd") => flags |= PartFlag::Raid,
        Some("8e") => flags |= PartFlag::Lvm,
        _ => {}
    }
    flags
}

impl SfdiskDisk {
    fn open(device: &str) -> IoResult<Self> {
        let Some(size_bytes) = topology::device_size_bytes(device) else {
            exception::raise(&format!("Failed to determine the size of device '{device}'"));
            return Err(IoFailure);
        };
        let topo = topology::read_topology(device);
        let sector_size = topo.logical_sector_size;

        let mut disk = Self {
            device: device.to_string(),
            sector_size,
            length_sectors: size_bytes / sector_size,
            last_lba: None,
            topology: topo,
            table: TableType::Undefined,
            parts: Vec::new(),
        };

        // A device without a recognizable table is a valid open; sfdisk
        // exits non-zero for it and the table stays Undefined.
        let output = Command::new("sfdisk")
            .args(["--json", device])
            .output()
            .map_err(|err| {
                exception::raise(&format!("Failed to execute sfdisk: {err}"));
                IoFailure
            })?;
        if output.status.success() {
            let dump: SfdiskDump =
                serde_json::from_slice(&output.stdout).map_err(|err| {
                    exception::raise(&format!(
                        "Failed to parse sfdisk output for '{device}': {err}"
                    ));
                    IoFailure
                })?;
            disk.load_dump(dump.partitiontable);
        }

        Ok(disk)
    }

    fn load_dump(&mut self, table: SfdiskTable) {
        self.table = TableType::parse(&table.label);
        self.last_lba = table.lastlba;
        self.parts = table
            .partitions
            .into_iter()
            .map(|part| {
                let num = node_number(&part.node);
                let attrs = part.attrs.as_deref().map(parse_attrs).unwrap_or(0);
                let mut type_flags = PartTypeFlags::empty();
                let (id, type_guid, flags) = match self.table {
                    TableType::Mbr => {
                        if num >= 5 {
                            type_flags |= PartTypeFlag::Logical;
                        }
                        if part.type_id.as_deref().is_some_and(is_extended_id) {
                            type_flags |= PartTypeFlag::Extended;
                        }
                        let flags = flags_from_mbr(part.type_id.as_deref(), part.bootable);
                        (part.type_id.clone(), None, flags)
                    }
                    _ => {
                        let flags = flags_from_gpt(part.type_id.as_deref(), attrs);
                        (None, part.type_id.clone(), flags)
                    }
                };

                RawPart {
                    num,
                    node: part.node,
                    start_sector: part.start,
                    size_sectors: part.size,
                    type_flags,
                    name: part.name,
                    uuid: part.uuid,
                    type_guid,
                    id,
                    bootable: part.bootable,
                    attrs,
                    flags,
                }
            })
            .collect();
        self.parts.sort_by_key(|part| part.start_sector);
    }

    fn node_path(&self, num: u32) -> String {
        let separator = if self
            .device
            .chars()
            .last()
            .is_some_and(|c| c.is_ascii_digit())
        {
            "p"
        } else {
            ""
        };
        format!("{}{}{}", self.device, separator, num)
    }

    fn next_number(&self, logical: bool) -> Option<u32> {
        let used: Vec<u32> = self.parts.iter().map(|part| part.num).collect();
        let range = if logical {
            5..=u32::MAX
        } else {
            1..=self.max_primaries()
        };
        range.into_iter().find(|num| !used.contains(num))
    }

    /// Render the staged table as an sfdisk dump script, nodes pinned so
    /// partition numbers survive the round trip.
    fn dump_script(&self) -> String {
        let mut script = String::new();
        if let Some(label) = self.table.as_str() {
            // sfdisk spells MBR as "dos"
            let label = if label == "msdos" { "dos" } else { label };
            script.push_str(&format!("label: {label}\n"));
        }
        script.push_str("unit: sectors\n\n");

        for part in &self.parts {
            let mut fields = vec![
                format!("start={}", part.start_sector),
                format!("size={}", part.size_sectors),
            ];
            match self.table {
                TableType::Mbr => {
                    if let Some(id) = &part.id {
                        fields.push(format!("type={}", id.trim_start_matches("0x")));
                    }
                    if part.bootable {
                        fields.push("bootable".to_string());
                    }
                }
                _ => {
                    if let Some(guid) = &part.type_guid {
                        fields.push(format!("type={guid}"));
                    }
                    if let Some(uuid) = &part.uuid {
                        fields.push(format!("uuid={uuid}"));
                    }
                    if let Some(name) = &part.name {
                        fields.push(format!("name=\"{name}\""));
                    }
                    if part.attrs != 0 {
                        fields.push(format!("attrs=\"{}\"", format_attrs(part.attrs)));
                    }
                }
            }
            script.push_str(&format!("{} : {}\n", part.node, fields.join(", ")));
        }
        script
    }

    fn part_mut(&mut self, num: u32) -> IoResult<&mut RawPart> {
        let found = self.parts.iter_mut().find(|part| part.num == num);
        match found {
            Some(part) => Ok(part),
            None => {
                exception::raise(&format!("Partition {num} does not exist"));
                Err(IoFailure)
            }
        }
    }
}

impl DiskHandle for SfdiskDisk {
    fn device(&self) -> &str {
        &self.device
    }

    fn sector_size(&self) -> u64 {
        self.sector_size
    }

    fn length_sectors(&self) -> u64 {
        self.length_sectors
    }

    fn last_usable_sector(&self) -> u64 {
        match self.table {
            TableType::Gpt => self
                .last_lba
                .unwrap_or(self.length_sectors - 1 - GPT_RESERVED_SECTORS),
            _ => self.length_sectors - 1,
        }
    }

    fn topology(&self) -> BlockTopology {
        self.topology
    }

    fn table_type(&self) -> TableType {
        self.table
    }

    fn max_primaries(&self) -> u32 {
        match self.table {
            TableType::Gpt => 128,
            _ => 4,
        }
    }

    fn partitions(&self) -> &[RawPart] {
        &self.parts
    }

    fn create_table(&mut self, ttype: TableType) -> IoResult<()> {
        if ttype == TableType::Undefined {
            exception::raise("Cannot create a table of undefined type");
            return Err(IoFailure);
        }
        self.table = ttype;
        self.last_lba = None;
        self.parts.clear();
        Ok(())
    }

    fn add_partition(
        &mut self,
        type_flags: PartTypeFlags,
        start_sector: u64,
        end_sector: u64,
    ) -> IoResult<RawPart> {
        if self.table == TableType::Undefined {
            exception::raise(&format!("Device {} has no partition table", self.device));
            return Err(IoFailure);
        }
        if end_sector < start_sector || end_sector > self.last_usable_sector() {
            exception::raise("Requested geometry is outside the device");
            return Err(IoFailure);
        }
        if type_flags.contains(PartTypeFlag::Extended) && self.table != TableType::Mbr {
            exception::raise("Extended partitions exist only on msdos tables");
            return Err(IoFailure);
        }

        let logical = type_flags.contains(PartTypeFlag::Logical);
        let Some(num) = self.next_number(logical) else {
            exception::raise("No free partition slot");
            return Err(IoFailure);
        };

        let part = RawPart {
            num,
            node: self.node_path(num),
            start_sector,
            size_sectors: end_sector - start_sector + 1,
            type_flags,
            id: match self.table {
                TableType::Mbr if type_flags.contains(PartTypeFlag::Extended) => {
                    Some("0x05".to_string())
                }
                TableType::Mbr => Some("0x83".to_string()),
                _ => None,
            },
            type_guid: (self.table == TableType::Gpt).then(|| GUID_LINUX_DATA.to_string()),
            ..RawPart::default()
        };

        self.parts.push(part.clone());
        self.parts.sort_by_key(|entry| entry.start_sector);
        Ok(part)
    }

    fn delete_partition(&mut self, num: u32) -> IoResult<()> {
        let Some(index) = self.parts.iter().position(|part| part.num == num) else {
            exception::raise(&format!("Partition {num} does not exist"));
            return Err(IoFailure);
        };
        if self.parts[index].type_flags.contains(PartTypeFlag::Extended)
            && self
                .parts
                .iter()
                .any(|part| part.type_flags.contains(PartTypeFlag::Logical))
        {
            exception::raise("Extended partition still holds logical partitions");
            return Err(IoFailure);
        }
        self.parts.remove(index);
        Ok(())
    }

    fn flag_available(&self, _num: u32, flag: PartFlag) -> bool {
        match self.table {
            TableType::Mbr => matches!(
                flag,
                PartFlag::Boot | PartFlag::Lba | PartFlag::Swap | PartFlag::Raid | PartFlag::Lvm
            ),
            TableType::Gpt => matches!(
                flag,
                PartFlag::Boot
                    | PartFlag::Esp
                    | PartFlag::LegacyBoot
                    | PartFlag::Hidden
                    | PartFlag::BiosGrub
                    | PartFlag::MsftData
                    | PartFlag::MsftReserved
                    | PartFlag::Prep
                    | PartFlag::Swap
                    | PartFlag::Raid
                    | PartFlag::Lvm
            ),
            TableType::Undefined => false,
        }
    }

    fn set_flag(&mut self, num: u32, flag: PartFlag, state: bool) -> IoResult<()> {
        if !self.flag_available(num, flag) {
            exception::raise(&format!(
                "Flag '{}' is not supported on this table",
                flag.as_str()
            ));
            return Err(IoFailure);
        }

        let table = self.table;
        let part = self.part_mut(num)?;
        if state {
            part.flags |= flag;
        } else {
            part.flags &= !flag;
        }

        match table {
            TableType::Mbr => match flag {
                PartFlag::Boot => part.bootable = state,
                PartFlag::Lba => {
                    part.id = Some(if state { "0x0c" } else { "0x83" }.to_string());
                }
                PartFlag::Swap => {
                    part.id = Some(if state { "0x82" } else { "0x83" }.to_string());
                }
                PartFlag::Raid => {
                    part.id = Some(if state { "0xfd" } else { "0x83" }.to_string());
                }
                PartFlag::Lvm => {
                    part.id = Some(if state { "0x8e" } else { "0x83" }.to_string());
                }
                _ => {}
            },
            _ => match flag {
                PartFlag::Boot | PartFlag::Esp => {
                    part.type_guid =
                        Some(if state { GUID_ESP } else { GUID_LINUX_DATA }.to_string());
                    if flag == PartFlag::Boot {
                        part.bootable = state;
                    }
                }
                PartFlag::BiosGrub => {
                    part.type_guid =
                        Some(if state { GUID_BIOS_GRUB } else { GUID_LINUX_DATA }.to_string());
                }
                PartFlag::MsftData => {
                    part.type_guid =
                        Some(if state { GUID_MSFT_DATA } else { GUID_LINUX_DATA }.to_string());
                }
                PartFlag::MsftReserved => {
                    part.type_guid = Some(
                        if state { GUID_MSFT_RESERVED } else { GUID_LINUX_DATA }.to_string(),
                    );
                }
                PartFlag::Prep => {
                    part.type_guid =
                        Some(if state { GUID_PREP } else { GUID_LINUX_DATA }.to_string());
                }
                PartFlag::Swap => {
                    part.type_guid =
                        Some(if state { GUID_SWAP } else { GUID_LINUX_DATA }.to_string());
                }
                PartFlag::Raid => {
                    part.type_guid =
                        Some(if state { GUID_RAID } else { GUID_LINUX_DATA }.to_string());
                }
                PartFlag::Lvm => {
                    part.type_guid =
                        Some(if state { GUID_LVM } else { GUID_LINUX_DATA }.to_string());
                }
                PartFlag::LegacyBoot => {
                    if state {
                        part.attrs |= ATTR_LEGACY_BOOT;
                    } else {
                        part.attrs &= !ATTR_LEGACY_BOOT;
                    }
                }
                PartFlag::Hidden => {
                    if state {
                        part.attrs |= ATTR_HIDDEN;
                    } else {
                        part.attrs &= !ATTR_HIDDEN;
                    }
                }
                _ => {}
            },
        }
        Ok(())
    }

    fn commit_to_dev(&mut self) -> IoResult<()> {
        let script = self.dump_script();
        tracing::debug!(device = %self.device, "writing partition table:\n{script}");

        let mut child = Command::new("sfdisk")
            .args(["--quiet", "--no-reread", "--no-tell-kernel", &self.device])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                exception::raise(&format!("Failed to execute sfdisk: {err}"));
                IoFailure
            })?;

        if let Some(stdin) = child.stdin.as_mut()
            && stdin.write_all(script.as_bytes()).is_err()
        {
            let _ = child.kill();
            exception::raise("Failed to feed the partition script to sfdisk");
            return Err(IoFailure);
        }

        let output = child.wait_with_output().map_err(|err| {
            exception::raise(&format!("Failed to wait for sfdisk: {err}"));
            IoFailure
        })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            exception::raise(stderr.trim());
            return Err(IoFailure);
        }
        Ok(())
    }

    fn commit_to_os(&mut self) -> IoResult<()> {
        let file = std::fs::File::open(&self.device).map_err(|err| {
            exception::raise(&format!("Failed to open '{}': {err}", self.device));
            IoFailure
        })?;
        if let Err(err) = unsafe { blkrrpart(file.as_raw_fd()) } {
            exception::raise(&format!(
                "BLKRRPART ioctl on '{}' failed: {err}",
                self.device
            ));
            return Err(IoFailure);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sfdisk_json_dump() {
        let raw = r#"{
            "partitiontable": {
                "label": "gpt",
                "id": "A345B2C1-0000-0000-0000-000000000000",
                "device": "/dev/sda",
                "unit": "sectors",
                "firstlba": 2048,
                "lastlba": 2097118,
                "sectorsize": 512,
                "partitions": [
                    {"node": "/dev/sda1", "start": 2048, "size": 204800,
                     "type": "C12A7328-F81F-11D2-BA4B-00A0C93EC93B",
                     "uuid": "11111111-2222-3333-4444-555555555555",
                     "name": "esp"},
                    {"node": "/dev/sda2", "start": 206848, "size": 1890270,
                     "type": "0FC63DAF-8483-4772-8E79-3D69D8477DE4",
                     "attrs": "LegacyBIOSBootable GUID:62"}
                ]
            }
        }"#;
        let dump: SfdiskDump = serde_json::from_str(raw).expect("valid dump");
        assert_eq!(dump.partitiontable.label, "gpt");
        assert_eq!(dump.partitiontable.partitions.len(), 2);

        let mut disk = SfdiskDisk {
            device: "/dev/sda".to_string(),
            sector_size: 512,
            length_sectors: 2097152,
            last_lba: None,
            topology: BlockTopology::default(),
            table: TableType::Undefined,
            parts: Vec::new(),
        };
        disk.load_dump(dump.partitiontable);

        assert_eq!(disk.table, TableType::Gpt);
        assert_eq!(disk.last_lba, Some(2097118));
        assert_eq!(disk.parts[0].num, 1);
        assert!(disk.parts[0].flags.contains(PartFlag::Esp));
        assert!(disk.parts[0].flags.contains(PartFlag::Boot));
        assert_eq!(disk.parts[0].name.as_deref(), Some("esp"));
        assert!(disk.parts[1].flags.contains(PartFlag::LegacyBoot));
        assert!(disk.parts[1].flags.contains(PartFlag::Hidden));
    }

    #[test]
    fn recognizes_mbr_structure() {
        let raw = r#"{
            "partitiontable": {
                "label": "dos",
                "device": "/dev/sdb",
                "unit": "sectors",
                "partitions": [
                    {"node": "/dev/sdb1", "start": 2048, "size": 2048, "type": "83",
                     "bootable": true},
                    {"node": "/dev/sdb2", "start": 4096, "size": 8192, "type": "5"},
                    {"node": "/dev/sdb5", "start": 6144, "size": 2048, "type": "83"}
                ]
            }
        }"#;
        let dump: SfdiskDump = serde_json::from_str(raw).expect("valid dump");
        let mut disk = SfdiskDisk {
            device: "/dev/sdb".to_string(),
            sector_size: 512,
            length_sectors: 1 << 21,
            last_lba: None,
            topology: BlockTopology::default(),
            table: TableType::Undefined,
            parts: Vec::new(),
        };
        disk.load_dump(dump.partitiontable);

        assert_eq!(disk.table, TableType::Mbr);
        assert!(disk.parts[0].flags.contains(PartFlag::Boot));
        assert!(disk.parts[0].type_flags.is_empty());
        assert!(disk.parts[1].type_flags.contains(PartTypeFlag::Extended));
        assert!(disk.parts[2].type_flags.contains(PartTypeFlag::Logical));
    }

    #[test]
    fn dump_script_round_trips_staged_state() {
        let mut disk = SfdiskDisk {
            device: "/dev/sdc".to_string(),
            sector_size: 512,
            length_sectors: 1 << 21,
            last_lba: None,
            topology: BlockTopology::default(),
            table: TableType::Undefined,
            parts: Vec::new(),
        };
        disk.create_table(TableType::Gpt).expect("staged table");
        let part = disk.add_partition(PartTypeFlags::empty(), 2048, 206847).expect("staged part");
        assert_eq!(part.num, 1);
        assert_eq!(part.node, "/dev/sdc1");
        disk.set_flag(1, PartFlag::Esp, true).expect("esp flag");
        disk.set_flag(1, PartFlag::LegacyBoot, true).expect("legacy boot");

        let script = disk.dump_script();
        assert!(script.starts_with("label: gpt\n"));
        assert!(script.contains("/dev/sdc1 : start=2048, size=204800"));
        assert!(script.contains(&format!("type={GUID_ESP}")));
        assert!(script.contains("attrs=\"LegacyBIOSBootable\""));
    }

    #[test]
    fn mbr_script_spells_dos_and_bootable() {
        let mut disk = SfdiskDisk {
            device: "/dev/sdd".to_string(),
            sector_size: 512,
            length_sectors: 1 << 21,
            last_lba: None,
            topology: BlockTopology::default(),
            table: TableType::Undefined,
            parts: Vec::new(),
        };
        disk.create_table(TableType::Mbr).expect("staged table");
        disk.add_partition(PartTypeFlags::empty(), 2048, 4095).expect("staged part");
        disk.set_flag(1, PartFlag::Boot, true).expect("boot flag");

        let script = disk.dump_script();
        assert!(script.starts_with("label: dos\n"));
        assert!(script.contains("type=83"));
        assert!(script.contains("bootable"));
    }

    #[test]
    fn attr_bits_round_trip() {
        let bits = parse_attrs("RequiredPartition LegacyBIOSBootable GUID:62 GUID:63");
        assert_eq!(bits & 1, 1);
        assert_ne!(bits & ATTR_LEGACY_BOOT, 0);
        assert_ne!(bits & ATTR_HIDDEN, 0);
        assert_ne!(bits & (1 << 63), 0);
        assert_eq!(parse_attrs(&format_attrs(bits)), bits);
    }

    #[test]
    fn node_numbers_handle_p_separators() {
        assert_eq!(node_number("/dev/sda3"), 3);
        assert_eq!(node_number("/dev/nvme0n1p12"), 12);
        assert_eq!(node_number("/dev/sda"), 0);
    }
}
