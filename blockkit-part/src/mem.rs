// SPDX-License-Identifier: GPL-3.0-only

//! In-memory table I/O
//!
//! A [`TableIo`] implementation backed by plain maps, used by the test
//! suites and usable for dry runs. Commit semantics mirror a real device:
//! staged edits become visible to later opens only after a successful
//! device-phase commit, and either commit phase can be failed on demand to
//! exercise the engine's phase diagnostics.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use blockkit_sys::BlockTopology;
use blockkit_types::{PartFlag, PartTypeFlag, PartTypeFlags, TableType};

use crate::exception;
use crate::io::{DiskHandle, IoFailure, IoResult, RawPart, TableIo};

/// GPT reserves the backup header and entry array at the device tail.
const GPT_RESERVED_SECTORS: u64 = 34;

#[derive(Debug, Clone)]
struct MemDisk {
    sector_size: u64,
    length_sectors: u64,
    topology: BlockTopology,
    table: TableType,
    parts: Vec<RawPart>,
    fail_commit_dev: bool,
    fail_commit_os: bool,
}

/// Shared in-memory "machine": a set of devices addressable by path.
#[derive(Default)]
pub struct MemTableIo {
    disks: Arc<Mutex<HashMap<String, MemDisk>>>,
}

impl MemTableIo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a device with default topology.
    pub fn add_disk(&self, device: &str, sector_size: u64, length_sectors: u64) {
        self.add_disk_with_topology(
            device,
            sector_size,
            length_sectors,
            BlockTopology {
                logical_sector_size: sector_size,
                minimum_io_size: sector_size,
                optimal_io_size: 0,
                alignment_offset: 0,
            },
        );
    }

    pub fn add_disk_with_topology(
        &self,
        device: &str,
        sector_size: u64,
        length_sectors: u64,
        topology: BlockTopology,
    ) {
        self.disks.lock().insert(
            device.to_string(),
            MemDisk {
                sector_size,
                length_sectors,
                topology,
                table: TableType::Undefined,
                parts: Vec::new(),
                fail_commit_dev: false,
                fail_commit_os: false,
            },
        );
    }

    /// Make the device-phase commit fail until reset.
    pub fn fail_commit_dev(&self, device: &str, fail: bool) {
        if let Some(disk) = self.disks.lock().get_mut(device) {
            disk.fail_commit_dev = fail;
        }
    }

    /// Make the OS-phase commit fail until reset (a busy device).
    pub fn fail_commit_os(&self, device: &str, fail: bool) {
        if let Some(disk) = self.disks.lock().get_mut(device) {
            disk.fail_commit_os = fail;
        }
    }

    /// Committed table type of a device, for assertions.
    pub fn table_type(&self, device: &str) -> Option<TableType> {
        self.disks.lock().get(device).map(|disk| disk.table)
    }

    /// Committed partition entries of a device, for assertions.
    pub fn partitions(&self, device: &str) -> Vec<RawPart> {
        self.disks
            .lock()
            .get(device)
            .map(|disk| disk.parts.clone())
            .unwrap_or_default()
    }
}

impl TableIo for MemTableIo {
    fn open(&self, device: &str) -> IoResult<Box<dyn DiskHandle>> {
        let disks = self.disks.lock();
        let Some(disk) = disks.get(device) else {
            exception::raise(&format!("No such device: {device}"));
            return Err(IoFailure);
        };

        Ok(Box::new(MemHandle {
            device: device.to_string(),
            staged: disk.clone(),
            shared: Arc::clone(&self.disks),
        }))
    }
}

struct MemHandle {
    device: String,
    staged: MemDisk,
    shared: Arc<Mutex<HashMap<String, MemDisk>>>,
}

impl MemHandle {
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

    fn primaries_used(&self) -> u32 {
        self.staged
            .parts
            .iter()
            .filter(|part| !part.type_flags.contains(PartTypeFlag::Logical))
            .count() as u32
    }

    fn extended(&self) -> Option<&RawPart> {
        self.staged
            .parts
            .iter()
            .find(|part| part.type_flags.contains(PartTypeFlag::Extended))
    }

    fn next_number(&self, logical: bool) -> Option<u32> {
        let used: Vec<u32> = self.staged.parts.iter().map(|part| part.num).collect();
        let range = if logical {
            5..=u32::MAX
        } else {
            1..=self.max_primaries()
        };
        range.into_iter().find(|num| !used.contains(num))
    }

    fn overlaps(&self, start: u64, end: u64, logical: bool) -> bool {
        self.staged.parts.iter().any(|part| {
            // Logical partitions live inside the extended container, so
            // only entries on the same level conflict.
            let same_level = part.type_flags.contains(PartTypeFlag::Logical) == logical;
            let container = !logical && part.type_flags.contains(PartTypeFlag::Extended);
            same_level
                && !container
                && start <= part.end_sector()
                && end >= part.start_sector
        }) || (!logical
            && self.extended().is_some_and(|ext| {
                start <= ext.end_sector() && end >= ext.start_sector
            }))
    }
}

impl DiskHandle for MemHandle {
    fn device(&self) -> &str {
        &self.device
    }

    fn sector_size(&self) -> u64 {
        self.staged.sector_size
    }

    fn length_sectors(&self) -> u64 {
        self.staged.length_sectors
    }

    fn last_usable_sector(&self) -> u64 {
        match self.staged.table {
            TableType::Gpt => self.staged.length_sectors - 1 - GPT_RESERVED_SECTORS,
            _ => self.staged.length_sectors - 1,
        }
    }

    fn topology(&self) -> BlockTopology {
        self.staged.topology
    }

    fn table_type(&self) -> TableType {
        self.staged.table
    }

    fn max_primaries(&self) -> u32 {
        match self.staged.table {
            TableType::Gpt => 128,
            _ => 4,
        }
    }

    fn partitions(&self) -> &[RawPart] {
        &self.staged.parts
    }

    fn create_table(&mut self, ttype: TableType) -> IoResult<()> {
        if ttype == TableType::Undefined {
            exception::raise("Cannot create a table of undefined type");
            return Err(IoFailure);
        }
        self.staged.table = ttype;
        self.staged.parts.clear();
        Ok(())
    }

    fn add_partition(
        &mut self,
        type_flags: PartTypeFlags,
        start_sector: u64,
        end_sector: u64,
    ) -> IoResult<RawPart> {
        if self.staged.table == TableType::Undefined {
            exception::raise(&format!(
                "Device {} has no partition table",
                self.device
            ));
            return Err(IoFailure);
        }
        if end_sector < start_sector || end_sector > self.last_usable_sector() {
            exception::raise("Requested geometry is outside the device");
            return Err(IoFailure);
        }

        let logical = type_flags.contains(PartTypeFlag::Logical);
        if logical {
            let Some(ext) = self.extended() else {
                exception::raise("No extended partition to hold a logical partition");
                return Err(IoFailure);
            };
            if start_sector <= ext.start_sector || end_sector > ext.end_sector() {
                exception::raise("Logical partition outside the extended partition");
                return Err(IoFailure);
            }
        } else {
            if self.primaries_used() >= self.max_primaries() {
                exception::raise("No free primary slot");
                return Err(IoFailure);
            }
            if type_flags.contains(PartTypeFlag::Extended) {
                if self.staged.table != TableType::Mbr {
                    exception::raise("Extended partitions exist only on msdos tables");
                    return Err(IoFailure);
                }
                if self.extended().is_some() {
                    exception::raise("The table already has an extended partition");
                    return Err(IoFailure);
                }
            }
        }

        if self.overlaps(start_sector, end_sector, logical) {
            exception::raise("Requested region overlaps an existing partition");
            return Err(IoFailure);
        }

        let Some(num) = self.next_number(logical) else {
            exception::raise("No free partition number");
            return Err(IoFailure);
        };

        let part = RawPart {
            num,
            node: self.node_path(num),
            start_sector,
            size_sectors: end_sector - start_sector + 1,
            type_flags,
            id: match self.staged.table {
                TableType::Mbr if type_flags.contains(PartTypeFlag::Extended) => {
                    Some("0x05".to_string())
                }
                TableType::Mbr => Some("0x83".to_string()),
                _ => None,
            },
            ..RawPart::default()
        };

        self.staged.parts.push(part.clone());
        self.staged.parts.sort_by_key(|entry| entry.start_sector);
        Ok(part)
    }

    fn delete_partition(&mut self, num: u32) -> IoResult<()> {
        let Some(index) = self.staged.parts.iter().position(|part| part.num == num) else {
            exception::raise(&format!("Partition {num} does not exist"));
            return Err(IoFailure);
        };

        let is_extended = self.staged.parts[index]
            .type_flags
            .contains(PartTypeFlag::Extended);
        if is_extended
            && self
                .staged
                .parts
                .iter()
                .any(|part| part.type_flags.contains(PartTypeFlag::Logical))
        {
            exception::raise("Extended partition still holds logical partitions");
            return Err(IoFailure);
        }

        self.staged.parts.remove(index);
        Ok(())
    }

    fn flag_available(&self, _num: u32, flag: PartFlag) -> bool {
        match self.staged.table {
            TableType::Mbr => matches!(flag, PartFlag::Boot | PartFlag::Lba),
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
        let Some(part) = self.staged.parts.iter_mut().find(|part| part.num == num) else {
            exception::raise(&format!("Partition {num} does not exist"));
            return Err(IoFailure);
        };

        if state {
            part.flags |= flag;
        } else {
            part.flags &= !flag;
        }
        if flag == PartFlag::Boot {
            part.bootable = state;
        }
        Ok(())
    }

    fn commit_to_dev(&mut self) -> IoResult<()> {
        if self.staged.fail_commit_dev {
            exception::raise(&format!("Input/output error on {}", self.device));
            return Err(IoFailure);
        }

        let mut disks = self.shared.lock();
        if let Some(disk) = disks.get_mut(&self.device) {
            let fail_commit_os = disk.fail_commit_os;
            *disk = self.staged.clone();
            disk.fail_commit_os = fail_commit_os;
        }
        Ok(())
    }

    fn commit_to_os(&mut self) -> IoResult<()> {
        let busy = self
            .shared
            .lock()
            .get(&self.device)
            .is_some_and(|disk| disk.fail_commit_os);
        if busy {
            exception::raise(&format!("Device or resource busy: {}", self.device));
            return Err(IoFailure);
        }
        Ok(())
    }
}
