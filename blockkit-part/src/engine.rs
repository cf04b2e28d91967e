// SPDX-License-Identifier: GPL-3.0-only

//! The partition engine
//!
//! Placement arithmetic, extended/logical bookkeeping, flag translation
//! and the two-phase commit. Every operation opens the device through the
//! [`TableIo`] boundary at entry and releases it on every exit path;
//! nothing survives between calls. Failed operations append the message
//! captured in the thread-local exception slot to their own diagnostic.

use std::sync::Arc;

use blockkit_contracts::traits::{PartOps, PartTech};
use blockkit_contracts::{Backend, Error, ErrorDomain, ErrorKind, Result, TechModes};
use blockkit_types::{
    BackendId, PartAlign, PartFlag, PartFlags, PartSpec, PartTypeFlag, PartTypeFlags, PartTypeReq,
    TableType, partition::is_real_partition,
};

use crate::exception;
use crate::io::{DiskHandle, RawPart, TableIo};
use crate::sfdisk::SfdiskIo;

/// Clearance kept between a logical partition and its predecessor (or the
/// start of the extended container).
const LOGICAL_CLEARANCE: u64 = 1024 * 1024;

/// The PART backend: partition-table editing over a [`TableIo`].
pub struct PartBackend {
    io: Arc<dyn TableIo>,
}

impl PartBackend {
    pub fn new(io: Arc<dyn TableIo>) -> Self {
        Self { io }
    }

    /// Engine over the sfdisk-backed table I/O.
    pub fn with_default_io() -> Self {
        Self::new(Arc::new(SfdiskIo::new()))
    }

    fn open(&self, disk: &str) -> Result<Box<dyn DiskHandle>> {
        self.io.open(disk).map_err(|_| {
            fail_with_exception(ErrorKind::Fail, format!("Failed to open the device '{disk}'"))
        })
    }
}

/// Build a `Part`-domain error, draining the thread's exception slot into
/// a parenthesized suffix when one was captured.
fn fail_with_exception(kind: ErrorKind, prefix: String) -> Error {
    let message = match exception::drain_slot() {
        Some(captured) => format!("{prefix} ({captured})"),
        None => prefix,
    };
    Error::new(ErrorDomain::Part, kind, message)
}

fn inval(message: impl Into<String>) -> Error {
    Error::new(ErrorDomain::Part, ErrorKind::Inval, message)
}

/// Extract the partition number from a partition path.
///
/// Walks backwards over trailing digits (and `-`, for composite paths);
/// anything that does not parse to a positive number is `Inval`.
pub fn partition_number(path: &str) -> Result<u32> {
    let bytes = path.as_bytes();
    let mut index = bytes.len();
    while index > 0 && (bytes[index - 1].is_ascii_digit() || bytes[index - 1] == b'-') {
        index -= 1;
    }

    let suffix = &path[index..];
    let number: i64 = suffix
        .parse()
        .map_err(|_| inval(format!("Cannot extract partition number from path '{path}'")))?;
    if number <= 0 {
        return Err(inval(format!(
            "Invalid partition number {number} extracted from path '{path}'"
        )));
    }

    Ok(number as u32)
}

/// String form of a table type; `Undefined` is `Inval`.
pub fn table_type_to_string(ttype: TableType) -> Result<&'static str> {
    ttype
        .as_str()
        .ok_or_else(|| inval("Invalid partition table type"))
}

/// String form of a partition's structural kind; combinations that do not
/// occur in a table are `Inval`.
pub fn part_type_to_string(type_flags: PartTypeFlags) -> Result<&'static str> {
    if type_flags.is_empty() {
        return Ok("normal");
    }
    type_flags
        .exactly_one()
        .map(PartTypeFlag::as_str)
        .ok_or_else(|| inval("Invalid partition type"))
}

/// String form of a partition flag.
pub fn flag_to_string(flag: PartFlag) -> &'static str {
    flag.as_str()
}

fn round_up(value: u64, step: u64) -> u64 {
    if step == 0 {
        return value;
    }
    value.div_ceil(step) * step
}

fn spec_from_raw(raw: &RawPart, sector_size: u64) -> PartSpec {
    PartSpec {
        path: raw.node.clone(),
        name: raw.name.clone(),
        uuid: raw.uuid.clone(),
        id: raw.id.clone(),
        type_guid: raw.type_guid.clone(),
        type_flags: raw.type_flags,
        start: raw.start_sector * sector_size,
        size: raw.size_sectors * sector_size,
        bootable: raw.bootable,
        attrs: raw.attrs,
        flags: raw.flags,
    }
}

fn extended_of(handle: &dyn DiskHandle) -> Option<RawPart> {
    handle
        .partitions()
        .iter()
        .find(|part| part.type_flags.contains(PartTypeFlag::Extended))
        .cloned()
}

/// Minimum permitted start for a logical partition at `start`: the
/// clearance past the relevant predecessor's end (or past the extended
/// partition's start), rounded up to a whole sector.
fn clamp_logical_start(handle: &dyn DiskHandle, start: u64) -> Result<u64> {
    let sector_size = handle.sector_size();
    let ext = extended_of(handle).ok_or_else(|| {
        inval("Cannot create a logical partition without an extended partition")
    })?;

    let mut minimum = ext.start_sector * sector_size + LOGICAL_CLEARANCE;
    for part in handle.partitions().iter().rev() {
        if !part.type_flags.contains(PartTypeFlag::Logical) {
            continue;
        }
        let end = (part.end_sector() + 1) * sector_size;
        if end <= start {
            minimum = end + LOGICAL_CLEARANCE;
            break;
        }
    }

    Ok(round_up(start.max(minimum), sector_size))
}

/// Last sector of the free region containing `start_sector` on the given
/// level (inside the extended partition for logicals, the whole disk
/// otherwise).
fn free_region_end(
    handle: &dyn DiskHandle,
    start_sector: u64,
    type_flags: PartTypeFlags,
) -> Result<u64> {
    let logical = type_flags.contains(PartTypeFlag::Logical);
    let mut end = if logical {
        extended_of(handle)
            .ok_or_else(|| {
                inval("Cannot create a logical partition without an extended partition")
            })?
            .end_sector()
    } else {
        handle.last_usable_sector()
    };

    for part in handle.partitions() {
        if part.type_flags.contains(PartTypeFlag::Logical) != logical {
            continue;
        }
        if part.start_sector > start_sector {
            end = end.min(part.start_sector - 1);
        }
    }

    if end < start_sector {
        return Err(fail_with_exception(
            ErrorKind::Fail,
            format!(
                "No usable free region at the requested location on device '{}'",
                handle.device()
            ),
        ));
    }
    Ok(end)
}

/// Resolve placement and stage the partition. Start handling: logical
/// clearance clamp, byte→sector round-up, then alignment to the grain the
/// mode selects. `size = 0` takes the rest of the containing free region.
fn place_partition(
    handle: &mut dyn DiskHandle,
    type_flags: PartTypeFlags,
    start: u64,
    size: u64,
    align: PartAlign,
) -> Result<RawPart> {
    let device = handle.device().to_string();
    let sector_size = handle.sector_size();
    let topology = handle.topology();
    let grain = match align {
        PartAlign::Optimal => topology.optimal_grain(),
        PartAlign::Minimal => topology.minimal_grain(),
        PartAlign::None => sector_size,
    };

    let start = if type_flags.contains(PartTypeFlag::Logical) {
        clamp_logical_start(handle, start)?
    } else {
        start
    };

    let start_sector = start.div_ceil(sector_size);
    let aligned = round_up(start_sector * sector_size, grain);
    let start_sector = aligned.div_ceil(sector_size);

    let end_sector = if size == 0 {
        free_region_end(handle, start_sector, type_flags)?
    } else {
        start_sector + size.div_ceil(sector_size) - 1
    };

    // Optimal alignment must not be weakened by cylinder alignment on
    // implementations that still honor it.
    if align == PartAlign::Optimal {
        handle.set_cylinder_alignment(false).map_err(|_| {
            fail_with_exception(
                ErrorKind::Fail,
                format!("Failed to disable cylinder alignment on device '{device}'"),
            )
        })?;
    }

    let added = handle
        .add_partition(type_flags, start_sector, end_sector)
        .map_err(|_| {
            fail_with_exception(
                ErrorKind::Fail,
                format!("Failed to add partition to device '{device}'"),
            )
        });

    if align == PartAlign::Optimal {
        let _ = handle.set_cylinder_alignment(true);
    }

    added
}

/// Two-phase commit: write the staged table to the device, then make the
/// kernel re-read it. Either phase failing is a failure naming that
/// phase; the kernel's view is authoritative for later operations, so an
/// OS-phase failure is not downgraded to a warning.
fn commit(handle: &mut dyn DiskHandle) -> Result<()> {
    let device = handle.device().to_string();
    handle.commit_to_dev().map_err(|_| {
        fail_with_exception(
            ErrorKind::Fail,
            format!("Failed to commit changes to the '{device}' device"),
        )
    })?;
    handle.commit_to_os().map_err(|_| {
        fail_with_exception(
            ErrorKind::Fail,
            format!("Failed to inform OS about changes on the '{device}' device"),
        )
    })
}

impl Backend for PartBackend {
    fn id(&self) -> BackendId {
        BackendId::Part
    }

    fn probe_dependencies(&self) -> Result<()> {
        self.io.probe()
    }

    fn initialize(&self) -> Result<()> {
        exception::set_exception_handler(Some(exception::capturing_handler()));
        Ok(())
    }

    fn shutdown(&self) {
        exception::set_exception_handler(None);
    }

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        PartTech::from_raw(tech)
            .map(|_| ())
            .ok_or_else(|| inval(format!("Invalid partition technology: {tech}")))
    }

    fn as_part(&self) -> Option<&dyn PartOps> {
        Some(self)
    }
}

impl PartOps for PartBackend {
    fn create_table(&self, disk: &str, ttype: TableType, ignore_existing: bool) -> Result<()> {
        exception::clear_slot();
        table_type_to_string(ttype)?;

        let mut handle = self.open(disk)?;
        if !ignore_existing && handle.table_type() != TableType::Undefined {
            return Err(Error::new(
                ErrorDomain::Part,
                ErrorKind::Exists,
                format!("Device '{disk}' already contains a partition table"),
            ));
        }

        handle.create_table(ttype).map_err(|_| {
            fail_with_exception(
                ErrorKind::Fail,
                format!("Failed to create a new partition table on device '{disk}'"),
            )
        })?;
        commit(handle.as_mut())
    }

    fn get_part_spec(&self, disk: &str, part: &str) -> Result<PartSpec> {
        exception::clear_slot();
        let num = partition_number(part)?;
        let handle = self.open(disk)?;
        let sector_size = handle.sector_size();

        handle
            .partitions()
            .iter()
            .find(|raw| raw.num == num)
            .map(|raw| spec_from_raw(raw, sector_size))
            .ok_or_else(|| {
                fail_with_exception(
                    ErrorKind::Fail,
                    format!("Failed to find the partition '{part}' on device '{disk}'"),
                )
            })
    }

    fn get_disk_parts(&self, disk: &str) -> Result<Vec<PartSpec>> {
        exception::clear_slot();
        let handle = self.open(disk)?;
        let sector_size = handle.sector_size();

        Ok(handle
            .partitions()
            .iter()
            .filter(|raw| is_real_partition(raw.type_flags))
            .map(|raw| spec_from_raw(raw, sector_size))
            .collect())
    }

    fn create_part(
        &self,
        disk: &str,
        type_req: PartTypeReq,
        start: u64,
        size: u64,
        align: PartAlign,
    ) -> Result<PartSpec> {
        exception::clear_slot();
        let mut handle = self.open(disk)?;
        let sector_size = handle.sector_size();

        let type_flags = match type_req {
            PartTypeReq::Normal => PartTypeFlags::empty(),
            PartTypeReq::Logical => PartTypeFlag::Logical.into(),
            PartTypeReq::Extended => PartTypeFlag::Extended.into(),
            PartTypeReq::Next => {
                let ext = extended_of(handle.as_ref());
                let inside_ext = ext.as_ref().is_some_and(|ext| {
                    start > ext.start_sector * sector_size
                        && start < (ext.end_sector() + 1) * sector_size
                });

                if inside_ext {
                    PartTypeFlag::Logical.into()
                } else {
                    let primaries = handle
                        .partitions()
                        .iter()
                        .filter(|part| !part.type_flags.contains(PartTypeFlag::Logical))
                        .count() as u32;
                    if primaries < handle.max_primaries() || ext.is_some() {
                        PartTypeFlags::empty()
                    } else {
                        // Out of primary slots with no container yet: carve
                        // an extended partition over the remainder, then
                        // place the new partition inside it as a logical.
                        place_partition(
                            handle.as_mut(),
                            PartTypeFlag::Extended.into(),
                            start,
                            0,
                            align,
                        )?;
                        PartTypeFlag::Logical.into()
                    }
                }
            }
        };

        let raw = place_partition(handle.as_mut(), type_flags, start, size, align)?;
        commit(handle.as_mut())?;
        Ok(spec_from_raw(&raw, sector_size))
    }

    fn delete_part(&self, disk: &str, part: &str) -> Result<()> {
        exception::clear_slot();
        let num = partition_number(part)?;
        let mut handle = self.open(disk)?;

        handle.delete_partition(num).map_err(|_| {
            fail_with_exception(
                ErrorKind::Fail,
                format!("Failed to delete the partition '{part}' on device '{disk}'"),
            )
        })?;
        commit(handle.as_mut())
    }

    fn set_part_flag(&self, disk: &str, part: &str, flag: PartFlag, state: bool) -> Result<()> {
        exception::clear_slot();
        let num = partition_number(part)?;
        let mut handle = self.open(disk)?;

        handle.set_flag(num, flag, state).map_err(|_| {
            fail_with_exception(
                ErrorKind::Fail,
                format!(
                    "Failed to set the '{}' flag on the partition '{part}'",
                    flag.as_str()
                ),
            )
        })?;
        commit(handle.as_mut())
    }

    fn set_part_flags(&self, disk: &str, part: &str, flags: PartFlags) -> Result<()> {
        exception::clear_slot();
        let num = partition_number(part)?;
        let mut handle = self.open(disk)?;

        // Overwrite every supported flag; bits the table cannot express
        // are dropped silently.
        for index in 1..=PartFlag::last_index() {
            let Some(flag) = PartFlag::from_index(index) else {
                continue;
            };
            if !handle.flag_available(num, flag) {
                continue;
            }
            handle.set_flag(num, flag, flags.contains(flag)).map_err(|_| {
                fail_with_exception(
                    ErrorKind::Fail,
                    format!(
                        "Failed to set the '{}' flag on the partition '{part}'",
                        flag.as_str()
                    ),
                )
            })?;
        }
        commit(handle.as_mut())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;

    use blockkit_sys::BlockTopology;
    use blockkit_types::partition::PartTypeFlag;

    use super::*;
    use crate::exception::TEST_HANDLER_LOCK;
    use crate::mem::MemTableIo;

    const MIB: u64 = 1024 * 1024;
    const DISK: &str = "/dev/mem0";

    /// 1 GiB disk with 512-byte sectors and an 1 MiB optimal grain.
    fn setup() -> (PartBackend, Arc<MemTableIo>, parking_lot::MutexGuard<'static, ()>) {
        let guard = TEST_HANDLER_LOCK.lock();
        let io = MemTableIo::new();
        io.add_disk_with_topology(
            DISK,
            512,
            2 * 1024 * 1024,
            BlockTopology {
                logical_sector_size: 512,
                minimum_io_size: 4096,
                optimal_io_size: MIB,
                alignment_offset: 0,
            },
        );
        let backend = PartBackend::new(io.clone() as Arc<dyn TableIo>);
        backend.initialize().expect("engine initializes");
        (backend, io, guard)
    }

    #[test]
    fn extracts_partition_numbers() {
        assert_eq!(partition_number("/dev/sda3").unwrap(), 3);
        assert_eq!(partition_number("/dev/sda10").unwrap(), 10);
        assert_eq!(partition_number("/dev/nvme0n1p3").unwrap(), 3);
        assert_eq!(partition_number("/dev/mmcblk0p12").unwrap(), 12);

        assert_eq!(
            partition_number("/dev/sda0").unwrap_err().kind,
            ErrorKind::Inval
        );
        assert_eq!(
            partition_number("/dev/sda").unwrap_err().kind,
            ErrorKind::Inval
        );
        assert_eq!(
            partition_number("/dev/sda-3").unwrap_err().kind,
            ErrorKind::Inval
        );
    }

    #[test]
    fn pure_lookups_reject_out_of_range() {
        assert_eq!(table_type_to_string(TableType::Mbr).unwrap(), "msdos");
        assert_eq!(table_type_to_string(TableType::Gpt).unwrap(), "gpt");
        assert_eq!(
            table_type_to_string(TableType::Undefined).unwrap_err().kind,
            ErrorKind::Inval
        );

        assert_eq!(part_type_to_string(PartTypeFlags::empty()).unwrap(), "normal");
        assert_eq!(
            part_type_to_string(PartTypeFlag::Logical.into()).unwrap(),
            "logical"
        );
        assert_eq!(
            part_type_to_string(PartTypeFlag::Logical | PartTypeFlag::Extended)
                .unwrap_err()
                .kind,
            ErrorKind::Inval
        );

        assert_eq!(flag_to_string(PartFlag::Boot), "boot");
        assert_eq!(flag_to_string(PartFlag::Esp), "esp");
    }

    #[test]
    fn creates_table_and_is_idempotent_with_overwrite() {
        let (backend, io, _guard) = setup();

        backend
            .create_table(DISK, TableType::Gpt, false)
            .expect("fresh table");
        assert_eq!(io.table_type(DISK), Some(TableType::Gpt));

        // overwriting twice leaves a valid empty table and must not error
        backend
            .create_table(DISK, TableType::Gpt, true)
            .expect("first overwrite");
        backend
            .create_table(DISK, TableType::Gpt, true)
            .expect("second overwrite");
        assert_eq!(io.table_type(DISK), Some(TableType::Gpt));
        assert!(io.partitions(DISK).is_empty());
    }

    #[test]
    fn refuses_to_overwrite_existing_table() {
        let (backend, io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Gpt, false)
            .expect("seed GPT");
        backend
            .create_part(DISK, PartTypeReq::Normal, MIB, 8 * MIB, PartAlign::Optimal)
            .expect("seed partition");

        let err = backend
            .create_table(DISK, TableType::Mbr, false)
            .expect_err("table exists");
        assert_eq!(err.kind, ErrorKind::Exists);

        // the original table is intact
        assert_eq!(io.table_type(DISK), Some(TableType::Gpt));
        assert_eq!(io.partitions(DISK).len(), 1);
    }

    #[test]
    fn created_partition_is_aligned_and_at_least_at_requested_start() {
        let (backend, _io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Gpt, false)
            .expect("fresh table");

        let requested = 3 * MIB + 12_345;
        let spec = backend
            .create_part(DISK, PartTypeReq::Normal, requested, 8 * MIB, PartAlign::Optimal)
            .expect("partition created");

        assert!(spec.start >= requested);
        assert_eq!(spec.start % 512, 0);
        assert_eq!(spec.start % MIB, 0);
        assert!(spec.size >= 8 * MIB);
    }

    #[test]
    fn zero_size_takes_the_rest_of_the_disk() {
        let (backend, _io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Gpt, false)
            .expect("fresh table");

        let spec = backend
            .create_part(DISK, PartTypeReq::Normal, MIB, 0, PartAlign::Optimal)
            .expect("partition created");

        // 1 GiB disk, GPT keeps 34 sectors at the tail
        let last_usable_byte = (2 * 1024 * 1024 - 1 - 34) * 512;
        assert_eq!(spec.start, MIB);
        assert_eq!(spec.start + spec.size - 512, last_usable_byte);
    }

    #[test]
    fn auto_type_inside_extended_creates_clamped_logical() {
        let (backend, _io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Mbr, false)
            .expect("fresh table");

        for start in [1, 101, 201] {
            backend
                .create_part(
                    DISK,
                    PartTypeReq::Normal,
                    start * MIB,
                    50 * MIB,
                    PartAlign::Optimal,
                )
                .expect("primary created");
        }
        let ext_start = 301 * MIB;
        let ext = backend
            .create_part(DISK, PartTypeReq::Extended, ext_start, 0, PartAlign::Optimal)
            .expect("extended created");
        assert!(ext.type_flags.contains(PartTypeFlag::Extended));

        let spec = backend
            .create_part(
                DISK,
                PartTypeReq::Next,
                ext_start + 512,
                50 * MIB,
                PartAlign::Optimal,
            )
            .expect("logical created");

        assert!(spec.type_flags.contains(PartTypeFlag::Logical));
        assert!(spec.start >= ext.start + MIB);
        assert_eq!(spec.start % 512, 0);
    }

    #[test]
    fn logical_keeps_clearance_past_predecessor() {
        let (backend, _io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Mbr, false)
            .expect("fresh table");
        backend
            .create_part(DISK, PartTypeReq::Extended, 10 * MIB, 0, PartAlign::Optimal)
            .expect("extended created");
        let first = backend
            .create_part(DISK, PartTypeReq::Logical, 11 * MIB, 50 * MIB, PartAlign::Optimal)
            .expect("first logical");
        let first_end = first.start + first.size;

        let second = backend
            .create_part(
                DISK,
                PartTypeReq::Logical,
                first_end + 512,
                50 * MIB,
                PartAlign::Optimal,
            )
            .expect("second logical");
        assert!(second.start >= first_end + MIB);
        assert_eq!(second.start % 512, 0);
    }

    #[test]
    fn auto_type_on_open_table_picks_normal() {
        let (backend, _io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Mbr, false)
            .expect("fresh table");

        let spec = backend
            .create_part(DISK, PartTypeReq::Next, MIB, 50 * MIB, PartAlign::Optimal)
            .expect("partition created");
        assert!(spec.type_flags.is_empty());
    }

    #[test]
    fn flag_bit_is_encoded_as_shifted_index() {
        let (backend, _io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Mbr, false)
            .expect("fresh table");
        let part = backend
            .create_part(DISK, PartTypeReq::Normal, MIB, 50 * MIB, PartAlign::Optimal)
            .expect("partition created");

        backend
            .set_part_flag(DISK, &part.path, PartFlag::Boot, true)
            .expect("boot flag set");

        let spec = backend.get_part_spec(DISK, &part.path).expect("spec");
        assert_eq!(PartFlag::Boot as u32, 1 << 1);
        assert!(spec.flags.contains(PartFlag::Boot));
        assert!(!spec.flags.contains(PartFlag::Root));
        assert!(spec.bootable);

        backend
            .set_part_flag(DISK, &part.path, PartFlag::Boot, false)
            .expect("boot flag cleared");
        let spec = backend.get_part_spec(DISK, &part.path).expect("spec");
        assert!(!spec.flags.contains(PartFlag::Boot));
    }

    #[test]
    fn set_part_flags_overwrites_supported_subset() {
        let (backend, _io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Gpt, false)
            .expect("fresh table");
        let part = backend
            .create_part(DISK, PartTypeReq::Normal, MIB, 50 * MIB, PartAlign::Optimal)
            .expect("partition created");

        backend
            .set_part_flag(DISK, &part.path, PartFlag::Esp, true)
            .expect("seed esp flag");

        // Lba is not expressible on GPT and must be dropped silently;
        // Esp is not in the mask and must be cleared.
        backend
            .set_part_flags(DISK, &part.path, PartFlag::Hidden | PartFlag::Lba)
            .expect("flags overwritten");

        let spec = backend.get_part_spec(DISK, &part.path).expect("spec");
        assert_eq!(spec.flags, PartFlags::from(PartFlag::Hidden));
    }

    #[test]
    fn os_phase_failure_names_the_phase() {
        let (backend, io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Gpt, false)
            .expect("fresh table");

        io.fail_commit_os(DISK, true);
        let err = backend
            .create_part(DISK, PartTypeReq::Normal, MIB, 50 * MIB, PartAlign::Optimal)
            .expect_err("busy device");

        assert_eq!(err.kind, ErrorKind::Fail);
        assert!(
            err.message
                .contains(&format!("Failed to inform OS about changes on the '{DISK}' device")),
            "unexpected message: {}",
            err.message
        );
        assert!(err.message.contains("busy"));
    }

    #[test]
    fn dev_phase_failure_names_the_phase() {
        let (backend, io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Gpt, false)
            .expect("fresh table");

        io.fail_commit_dev(DISK, true);
        let err = backend
            .create_part(DISK, PartTypeReq::Normal, MIB, 50 * MIB, PartAlign::Optimal)
            .expect_err("io error");
        assert!(
            err.message
                .contains(&format!("Failed to commit changes to the '{DISK}' device")),
            "unexpected message: {}",
            err.message
        );
    }

    #[test]
    fn delete_partition_round_trips() {
        let (backend, io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Gpt, false)
            .expect("fresh table");
        let part = backend
            .create_part(DISK, PartTypeReq::Normal, MIB, 50 * MIB, PartAlign::Optimal)
            .expect("partition created");

        backend
            .delete_part(DISK, &part.path)
            .expect("partition deleted");
        assert!(io.partitions(DISK).is_empty());

        let err = backend
            .delete_part(DISK, &part.path)
            .expect_err("already gone");
        assert_eq!(err.kind, ErrorKind::Fail);
        assert!(err.message.contains("does not exist"));
    }

    #[test]
    fn listed_partitions_are_ordered_and_complete() {
        let (backend, _io, _guard) = setup();
        backend
            .create_table(DISK, TableType::Gpt, false)
            .expect("fresh table");
        backend
            .create_part(DISK, PartTypeReq::Normal, 200 * MIB, 50 * MIB, PartAlign::Optimal)
            .expect("second partition");
        backend
            .create_part(DISK, PartTypeReq::Normal, MIB, 50 * MIB, PartAlign::Optimal)
            .expect("first partition");

        let parts = backend.get_disk_parts(DISK).expect("listing");
        assert_eq!(parts.len(), 2);
        assert!(parts[0].start < parts[1].start);
    }

    proptest! {
        #[test]
        fn extracted_number_matches_suffix(
            prefix in "/dev/[a-z]{2,8}",
            number in 1u32..100_000,
        ) {
            let path = format!("{prefix}{number}");
            prop_assert_eq!(partition_number(&path).unwrap(), number);
        }

        #[test]
        fn created_start_is_sector_aligned_and_not_before_request(
            start in 1u64..800 * MIB,
            size in 1u64..64 * MIB,
        ) {
            let (backend, _io, _guard) = setup();
            backend.create_table(DISK, TableType::Gpt, false).unwrap();

            if let Ok(spec) =
                backend.create_part(DISK, PartTypeReq::Normal, start, size, PartAlign::Optimal)
            {
                prop_assert!(spec.start >= start);
                prop_assert_eq!(spec.start % 512, 0);
            }
        }
    }
}
