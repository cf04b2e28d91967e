// SPDX-License-Identifier: GPL-3.0-only

//! Table-I/O boundary
//!
//! The engine consumes partition tables through these traits only. An
//! implementation stages edits in memory and applies them during the two
//! commit phases; anomaly detail is reported through
//! [`crate::exception::raise`] before the failing call returns, so the
//! result type itself stays a bare marker.

use blockkit_sys::BlockTopology;
use blockkit_types::{PartFlag, PartFlags, PartTypeFlags, TableType};

/// Failure marker of the I/O layer. Diagnostics travel through the
/// exception callback, not through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoFailure;

pub type IoResult<T> = std::result::Result<T, IoFailure>;

/// One table entry as the I/O layer sees it. Offsets are sectors; the
/// engine converts to bytes at its own boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPart {
    /// Partition number (1-based; ≥ 5 means logical on MBR)
    pub num: u32,

    /// Device node path of the partition
    pub node: String,

    pub start_sector: u64,
    pub size_sectors: u64,

    /// Structural kind (empty = primary)
    pub type_flags: PartTypeFlags,

    /// GPT partition name
    pub name: Option<String>,

    /// GPT partition UUID
    pub uuid: Option<String>,

    /// GPT type GUID
    pub type_guid: Option<String>,

    /// MBR type byte, "0x83" form
    pub id: Option<String>,

    pub bootable: bool,

    /// Raw GPT attribute bits
    pub attrs: u64,

    pub flags: PartFlags,
}

impl RawPart {
    pub fn end_sector(&self) -> u64 {
        self.start_sector + self.size_sectors.saturating_sub(1)
    }
}

/// An open device plus its parsed table. Obtained per operation and
/// dropped on every exit path; implementations must not cache state
/// across opens.
pub trait DiskHandle {
    fn device(&self) -> &str;

    fn sector_size(&self) -> u64;

    /// Total device length in sectors.
    fn length_sectors(&self) -> u64;

    /// Last sector a partition may occupy (GPT reserves a backup-header
    /// area at the tail).
    fn last_usable_sector(&self) -> u64;

    fn topology(&self) -> BlockTopology;

    /// Type of the table currently on the device, `Undefined` when no
    /// recognizable table exists.
    fn table_type(&self) -> TableType;

    /// Primary slot budget (4 on MBR, 128 on GPT).
    fn max_primaries(&self) -> u32;

    /// All entries of the current table, ordered by start sector.
    fn partitions(&self) -> &[RawPart];

    /// Stage a fresh, empty table of `ttype`, discarding all entries.
    fn create_table(&mut self, ttype: TableType) -> IoResult<()>;

    /// Stage a new partition over `[start_sector, end_sector]`. Returns
    /// the staged entry with its assigned number and node path.
    fn add_partition(
        &mut self,
        type_flags: PartTypeFlags,
        start_sector: u64,
        end_sector: u64,
    ) -> IoResult<RawPart>;

    fn delete_partition(&mut self, num: u32) -> IoResult<()>;

    /// Whether the current table type supports `flag` at all.
    fn flag_available(&self, num: u32, flag: PartFlag) -> bool;

    fn set_flag(&mut self, num: u32, flag: PartFlag, state: bool) -> IoResult<()>;

    /// Cylinder alignment toggle; only meaningful for MBR disks on
    /// implementations that cylinder-align. Others accept and ignore it.
    fn set_cylinder_alignment(&mut self, _enabled: bool) -> IoResult<()> {
        Ok(())
    }

    /// Phase one: write the staged table to the device.
    fn commit_to_dev(&mut self) -> IoResult<()>;

    /// Phase two: make the kernel re-read the on-disk table.
    fn commit_to_os(&mut self) -> IoResult<()>;
}

/// Factory opening devices for the engine.
pub trait TableIo: Send + Sync {
    fn open(&self, device: &str) -> IoResult<Box<dyn DiskHandle>>;

    /// Check the external dependencies of this implementation. The
    /// in-memory implementation has none.
    fn probe(&self) -> blockkit_contracts::Result<()> {
        Ok(())
    }
}
