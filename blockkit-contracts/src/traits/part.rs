// SPDX-License-Identifier: GPL-3.0-only

use blockkit_types::{PartAlign, PartFlag, PartFlags, PartSpec, PartTypeReq, TableType};

use crate::Result;

/// Technologies of the partition backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PartTech {
    Mbr = 0,
    Gpt = 1,
}

impl PartTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(PartTech::Mbr),
            1 => Some(PartTech::Gpt),
            _ => None,
        }
    }
}

/// Partition-table editing operations.
///
/// Every mutating operation commits in two phases (on-disk table, then
/// kernel re-read) before returning; a failure names the phase that broke.
/// Start offsets and sizes are bytes.
pub trait PartOps: Send + Sync {
    /// Write a fresh partition table. With `ignore_existing = false` a
    /// device that already carries a recognizable table fails `Exists`
    /// without modification.
    fn create_table(&self, disk: &str, ttype: TableType, ignore_existing: bool) -> Result<()>;

    /// Spec of one partition. The partition number is extracted from the
    /// trailing digits of `part` ("/dev/sda3" → 3, "/dev/nvme0n1p3" → 3).
    fn get_part_spec(&self, disk: &str, part: &str) -> Result<PartSpec>;

    /// All real partitions on the disk, in on-disk order. Free-space,
    /// metadata and protected pseudo-entries are excluded.
    fn get_disk_parts(&self, disk: &str) -> Result<Vec<PartSpec>>;

    /// Create a partition. `size = 0` takes the maximum the alignment
    /// constraint permits; the spec returned reflects the actual placement,
    /// which may differ from the request.
    fn create_part(
        &self,
        disk: &str,
        type_req: PartTypeReq,
        start: u64,
        size: u64,
        align: PartAlign,
    ) -> Result<PartSpec>;

    fn delete_part(&self, disk: &str, part: &str) -> Result<()>;

    /// Set or clear one flag.
    fn set_part_flag(&self, disk: &str, part: &str, flag: PartFlag, state: bool) -> Result<()>;

    /// Overwrite all flags at once: every flag the table supports is set
    /// iff its bit is present in `flags`; unsupported bits are ignored.
    fn set_part_flags(&self, disk: &str, part: &str, flags: PartFlags) -> Result<()>;
}
