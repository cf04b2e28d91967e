// SPDX-License-Identifier: GPL-3.0-only

//! Partition façade
//!
//! Trampolines into the PART backend plus the pure lookup helpers, which
//! need no backend state.

use blockkit_contracts::traits::{PartOps, PartTech};
use blockkit_contracts::{Error, Result, TechModes};
use blockkit_types::{
    BackendId, PartAlign, PartFlag, PartFlags, PartSpec, PartTypeReq, TableType,
};

pub use blockkit_contracts::traits::PartTech as Tech;
pub use blockkit_part::{flag_to_string, part_type_to_string, table_type_to_string};

fn ops<T>(call: impl FnOnce(&dyn PartOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Part, |backend| {
        let part = backend
            .as_part()
            .ok_or_else(|| Error::not_available(BackendId::Part))?;
        call(part)
    })
}

/// Write a fresh partition table of `ttype` on `disk`.
pub fn create_table(disk: &str, ttype: TableType, ignore_existing: bool) -> Result<()> {
    ops(|part| part.create_table(disk, ttype, ignore_existing))
}

/// Spec of the partition at `part` (e.g. "/dev/sda1").
pub fn get_part_spec(disk: &str, part: &str) -> Result<PartSpec> {
    ops(|ops| ops.get_part_spec(disk, part))
}

/// All real partitions on `disk`.
pub fn get_disk_parts(disk: &str) -> Result<Vec<PartSpec>> {
    ops(|ops| ops.get_disk_parts(disk))
}

/// Create a partition; `size = 0` takes the maximum the alignment
/// constraint permits.
pub fn create_part(
    disk: &str,
    type_req: PartTypeReq,
    start: u64,
    size: u64,
    align: PartAlign,
) -> Result<PartSpec> {
    ops(|ops| ops.create_part(disk, type_req, start, size, align))
}

pub fn delete_part(disk: &str, part: &str) -> Result<()> {
    ops(|ops| ops.delete_part(disk, part))
}

pub fn set_part_flag(disk: &str, part: &str, flag: PartFlag, state: bool) -> Result<()> {
    ops(|ops| ops.set_part_flag(disk, part, flag, state))
}

/// Overwrite all supported flags from `flags` at once.
pub fn set_part_flags(disk: &str, part: &str, flags: PartFlags) -> Result<()> {
    ops(|ops| ops.set_part_flags(disk, part, flags))
}

/// Pre-flight capability check for a partition technology.
pub fn is_tech_available(tech: PartTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Part, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
