// SPDX-License-Identifier: GPL-3.0-only

//! Partition-table value model
//!
//! Table types, partition type and flag bitsets, and the partition spec
//! returned by the partition engine. Flag bit positions follow the
//! underlying library's flag indices: flag index `k` is represented as the
//! bit value `1 << k`, so flags compose with `|` while staying convertible
//! back to the index with a `trailing_zeros` lookup.

use enumflags2::{BitFlags, bitflags};
use serde::{Deserialize, Serialize};

/// Partition table type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableType {
    Mbr,
    Gpt,
    #[default]
    Undefined,
}

impl TableType {
    /// String form understood by the underlying table tooling.
    pub fn as_str(self) -> Option<&'static str> {
        match self {
            TableType::Mbr => Some("msdos"),
            TableType::Gpt => Some("gpt"),
            TableType::Undefined => None,
        }
    }

    pub fn parse(s: &str) -> TableType {
        match s {
            "msdos" | "dos" | "mbr" => TableType::Mbr,
            "gpt" => TableType::Gpt,
            _ => TableType::Undefined,
        }
    }
}

/// Requested partition type for `create_partition`.
///
/// `Next` asks the engine to choose based on the current table contents
/// (primary slot budget, presence of an extended partition, requested
/// start offset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartTypeReq {
    Normal,
    Logical,
    Extended,
    Next,
}

/// Alignment constraint applied when placing a new partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartAlign {
    /// Exact geometry, no rounding beyond whole sectors.
    None,
    /// Align to the device's minimum I/O grain.
    Minimal,
    /// Align to the device's optimal I/O grain.
    Optimal,
}

/// Structural kind of an on-disk table entry.
///
/// A plain (primary) partition carries no bits at all; the pseudo-entries
/// the underlying library reports (free space, metadata, protected) carry
/// the corresponding bit and are filtered out of partition listings.
#[bitflags]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartTypeFlag {
    Logical = 0x01,
    Extended = 0x02,
    FreeSpace = 0x04,
    Metadata = 0x08,
    Protected = 0x10,
}

pub type PartTypeFlags = BitFlags<PartTypeFlag>;

impl PartTypeFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            PartTypeFlag::Logical => "logical",
            PartTypeFlag::Extended => "extended",
            PartTypeFlag::FreeSpace => "free space",
            PartTypeFlag::Metadata => "metadata",
            PartTypeFlag::Protected => "protected",
        }
    }
}

/// True for entries that are actual partitions (normal, logical or
/// extended), false for free-space/metadata/protected pseudo-entries.
pub fn is_real_partition(ty: PartTypeFlags) -> bool {
    !ty.intersects(PartTypeFlag::FreeSpace | PartTypeFlag::Metadata | PartTypeFlag::Protected)
}

/// Partition flags.
///
/// Bit `k` corresponds to the underlying library's flag index `k`; index 0
/// is unused there, so the first flag sits at `1 << 1`.
#[bitflags]
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartFlag {
    Boot = 1 << 1,
    Root = 1 << 2,
    Swap = 1 << 3,
    Hidden = 1 << 4,
    Raid = 1 << 5,
    Lvm = 1 << 6,
    Lba = 1 << 7,
    HpService = 1 << 8,
    Palo = 1 << 9,
    Prep = 1 << 10,
    MsftReserved = 1 << 11,
    BiosGrub = 1 << 12,
    AppleTvRecovery = 1 << 13,
    Diag = 1 << 14,
    LegacyBoot = 1 << 15,
    MsftData = 1 << 16,
    Irst = 1 << 17,
    Esp = 1 << 18,
}

pub type PartFlags = BitFlags<PartFlag>;

impl PartFlag {
    /// Index of this flag in the underlying library (log2 of the bit).
    pub fn index(self) -> u32 {
        (self as u32).trailing_zeros()
    }

    /// Flag for an underlying library index, if one is defined there.
    pub fn from_index(index: u32) -> Option<PartFlag> {
        if index == 0 || index > Self::last_index() {
            return None;
        }
        BitFlags::<PartFlag>::from_bits(1 << index)
            .ok()
            .and_then(|flags| flags.exactly_one())
    }

    /// Highest defined flag index; `set_part_flags` walks 1..=this.
    pub fn last_index() -> u32 {
        PartFlag::Esp.index()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PartFlag::Boot => "boot",
            PartFlag::Root => "root",
            PartFlag::Swap => "swap",
            PartFlag::Hidden => "hidden",
            PartFlag::Raid => "raid",
            PartFlag::Lvm => "lvm",
            PartFlag::Lba => "lba",
            PartFlag::HpService => "hp-service",
            PartFlag::Palo => "palo",
            PartFlag::Prep => "prep",
            PartFlag::MsftReserved => "msftres",
            PartFlag::BiosGrub => "bios_grub",
            PartFlag::AppleTvRecovery => "atvrecv",
            PartFlag::Diag => "diag",
            PartFlag::LegacyBoot => "legacy_boot",
            PartFlag::MsftData => "msftdata",
            PartFlag::Irst => "irst",
            PartFlag::Esp => "esp",
        }
    }
}

/// Detailed information about a single partition.
///
/// Start and size are in bytes regardless of the device's sector size; the
/// engine converts to and from sector units internally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSpec {
    /// Device path of the partition (e.g. "/dev/sda1")
    pub path: String,

    /// Partition name (GPT only, empty for MBR)
    pub name: Option<String>,

    /// Partition UUID (GPT only)
    pub uuid: Option<String>,

    /// Partition id (MBR type byte as hex, e.g. "0x83")
    pub id: Option<String>,

    /// Partition type GUID (GPT only)
    pub type_guid: Option<String>,

    /// Structural kind of the entry
    pub type_flags: PartTypeFlags,

    /// Offset from the start of the disk, in bytes
    pub start: u64,

    /// Size in bytes
    pub size: u64,

    /// Whether the bootable flag is set (MBR) or the boot flag bit (GPT)
    pub bootable: bool,

    /// Raw GPT attribute bits
    pub attrs: u64,

    /// Partition flags
    pub flags: PartFlags,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_type_strings_match_tooling() {
        assert_eq!(TableType::Mbr.as_str(), Some("msdos"));
        assert_eq!(TableType::Gpt.as_str(), Some("gpt"));
        assert_eq!(TableType::Undefined.as_str(), None);
        assert_eq!(TableType::parse("msdos"), TableType::Mbr);
        assert_eq!(TableType::parse("dos"), TableType::Mbr);
        assert_eq!(TableType::parse("gpt"), TableType::Gpt);
        assert_eq!(TableType::parse("sun"), TableType::Undefined);
    }

    #[test]
    fn flag_bits_encode_underlying_index() {
        assert_eq!(PartFlag::Boot as u32, 1 << 1);
        assert_eq!(PartFlag::Boot.index(), 1);
        assert_eq!(PartFlag::Esp.index(), 18);
        for index in 1..=PartFlag::last_index() {
            let flag = PartFlag::from_index(index).expect("defined flag index");
            assert_eq!(flag.index(), index);
        }
        assert_eq!(PartFlag::from_index(0), None);
        assert_eq!(PartFlag::from_index(PartFlag::last_index() + 1), None);
    }

    #[test]
    fn part_spec_round_trips_through_json() {
        let spec = PartSpec {
            path: "/dev/sda1".to_string(),
            name: Some("esp".to_string()),
            type_flags: PartTypeFlags::empty(),
            start: 1024 * 1024,
            size: 512 * 1024 * 1024,
            bootable: true,
            flags: PartFlag::Boot | PartFlag::Esp,
            ..PartSpec::default()
        };

        let json = serde_json::to_string(&spec).expect("serialize spec");
        let parsed: PartSpec = serde_json::from_str(&json).expect("deserialize spec");
        assert_eq!(parsed, spec);
    }

    #[test]
    fn pseudo_entries_are_not_real_partitions() {
        assert!(is_real_partition(PartTypeFlags::empty()));
        assert!(is_real_partition(PartTypeFlag::Logical.into()));
        assert!(is_real_partition(PartTypeFlag::Extended.into()));
        assert!(!is_real_partition(PartTypeFlag::FreeSpace.into()));
        assert!(!is_real_partition(
            PartTypeFlag::Logical | PartTypeFlag::Metadata
        ));
        assert!(!is_real_partition(PartTypeFlag::Protected.into()));
    }
}
