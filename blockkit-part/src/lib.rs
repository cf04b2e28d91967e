// SPDX-License-Identifier: GPL-3.0-only

//! Partition-table engine
//!
//! Creates and edits MBR and GPT partition tables. The engine owns the
//! placement arithmetic (alignment grains, extended/logical bookkeeping,
//! auto-type selection) and the two-phase commit to the device and the
//! kernel; the actual table encoding is behind the [`io::TableIo`]
//! boundary, implemented by [`sfdisk::SfdiskIo`] for real devices and by
//! [`mem::MemTableIo`] in the test suites.
//!
//! The boundary reports anomalies through a process-global exception
//! callback. The engine installs a handler that captures the message in a
//! thread-local slot, so concurrent operations on different devices keep
//! their diagnostics apart; every failed operation drains its own slot
//! into the parenthesized suffix of its error message.

pub mod engine;
pub mod exception;
pub mod io;
pub mod mem;
pub mod sfdisk;

pub use engine::{
    PartBackend, flag_to_string, part_type_to_string, partition_number, table_type_to_string,
};
pub use io::{DiskHandle, IoFailure, IoResult, RawPart, TableIo};
