// SPDX-License-Identifier: GPL-3.0-only

//! Loop device façade

use blockkit_contracts::traits::{LoopOps, LoopTech};
use blockkit_contracts::{Error, Result, TechModes};
use blockkit_types::BackendId;

pub use blockkit_contracts::traits::LoopTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn LoopOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Loop, |backend| {
        let loopdev = backend
            .as_loop()
            .ok_or_else(|| Error::not_available(BackendId::Loop))?;
        call(loopdev)
    })
}

/// Attach `file` to a free loop device; returns the device name
/// ("loop0").
pub fn setup(
    file: &str,
    offset: u64,
    size: u64,
    read_only: bool,
    part_scan: bool,
) -> Result<String> {
    ops(|loopdev| loopdev.setup(file, offset, size, read_only, part_scan))
}

pub fn teardown(device: &str) -> Result<()> {
    ops(|loopdev| loopdev.teardown(device))
}

pub fn get_backing_file(device: &str) -> Result<Option<String>> {
    ops(|loopdev| loopdev.get_backing_file(device))
}

pub fn get_loop_name(file: &str) -> Result<Option<String>> {
    ops(|loopdev| loopdev.get_loop_name(file))
}

pub fn is_tech_available(tech: LoopTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Loop, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
