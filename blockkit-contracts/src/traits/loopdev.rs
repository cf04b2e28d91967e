// SPDX-License-Identifier: GPL-3.0-only

use crate::Result;

/// Technologies of the loop backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LoopTech {
    Loop = 0,
}

impl LoopTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(LoopTech::Loop),
            _ => None,
        }
    }
}

/// Loop device operations (losetup).
pub trait LoopOps: Send + Sync {
    /// Attach `file` to a free loop device, returning the device name
    /// ("loop0"). `size = 0` uses the whole file past `offset`.
    fn setup(
        &self,
        file: &str,
        offset: u64,
        size: u64,
        read_only: bool,
        part_scan: bool,
    ) -> Result<String>;

    fn teardown(&self, device: &str) -> Result<()>;

    /// Backing file of a loop device, `None` if the device is unbound.
    fn get_backing_file(&self, device: &str) -> Result<Option<String>>;

    /// Loop device currently backed by `file`, if any.
    fn get_loop_name(&self, file: &str) -> Result<Option<String>>;
}
