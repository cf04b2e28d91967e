// SPDX-License-Identifier: GPL-3.0-only

use crate::backend::ExtraArg;
use crate::Result;

/// Technologies of the swap backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SwapTech {
    Swap = 0,
}

impl SwapTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(SwapTech::Swap),
            _ => None,
        }
    }
}

/// Swap space operations (mkswap, swapon, swapoff).
pub trait SwapOps: Send + Sync {
    fn mkswap(&self, device: &str, label: Option<&str>, extra: &[ExtraArg]) -> Result<()>;

    fn swapon(&self, device: &str, priority: Option<i32>) -> Result<()>;

    fn swapoff(&self, device: &str) -> Result<()>;

    /// Whether `device` is an active swap area per `/proc/swaps`.
    fn swap_status(&self, device: &str) -> Result<bool>;
}
