// SPDX-License-Identifier: GPL-3.0-only

use blockkit_types::SmartInfo;

use crate::backend::ExtraArg;
use crate::Result;

/// Technologies of the S.M.A.R.T. backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SmartTech {
    Ata = 0,
}

impl SmartTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(SmartTech::Ata),
            _ => None,
        }
    }
}

/// S.M.A.R.T. operations (smartctl).
pub trait SmartOps: Send + Sync {
    /// Health summary and attribute table for a device.
    fn info(&self, device: &str, extra: &[ExtraArg]) -> Result<SmartInfo>;

    fn set_enabled(&self, device: &str, enabled: bool) -> Result<()>;

    /// Start a self-test; `extended` selects the long test.
    fn self_test(&self, device: &str, extended: bool) -> Result<()>;
}
