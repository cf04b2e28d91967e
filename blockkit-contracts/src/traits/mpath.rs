// SPDX-License-Identifier: GPL-3.0-only

use crate::Result;

/// Technologies of the multipath backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MpathTech {
    Base = 0,
    FriendlyNames = 1,
}

impl MpathTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(MpathTech::Base),
            1 => Some(MpathTech::FriendlyNames),
            _ => None,
        }
    }
}

/// Multipath operations (multipath, mpathconf).
pub trait MpathOps: Send + Sync {
    /// Flush all unused multipath maps.
    fn flush_mpaths(&self) -> Result<()>;

    fn is_mpath_member(&self, device: &str) -> Result<bool>;

    fn set_friendly_names(&self, enabled: bool) -> Result<()>;
}
