// SPDX-License-Identifier: GPL-3.0-only

use crate::backend::ExtraArg;
use crate::Result;

/// Technologies of the s390 backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum S390Tech {
    Dasd = 0,
}

impl S390Tech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(S390Tech::Dasd),
            _ => None,
        }
    }
}

/// s390 DASD operations (dasdfmt, chccwdev).
pub trait S390Ops: Send + Sync {
    fn dasd_format(&self, device: &str, extra: &[ExtraArg]) -> Result<()>;

    fn set_dasd_online(&self, device: &str, online: bool) -> Result<()>;

    /// ccw device id ("0.0.0200") for a DASD block device, from sysfs.
    fn device_id(&self, device: &str) -> Result<String>;
}
