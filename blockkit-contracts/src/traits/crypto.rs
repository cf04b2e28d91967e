// SPDX-License-Identifier: GPL-3.0-only

use crate::backend::ExtraArg;
use crate::Result;

/// Technologies of the crypto backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CryptoTech {
    Luks = 0,
    Luks2 = 1,
}

impl CryptoTech {
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(CryptoTech::Luks),
            1 => Some(CryptoTech::Luks2),
            _ => None,
        }
    }
}

/// LUKS volume operations (cryptsetup).
pub trait CryptoOps: Send + Sync {
    /// Format `device` as a LUKS volume.
    ///
    /// With `min_entropy > 0` the call blocks until the kernel entropy
    /// pool reports at least that many bits; this can block indefinitely
    /// on an entropy-starved system.
    fn luks_format(
        &self,
        device: &str,
        cipher: Option<&str>,
        key_size: u32,
        passphrase: &str,
        min_entropy: u32,
        extra: &[ExtraArg],
    ) -> Result<()>;

    /// Open a LUKS volume as `/dev/mapper/<name>`.
    fn luks_open(&self, device: &str, name: &str, passphrase: &str, read_only: bool) -> Result<()>;

    fn luks_close(&self, name: &str) -> Result<()>;

    fn luks_add_key(&self, device: &str, passphrase: &str, new_passphrase: &str) -> Result<()>;

    fn luks_remove_key(&self, device: &str, passphrase: &str) -> Result<()>;

    /// Resize an open volume. `size = 0` fills the underlying device.
    fn luks_resize(&self, name: &str, size: u64) -> Result<()>;

    fn is_luks(&self, device: &str) -> Result<bool>;
}
