// SPDX-License-Identifier: GPL-3.0-only

//! LUKS façade

use blockkit_contracts::traits::{CryptoOps, CryptoTech};
use blockkit_contracts::{Error, ExtraArg, Result, TechModes};
use blockkit_types::BackendId;

pub use blockkit_contracts::traits::CryptoTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn CryptoOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Crypto, |backend| {
        let crypto = backend
            .as_crypto()
            .ok_or_else(|| Error::not_available(BackendId::Crypto))?;
        call(crypto)
    })
}

/// Format `device` as LUKS. With `min_entropy > 0` the call blocks until
/// the kernel entropy pool reaches that many bits, possibly indefinitely.
pub fn luks_format(
    device: &str,
    cipher: Option<&str>,
    key_size: u32,
    passphrase: &str,
    min_entropy: u32,
    extra: &[ExtraArg],
) -> Result<()> {
    ops(|crypto| crypto.luks_format(device, cipher, key_size, passphrase, min_entropy, extra))
}

pub fn luks_open(device: &str, name: &str, passphrase: &str, read_only: bool) -> Result<()> {
    ops(|crypto| crypto.luks_open(device, name, passphrase, read_only))
}

pub fn luks_close(name: &str) -> Result<()> {
    ops(|crypto| crypto.luks_close(name))
}

pub fn luks_add_key(device: &str, passphrase: &str, new_passphrase: &str) -> Result<()> {
    ops(|crypto| crypto.luks_add_key(device, passphrase, new_passphrase))
}

pub fn luks_remove_key(device: &str, passphrase: &str) -> Result<()> {
    ops(|crypto| crypto.luks_remove_key(device, passphrase))
}

pub fn luks_resize(name: &str, size: u64) -> Result<()> {
    ops(|crypto| crypto.luks_resize(name, size))
}

pub fn is_luks(device: &str) -> Result<bool> {
    ops(|crypto| crypto.is_luks(device))
}

pub fn is_tech_available(tech: CryptoTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Crypto, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
