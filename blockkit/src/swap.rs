// SPDX-License-Identifier: GPL-3.0-only

//! Swap façade

use blockkit_contracts::traits::{SwapOps, SwapTech};
use blockkit_contracts::{Error, ExtraArg, Result, TechModes};
use blockkit_types::BackendId;

pub use blockkit_contracts::traits::SwapTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn SwapOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Swap, |backend| {
        let swap = backend
            .as_swap()
            .ok_or_else(|| Error::not_available(BackendId::Swap))?;
        call(swap)
    })
}

pub fn mkswap(device: &str, label: Option<&str>, extra: &[ExtraArg]) -> Result<()> {
    ops(|swap| swap.mkswap(device, label, extra))
}

pub fn swapon(device: &str, priority: Option<i32>) -> Result<()> {
    ops(|swap| swap.swapon(device, priority))
}

pub fn swapoff(device: &str) -> Result<()> {
    ops(|swap| swap.swapoff(device))
}

/// Whether `device` is an active swap area.
pub fn swap_status(device: &str) -> Result<bool> {
    ops(|swap| swap.swap_status(device))
}

pub fn is_tech_available(tech: SwapTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Swap, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
