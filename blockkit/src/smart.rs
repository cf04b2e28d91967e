// SPDX-License-Identifier: GPL-3.0-only

//! S.M.A.R.T. façade

use blockkit_contracts::traits::{SmartOps, SmartTech};
use blockkit_contracts::{Error, ExtraArg, Result, TechModes};
use blockkit_types::{BackendId, SmartInfo};

pub use blockkit_contracts::traits::SmartTech as Tech;

fn ops<T>(call: impl FnOnce(&dyn SmartOps) -> Result<T>) -> Result<T> {
    crate::global().with_backend(BackendId::Smart, |backend| {
        let smart = backend
            .as_smart()
            .ok_or_else(|| Error::not_available(BackendId::Smart))?;
        call(smart)
    })
}

pub fn info(device: &str, extra: &[ExtraArg]) -> Result<SmartInfo> {
    ops(|smart| smart.info(device, extra))
}

pub fn set_enabled(device: &str, enabled: bool) -> Result<()> {
    ops(|smart| smart.set_enabled(device, enabled))
}

pub fn self_test(device: &str, extended: bool) -> Result<()> {
    ops(|smart| smart.self_test(device, extended))
}

pub fn is_tech_available(tech: SmartTech, modes: TechModes) -> Result<()> {
    crate::global().with_backend(BackendId::Smart, |backend| {
        backend.is_tech_available(tech as u32, modes)
    })
}
