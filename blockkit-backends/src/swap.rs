// SPDX-License-Identifier: GPL-3.0-only

//! Swap backend (mkswap, swapon, swapoff)

use std::fs;

use blockkit_contracts::traits::{SwapOps, SwapTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, ExtraArg, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::{run_tool, run_tool_with_extra};
use blockkit_types::BackendId;

const DOMAIN: ErrorDomain = ErrorDomain::Swap;

pub struct SwapBackend;

impl SwapBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SwapBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `device` appears as an active swap area in a `/proc/swaps`
/// listing.
fn device_in_swaps(swaps: &str, device: &str) -> bool {
    swaps
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .any(|entry| entry == device)
}

impl Backend for SwapBackend {
    fn id(&self) -> BackendId {
        BackendId::Swap
    }

    fn probe_dependencies(&self) -> Result<()> {
        for tool in ["mkswap", "swapon", "swapoff"] {
            check_tool(DOMAIN, ToolSpec::new(tool))?;
        }
        Ok(())
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        SwapTech::from_raw(tech).map(|_| ()).ok_or_else(|| {
            Error::new(DOMAIN, ErrorKind::Inval, format!("Invalid swap technology: {tech}"))
        })
    }

    fn as_swap(&self) -> Option<&dyn SwapOps> {
        Some(self)
    }
}

impl SwapOps for SwapBackend {
    fn mkswap(&self, device: &str, label: Option<&str>, extra: &[ExtraArg]) -> Result<()> {
        let mut base: Vec<&str> = vec!["mkswap", "--force"];
        if let Some(label) = label {
            base.push("--label");
            base.push(label);
        }

        run_tool_with_extra(DOMAIN, &base, extra, &[device])
            .map(|_| ())
            .map_err(|err| Error::new(DOMAIN, ErrorKind::FormatFailed, err.message))
    }

    fn swapon(&self, device: &str, priority: Option<i32>) -> Result<()> {
        let priority_arg = priority.map(|p| p.to_string());
        let mut argv: Vec<&str> = vec!["swapon"];
        if let Some(arg) = &priority_arg {
            argv.push("--priority");
            argv.push(arg);
        }
        argv.push(device);

        run_tool(DOMAIN, &argv).map(|_| ())
    }

    fn swapoff(&self, device: &str) -> Result<()> {
        run_tool(DOMAIN, &["swapoff", device]).map(|_| ())
    }

    fn swap_status(&self, device: &str) -> Result<bool> {
        let swaps = fs::read_to_string("/proc/swaps").map_err(|err| {
            Error::new(DOMAIN, ErrorKind::Fail, format!("Failed to read /proc/swaps: {err}"))
        })?;

        // /proc/swaps lists the resolved device node
        let resolved = fs::canonicalize(device)
            .map(|path| path.to_string_lossy().to_string())
            .unwrap_or_else(|_| device.to_string());

        Ok(device_in_swaps(&swaps, &resolved) || device_in_swaps(&swaps, device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWAPS: &str = "\
Filename                                Type            Size            Used            Priority
/dev/sda2                               partition       8388604         0               -2
/swap/file                              file            2097148         0               -3
";

    #[test]
    fn finds_active_swap_devices() {
        assert!(device_in_swaps(SWAPS, "/dev/sda2"));
        assert!(device_in_swaps(SWAPS, "/swap/file"));
        assert!(!device_in_swaps(SWAPS, "/dev/sda1"));
    }

    #[test]
    fn header_row_is_ignored() {
        assert!(!device_in_swaps(SWAPS, "Filename"));
    }
}
