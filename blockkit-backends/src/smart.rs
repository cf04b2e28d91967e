// SPDX-License-Identifier: GPL-3.0-only

//! S.M.A.R.T. backend (smartctl)

use blockkit_contracts::traits::{SmartOps, SmartTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, ExtraArg, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::{run_tool, run_tool_with_extra};
use blockkit_types::{BackendId, SmartAttribute, SmartInfo};

const DOMAIN: ErrorDomain = ErrorDomain::Smart;

pub struct SmartBackend;

impl SmartBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SmartBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse one row of the vendor attribute table:
/// `  5 Reallocated_Sector_Ct 0x0033 100 100 010 Pre-fail Always - 0`.
fn parse_attribute_row(line: &str) -> Option<SmartAttribute> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 10 {
        return None;
    }

    Some(SmartAttribute {
        id: tokens[0].parse().ok()?,
        name: tokens[1].to_string(),
        value: tokens[3].parse().ok()?,
        worst: tokens[4].parse().ok()?,
        threshold: tokens[5].parse().ok()?,
        raw: tokens[9..].join(" "),
    })
}

/// Parse `smartctl -H -A` output into a health summary.
fn parse_info(output: &str) -> SmartInfo {
    let mut info = SmartInfo::default();
    let mut in_table = false;

    for line in output.lines() {
        if line.contains("SMART support is:") {
            info.enabled = line.contains("Enabled");
            continue;
        }
        if line.contains("self-assessment test result") {
            info.healthy = line.contains("PASSED");
            continue;
        }
        if line.starts_with("ID#") {
            in_table = true;
            continue;
        }
        if in_table {
            if line.trim().is_empty() {
                in_table = false;
                continue;
            }
            if let Some(attribute) = parse_attribute_row(line) {
                info.attributes.push(attribute);
            }
        }
    }

    info
}

impl Backend for SmartBackend {
    fn id(&self) -> BackendId {
        BackendId::Smart
    }

    fn probe_dependencies(&self) -> Result<()> {
        check_tool(DOMAIN, ToolSpec::with_version("smartctl", "--version", "7.0"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        SmartTech::from_raw(tech).map(|_| ()).ok_or_else(|| {
            Error::new(DOMAIN, ErrorKind::Inval, format!("Invalid SMART technology: {tech}"))
        })
    }

    fn as_smart(&self) -> Option<&dyn SmartOps> {
        Some(self)
    }
}

impl SmartOps for SmartBackend {
    fn info(&self, device: &str, extra: &[ExtraArg]) -> Result<SmartInfo> {
        let output = run_tool_with_extra(
            DOMAIN,
            &["smartctl", "--health", "--attributes", "--info"],
            extra,
            &[device],
        )?;
        Ok(parse_info(&output))
    }

    fn set_enabled(&self, device: &str, enabled: bool) -> Result<()> {
        let value = if enabled { "on" } else { "off" };
        run_tool(DOMAIN, &["smartctl", "--smart", value, device]).map(|_| ())
    }

    fn self_test(&self, device: &str, extended: bool) -> Result<()> {
        let kind = if extended { "long" } else { "short" };
        run_tool(DOMAIN, &["smartctl", "--test", kind, device]).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OUTPUT: &str = "\
smartctl 7.4 2023-08-01 r5530 [x86_64-linux] (local build)

=== START OF READ SMART DATA SECTION ===
SMART support is: Available - device has SMART capability.
SMART support is: Enabled
SMART overall-health self-assessment test result: PASSED

ID# ATTRIBUTE_NAME          FLAG     VALUE WORST THRESH TYPE      UPDATED  WHEN_FAILED RAW_VALUE
  5 Reallocated_Sector_Ct   0x0033   100   100   010    Pre-fail  Always       -       0
  9 Power_On_Hours          0x0032   099   099   000    Old_age   Always       -       1042

";

    #[test]
    fn parses_health_and_attributes() {
        let info = parse_info(OUTPUT);
        assert!(info.enabled);
        assert!(info.healthy);
        assert_eq!(info.attributes.len(), 2);
        assert_eq!(info.attributes[0].id, 5);
        assert_eq!(info.attributes[0].name, "Reallocated_Sector_Ct");
        assert_eq!(info.attributes[0].threshold, 10);
        assert_eq!(info.attributes[1].raw, "1042");
    }

    #[test]
    fn failed_health_is_reported() {
        let output = OUTPUT.replace("PASSED", "FAILED!");
        assert!(!parse_info(&output).healthy);
    }
}
