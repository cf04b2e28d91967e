// SPDX-License-Identifier: GPL-3.0-only

//! External tool probing
//!
//! Backends declare the tools they depend on as [`ToolSpec`]s and check
//! them during `probe_dependencies`. Probe results (presence and reported
//! version) are cached process-wide, so capability queries stay free of
//! subprocess work after the first probe.

use std::collections::HashMap;

use parking_lot::Mutex;

use blockkit_contracts::{Error, ErrorDomain, ErrorKind, Result};

use crate::exec;

/// One external tool dependency.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    /// Binary name looked up on PATH
    pub tool: &'static str,

    /// Argument that makes the tool print its version ("--version");
    /// `None` skips the version check entirely
    pub version_arg: Option<&'static str>,

    /// Minimum acceptable version, dotted-numeric
    pub min_version: Option<&'static str>,
}

impl ToolSpec {
    pub const fn new(tool: &'static str) -> Self {
        Self {
            tool,
            version_arg: None,
            min_version: None,
        }
    }

    pub const fn with_version(
        tool: &'static str,
        version_arg: &'static str,
        min_version: &'static str,
    ) -> Self {
        Self {
            tool,
            version_arg: Some(version_arg),
            min_version: Some(min_version),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Probe {
    available: bool,
    version: Option<String>,
}

static CACHE: Mutex<Option<HashMap<String, Probe>>> = Mutex::new(None);

fn probe(tool: &str, version_arg: Option<&str>) -> Probe {
    let mut cache = CACHE.lock();
    let cache = cache.get_or_insert_with(HashMap::new);
    if let Some(hit) = cache.get(tool) {
        return hit.clone();
    }

    let mut result = Probe::default();
    if which::which(tool).is_ok() {
        result.available = true;
        if let Some(arg) = version_arg {
            result.version = exec::run_tool(ErrorDomain::Utils, &[tool, arg])
                .ok()
                .and_then(|out| extract_version(&out));
        }
    }

    cache.insert(tool.to_string(), result.clone());
    result
}

/// First dotted-numeric token in a tool's version banner.
fn extract_version(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_digit() && c != '.'))
        .find(|token| {
            token.contains('.') && token.chars().all(|c| c.is_ascii_digit() || c == '.')
        })
        .map(ToString::to_string)
}

/// Compare dotted-numeric versions componentwise.
fn version_at_least(version: &str, minimum: &str) -> bool {
    let mut have = version.split('.').map(|part| part.parse::<u64>().unwrap_or(0));
    let mut want = minimum.split('.').map(|part| part.parse::<u64>().unwrap_or(0));

    loop {
        match (have.next(), want.next()) {
            (Some(h), Some(w)) if h > w => return true,
            (Some(h), Some(w)) if h < w => return false,
            (Some(_), Some(_)) => continue,
            (None, Some(w)) if w > 0 => return false,
            (None, Some(_)) => continue,
            (_, None) => return true,
        }
    }
}

/// Check a tool dependency, consulting only the cache after first use.
pub fn check_tool(domain: ErrorDomain, spec: ToolSpec) -> Result<()> {
    let result = probe(spec.tool, spec.version_arg);
    if !result.available {
        return Err(Error::new(
            domain,
            ErrorKind::TechUnavail,
            format!("The '{}' utility is not available", spec.tool),
        ));
    }

    if let Some(minimum) = spec.min_version {
        match result.version.as_deref() {
            Some(version) if version_at_least(version, minimum) => {}
            Some(version) => {
                return Err(Error::new(
                    domain,
                    ErrorKind::TechUnavail,
                    format!(
                        "The '{}' utility is too old: {} < {}",
                        spec.tool, version, minimum
                    ),
                ));
            }
            None => {
                return Err(Error::new(
                    domain,
                    ErrorKind::TechUnavail,
                    format!("Failed to determine the version of '{}'", spec.tool),
                ));
            }
        }
    }

    Ok(())
}

/// Cached version of a tool, if it was probed with a version argument.
pub fn tool_version(tool: &str) -> Option<String> {
    CACHE
        .lock()
        .as_ref()
        .and_then(|cache| cache.get(tool))
        .and_then(|probe| probe.version.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_version_tokens() {
        assert_eq!(
            extract_version("mdadm - v4.2 - 2021-12-30").as_deref(),
            Some("4.2")
        );
        assert_eq!(
            extract_version("btrfs-progs v6.6.3").as_deref(),
            Some("6.6.3")
        );
        assert_eq!(extract_version("no digits here"), None);
    }

    #[test]
    fn compares_versions_componentwise() {
        assert!(version_at_least("4.2", "4.2"));
        assert!(version_at_least("4.10", "4.2"));
        assert!(version_at_least("5.0", "4.9.9"));
        assert!(!version_at_least("4.1.9", "4.2"));
        assert!(version_at_least("4.2.0", "4.2"));
        assert!(!version_at_least("4.2", "4.2.1"));
    }

    #[test]
    fn missing_tool_reports_tech_unavail() {
        let err = check_tool(ErrorDomain::Nvdimm, ToolSpec::new("no-such-tool-477"))
            .expect_err("tool cannot exist");
        assert_eq!(err.kind, ErrorKind::TechUnavail);
        assert_eq!(err.domain, ErrorDomain::Nvdimm);
    }

    #[test]
    fn present_tool_probes_ok() {
        check_tool(ErrorDomain::Utils, ToolSpec::new("sh")).expect("sh is on PATH");
    }
}
