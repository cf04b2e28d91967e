// SPDX-License-Identifier: GPL-3.0-only

//! NVDIMM backend (ndctl)

use blockkit_contracts::traits::{NvdimmOps, NvdimmTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::run_tool;
use blockkit_types::BackendId;

const DOMAIN: ErrorDomain = ErrorDomain::Nvdimm;

pub struct NvdimmBackend;

impl NvdimmBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NvdimmBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Namespace names out of `ndctl list -N` JSON output, without pulling in
/// a full object model for it.
fn parse_namespace_names(json: &str) -> Result<Vec<String>> {
    let parsed: serde_json::Value = serde_json::from_str(json).map_err(|err| {
        Error::new(DOMAIN, ErrorKind::Parse, format!("Failed to parse ndctl output: {err}"))
    })?;

    let mut names = Vec::new();
    if let Some(entries) = parsed.as_array() {
        for entry in entries {
            if let Some(dev) = entry.get("dev").and_then(|dev| dev.as_str()) {
                names.push(dev.to_string());
            }
        }
    }
    Ok(names)
}

impl Backend for NvdimmBackend {
    fn id(&self) -> BackendId {
        BackendId::Nvdimm
    }

    fn probe_dependencies(&self) -> Result<()> {
        check_tool(DOMAIN, ToolSpec::new("ndctl"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        NvdimmTech::from_raw(tech).map(|_| ()).ok_or_else(|| {
            Error::new(DOMAIN, ErrorKind::Inval, format!("Invalid NVDIMM technology: {tech}"))
        })
    }

    fn as_nvdimm(&self) -> Option<&dyn NvdimmOps> {
        Some(self)
    }
}

impl NvdimmOps for NvdimmBackend {
    fn list_namespaces(&self) -> Result<Vec<String>> {
        let output = run_tool(DOMAIN, &["ndctl", "list", "-N"])?;
        if output.trim().is_empty() {
            return Ok(Vec::new());
        }
        parse_namespace_names(&output)
    }

    fn enable_namespace(&self, namespace: &str) -> Result<()> {
        run_tool(DOMAIN, &["ndctl", "enable-namespace", namespace]).map(|_| ())
    }

    fn disable_namespace(&self, namespace: &str) -> Result<()> {
        run_tool(DOMAIN, &["ndctl", "disable-namespace", namespace]).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespace_names() {
        let names = parse_namespace_names(
            r#"[{"dev": "namespace0.0", "mode": "fsdax", "size": 1073741824},
                {"dev": "namespace1.0", "mode": "raw", "size": 1073741824}]"#,
        )
        .expect("valid json");
        assert_eq!(names, vec!["namespace0.0", "namespace1.0"]);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_namespace_names("not json").expect_err("invalid json");
        assert_eq!(err.kind, ErrorKind::Parse);
    }
}
