// SPDX-License-Identifier: GPL-3.0-only

//! Multipath backend (multipath, mpathconf)

use blockkit_contracts::traits::{MpathOps, MpathTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::run_tool;
use blockkit_types::BackendId;

const DOMAIN: ErrorDomain = ErrorDomain::Mpath;

pub struct MpathBackend;

impl MpathBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MpathBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MpathBackend {
    fn id(&self) -> BackendId {
        BackendId::Mpath
    }

    fn probe_dependencies(&self) -> Result<()> {
        check_tool(DOMAIN, ToolSpec::new("multipath"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        match MpathTech::from_raw(tech) {
            Some(MpathTech::Base) => Ok(()),
            Some(MpathTech::FriendlyNames) => check_tool(DOMAIN, ToolSpec::new("mpathconf")),
            None => Err(Error::new(
                DOMAIN,
                ErrorKind::Inval,
                format!("Invalid mpath technology: {tech}"),
            )),
        }
    }

    fn as_mpath(&self) -> Option<&dyn MpathOps> {
        Some(self)
    }
}

impl MpathOps for MpathBackend {
    fn flush_mpaths(&self) -> Result<()> {
        run_tool(DOMAIN, &["multipath", "-F"]).map(|_| ())?;

        // -F silently skips busy maps; an empty listing confirms the flush
        let listing = run_tool(DOMAIN, &["multipath", "-ll"])?;
        if listing.trim().is_empty() {
            Ok(())
        } else {
            Err(Error::new(
                DOMAIN,
                ErrorKind::Fail,
                "Some multipath maps are still present after flush",
            ))
        }
    }

    fn is_mpath_member(&self, device: &str) -> Result<bool> {
        // `multipath -c` answers through its exit status
        Ok(run_tool(DOMAIN, &["multipath", "-c", device]).is_ok())
    }

    fn set_friendly_names(&self, enabled: bool) -> Result<()> {
        let value = if enabled { "y" } else { "n" };
        let arg = format!("--user_friendly_names={value}");
        run_tool(DOMAIN, &["mpathconf", &arg, "--with_multipathd", "y"]).map(|_| ())
    }
}
