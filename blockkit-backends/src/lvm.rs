// SPDX-License-Identifier: GPL-3.0-only

//! LVM backend (lvm2 CLI)
//!
//! Report queries go through `pvs`/`vgs`/`lvs` with byte units and a tab
//! separator; mutations through the corresponding lvm2 commands. All
//! sizes are bytes.

use blockkit_contracts::traits::{LvmOps, LvmTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, ExtraArg, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool};
use blockkit_sys::exec::{run_tool, run_tool_with_extra};
use blockkit_types::{BackendId, LvmLvInfo, LvmPvInfo, LvmVgInfo};

const DOMAIN: ErrorDomain = ErrorDomain::Lvm;

const REPORT_ARGS: [&str; 6] = [
    "--noheadings",
    "--units",
    "b",
    "--nosuffix",
    "--separator",
    "\t",
];

pub struct LvmBackend;

impl LvmBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LvmBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_tabbed_line(line: &str) -> Vec<String> {
    line.split('\t').map(|part| part.trim().to_string()).collect()
}

fn parse_pvs(output: &str) -> Vec<LvmPvInfo> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let cols = parse_tabbed_line(line);
            if cols.len() < 4 {
                return None;
            }
            let vg_name = if cols[1].is_empty() {
                None
            } else {
                Some(cols[1].clone())
            };

            Some(LvmPvInfo {
                pv_name: cols[0].clone(),
                vg_name,
                pv_size: cols[2].parse().ok()?,
                pv_free: cols[3].parse().ok()?,
            })
        })
        .collect()
}

fn parse_vgs(output: &str) -> Vec<LvmVgInfo> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let cols = parse_tabbed_line(line);
            if cols.len() < 6 {
                return None;
            }
            Some(LvmVgInfo {
                vg_name: cols[0].clone(),
                vg_size: cols[1].parse().ok()?,
                vg_free: cols[2].parse().ok()?,
                extent_size: cols[3].parse().ok()?,
                pv_count: cols[4].parse().ok()?,
                lv_count: cols[5].parse().ok()?,
            })
        })
        .collect()
}

fn parse_lvs(output: &str) -> Vec<LvmLvInfo> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let cols = parse_tabbed_line(line);
            if cols.len() < 5 {
                return None;
            }

            Some(LvmLvInfo {
                vg_name: cols[0].clone(),
                lv_name: cols[1].clone(),
                lv_path: cols[2].clone(),
                lv_size: cols[3].parse().ok()?,
                active: cols[4].eq_ignore_ascii_case("active") || cols[4] == "y",
            })
        })
        .collect()
}

impl Backend for LvmBackend {
    fn id(&self) -> BackendId {
        BackendId::Lvm
    }

    fn probe_dependencies(&self) -> Result<()> {
        if !cfg!(feature = "lvm-tools") {
            return Err(Error::new(
                DOMAIN,
                ErrorKind::TechUnavail,
                "Built without lvm-tools support",
            ));
        }
        for tool in ["pvcreate", "vgcreate", "lvcreate", "pvs", "vgs", "lvs"] {
            check_tool(DOMAIN, ToolSpec::new(tool))?;
        }
        Ok(())
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        match LvmTech::from_raw(tech) {
            Some(LvmTech::Basic) => check_tool(DOMAIN, ToolSpec::new("lvs")),
            Some(LvmTech::ThinProvisioning) => check_tool(DOMAIN, ToolSpec::new("thin_check")),
            None => Err(Error::new(
                DOMAIN,
                ErrorKind::Inval,
                format!("Invalid LVM technology: {tech}"),
            )),
        }
    }

    fn as_lvm(&self) -> Option<&dyn LvmOps> {
        Some(self)
    }
}

impl LvmOps for LvmBackend {
    fn pv_create(&self, device: &str, extra: &[ExtraArg]) -> Result<()> {
        run_tool_with_extra(DOMAIN, &["pvcreate", "-ff", "-y"], extra, &[device]).map(|_| ())
    }

    fn pv_remove(&self, device: &str, extra: &[ExtraArg]) -> Result<()> {
        run_tool_with_extra(DOMAIN, &["pvremove", "-ff", "-y"], extra, &[device]).map(|_| ())
    }

    fn vg_create(
        &self,
        name: &str,
        devices: &[&str],
        pe_size: u64,
        extra: &[ExtraArg],
    ) -> Result<()> {
        let mut base: Vec<&str> = vec!["vgcreate"];
        let pe_size_arg = format!("{pe_size}b");
        if pe_size > 0 {
            base.push("-s");
            base.push(&pe_size_arg);
        }
        base.push(name);

        run_tool_with_extra(DOMAIN, &base, extra, devices).map(|_| ())
    }

    fn vg_remove(&self, name: &str, extra: &[ExtraArg]) -> Result<()> {
        run_tool_with_extra(DOMAIN, &["vgremove", "-ff", "-y"], extra, &[name]).map(|_| ())
    }

    fn lv_create(
        &self,
        vg: &str,
        name: &str,
        size: u64,
        pvs: &[&str],
        extra: &[ExtraArg],
    ) -> Result<()> {
        let size_arg = format!("{size}b");
        let base = ["lvcreate", "-n", name, "-L", &size_arg, "-y", vg];

        run_tool_with_extra(DOMAIN, &base, extra, pvs).map(|_| ())
    }

    fn lv_remove(&self, vg: &str, name: &str, force: bool, extra: &[ExtraArg]) -> Result<()> {
        let qualified = format!("{vg}/{name}");
        let mut base: Vec<&str> = vec!["lvremove"];
        if force {
            base.push("-ff");
            base.push("-y");
        }

        run_tool_with_extra(DOMAIN, &base, extra, &[&qualified]).map(|_| ())
    }

    fn lv_resize(&self, vg: &str, name: &str, size: u64, extra: &[ExtraArg]) -> Result<()> {
        let qualified = format!("{vg}/{name}");
        let size_arg = format!("{size}b");
        let base = ["lvresize", "--force", "-L", &size_arg];

        run_tool_with_extra(DOMAIN, &base, extra, &[&qualified]).map(|_| ())
    }

    fn pvs(&self) -> Result<Vec<LvmPvInfo>> {
        let mut argv: Vec<&str> = vec!["pvs"];
        argv.extend_from_slice(&REPORT_ARGS);
        argv.extend_from_slice(&["-o", "pv_name,vg_name,pv_size,pv_free"]);

        let output = run_tool(DOMAIN, &argv)?;
        Ok(parse_pvs(&output))
    }

    fn vgs(&self) -> Result<Vec<LvmVgInfo>> {
        let mut argv: Vec<&str> = vec!["vgs"];
        argv.extend_from_slice(&REPORT_ARGS);
        argv.extend_from_slice(&[
            "-o",
            "vg_name,vg_size,vg_free,vg_extent_size,pv_count,lv_count",
        ]);

        let output = run_tool(DOMAIN, &argv)?;
        Ok(parse_vgs(&output))
    }

    fn lvs(&self, vg: Option<&str>) -> Result<Vec<LvmLvInfo>> {
        let mut argv: Vec<&str> = vec!["lvs"];
        argv.extend_from_slice(&REPORT_ARGS);
        argv.extend_from_slice(&["-o", "vg_name,lv_name,lv_path,lv_size,lv_active"]);
        if let Some(vg) = vg {
            argv.push(vg);
        }

        let output = run_tool(DOMAIN, &argv)?;
        Ok(parse_lvs(&output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_rows() {
        let pvs = parse_pvs("/dev/sda2\tvg0\t107374182400\t26843545600\n");
        let vgs = parse_vgs("vg0\t107374182400\t26843545600\t4194304\t1\t2\n");
        let lvs = parse_lvs("vg0\troot\t/dev/vg0/root\t53687091200\tactive\n");

        assert_eq!(pvs.len(), 1);
        assert_eq!(pvs[0].vg_name.as_deref(), Some("vg0"));
        assert_eq!(vgs.len(), 1);
        assert_eq!(vgs[0].extent_size, 4194304);
        assert_eq!(vgs[0].lv_count, 2);
        assert_eq!(lvs.len(), 1);
        assert!(lvs[0].active);
        assert_eq!(lvs[0].lv_path, "/dev/vg0/root");
    }

    #[test]
    fn orphan_pv_has_no_vg() {
        let pvs = parse_pvs("/dev/sdb1\t\t107374182400\t107374182400\n");
        assert_eq!(pvs.len(), 1);
        assert_eq!(pvs[0].vg_name, None);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let lvs = parse_lvs("vg0\troot\n\nnot a row at all\n");
        assert!(lvs.is_empty());
    }
}
