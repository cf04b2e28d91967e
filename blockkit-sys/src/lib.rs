// SPDX-License-Identifier: GPL-3.0-only

//! Low-level helpers shared by blockkit backends
//!
//! This crate provides the pieces every backend needs but none owns:
//!
//! - subprocess execution with captured diagnostics and pass-through
//!   arguments
//! - external tool discovery and version probing, with a process-wide
//!   cache so capability queries never re-run tools
//! - sysfs block-device topology reads
//! - the process-wide log sink installed at init
//!
//! Nothing here touches partition tables or device contents.

pub mod dep;
pub mod exec;
pub mod log;
pub mod topology;

pub use dep::{ToolSpec, check_tool, tool_version};
pub use exec::{run_tool, run_tool_with_extra, run_tool_with_input, splice_args};
pub use topology::BlockTopology;
