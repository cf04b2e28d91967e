// SPDX-License-Identifier: GPL-3.0-only

//! Contracts between the blockkit core and its domain backends
//!
//! This crate defines everything the loader and the façade need to know
//! about a backend without depending on any backend implementation:
//!
//! - the uniform error envelope ([`Error`], [`ErrorDomain`], [`ErrorKind`])
//! - the [`Backend`] lifecycle/capability contract and per-domain
//!   operation traits
//! - the injectable [`LogSink`] contract
//!
//! Backend implementations live in `blockkit-part` and
//! `blockkit-backends`; the loader in `blockkit` binds them through these
//! types only.

pub mod backend;
pub mod error;
pub mod logging;
pub mod traits;

pub use backend::{Backend, ExtraArg, TechMode, TechModes};
pub use error::{Error, ErrorDomain, ErrorKind, Result};
pub use logging::LogSink;
