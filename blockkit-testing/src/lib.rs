// SPDX-License-Identifier: GPL-3.0-only

//! Test doubles for the blockkit integration suites
//!
//! Stub backends registered as runtime images let the suites drive the
//! real loader and dispatch paths without touching host tools or devices;
//! the in-memory table I/O from `blockkit-part` stands in for real disks
//! behind the partition engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use blockkit::register_image;
use blockkit_contracts::{Backend, Error, ErrorKind, Result, TechModes};
use blockkit_types::{BackendId, BackendSpec};

pub use blockkit_part::mem::MemTableIo;

/// A backend that does nothing but participate in the loader lifecycle.
pub struct StubBackend {
    id: BackendId,
    probe_ok: bool,
    shutdowns: Arc<AtomicUsize>,
}

impl Backend for StubBackend {
    fn id(&self) -> BackendId {
        self.id
    }

    fn probe_dependencies(&self) -> Result<()> {
        if self.probe_ok {
            Ok(())
        } else {
            Err(Error::new(
                self.id.into(),
                ErrorKind::TechUnavail,
                "stub probe refused",
            ))
        }
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }

    fn is_tech_available(&self, _tech: u32, _modes: TechModes) -> Result<()> {
        Ok(())
    }
}

/// Route library tracing to stderr for a test run, honoring
/// `RUST_LOG`-style filtering. Safe to call repeatedly.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blockkit=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Register a stub image; returns its shutdown counter.
pub fn register_stub(image: &str, id: BackendId, probe_ok: bool) -> Arc<AtomicUsize> {
    let shutdowns = Arc::new(AtomicUsize::new(0));
    let factory_shutdowns = Arc::clone(&shutdowns);
    register_image(
        image,
        Arc::new(move || {
            Arc::new(StubBackend {
                id,
                probe_ok,
                shutdowns: Arc::clone(&factory_shutdowns),
            }) as Arc<dyn Backend>
        }),
    );
    shutdowns
}

/// Force every identifier to a freshly registered stub image named
/// `<prefix>_<canonical name>`.
pub fn force_all_stubs(prefix: &str) -> Vec<BackendSpec> {
    BackendId::ALL
        .into_iter()
        .map(|id| {
            let image = format!("{prefix}_{}", id.canonical_name());
            register_stub(&image, id, true);
            BackendSpec::with_image(id, image)
        })
        .collect()
}

/// Register a partition image backed by the given in-memory machine.
pub fn register_mem_part_image(image: &str, io: &Arc<MemTableIo>) {
    let io = Arc::clone(io);
    register_image(
        image,
        Arc::new(move || {
            Arc::new(blockkit_part::PartBackend::new(
                Arc::clone(&io) as Arc<dyn blockkit_part::TableIo>,
            )) as Arc<dyn Backend>
        }),
    );
}
