// SPDX-License-Identifier: GPL-3.0-only

//! Plugin loader and dispatcher
//!
//! One [`PluginRecord`] per backend identifier, moving through
//! `Unloaded → LoadedUninitialized → LoadedInitialized` (or `Failed`,
//! which the next reinit resets). `init`/`reinit` serialize on an
//! internal mutex and publish the finished table as a fresh `Arc`;
//! dispatch captures the current `Arc` at entry and never takes a lock
//! across a backend call, so concurrent dispatch proceeds freely while a
//! reinit builds the next table.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use blockkit_contracts::logging::LOG_WARNING;
use blockkit_contracts::{Backend, Error, ErrorDomain, ErrorKind, LogSink, Result};
use blockkit_sys::log;
use blockkit_types::{BackendId, BackendSpec};

use crate::registry::{self, ImageFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PluginState {
    Unloaded,
    LoadedUninitialized,
    LoadedInitialized,
    Failed,
}

#[derive(Clone)]
struct PluginRecord {
    id: BackendId,
    state: PluginState,
    /// Image name bound (or last bound) to this record
    image_name: Option<String>,
    /// The loaded image; kept across reinit unless images are reloaded
    factory: Option<ImageFactory>,
    /// The resolved operation table of an initialized backend
    backend: Option<Arc<dyn Backend>>,
}

impl PluginRecord {
    fn new(id: BackendId) -> Self {
        Self {
            id,
            state: PluginState::Unloaded,
            image_name: None,
            factory: None,
            backend: None,
        }
    }
}

#[derive(Clone)]
struct PluginTable {
    records: HashMap<BackendId, PluginRecord>,
    /// Successful initialization order; shutdown walks it in reverse
    init_order: Vec<BackendId>,
}

impl PluginTable {
    fn empty() -> Self {
        Self {
            records: BackendId::ALL
                .into_iter()
                .map(|id| (id, PluginRecord::new(id)))
                .collect(),
            init_order: Vec::new(),
        }
    }
}

#[derive(Default)]
struct LoaderState {
    initialized: bool,
}

/// The loader instance. The crate-level façade drives one process-wide
/// instance; tests construct their own to keep state isolated.
pub struct Loader {
    state: Mutex<LoaderState>,
    table: RwLock<Arc<PluginTable>>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load one record: resolve the image, construct the backend, probe its
/// dependencies and initialize it. Any failing step leaves the record for
/// the caller to mark `Failed`.
fn load_record(record: &mut PluginRecord, image_name: &str) -> Result<()> {
    let reusable =
        record.factory.is_some() && record.image_name.as_deref() == Some(image_name);
    let factory = if reusable {
        record.factory.clone().expect("factory present when reusable")
    } else {
        registry::resolve_image(image_name).ok_or_else(|| {
            Error::new(
                ErrorDomain::Plugin,
                ErrorKind::PluginInitFailed,
                format!("Failed to load the image '{image_name}'"),
            )
        })?
    };

    let backend = factory();
    if backend.id() != record.id {
        return Err(Error::new(
            ErrorDomain::Plugin,
            ErrorKind::PluginInitFailed,
            format!(
                "Image '{image_name}' provides the '{}' backend, not '{}'",
                backend.id(),
                record.id
            ),
        ));
    }

    record.factory = Some(factory);
    record.image_name = Some(image_name.to_string());
    record.state = PluginState::LoadedUninitialized;

    backend.probe_dependencies()?;
    backend.initialize()?;

    record.backend = Some(backend);
    record.state = PluginState::LoadedInitialized;
    Ok(())
}

impl Loader {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LoaderState::default()),
            table: RwLock::new(Arc::new(PluginTable::empty())),
        }
    }

    /// Load and initialize every backend, honoring `force` overrides.
    ///
    /// Partial success is success: identifiers whose image, probe or init
    /// failed stay unavailable and are logged at WARNING. Only a cycle in
    /// which *no* backend came up fails, with a `PluginInitFailed` whose
    /// message names each identifier and its reason. A second `init` on
    /// an initialized loader returns `Ok` without side effects.
    pub fn init(&self, force: &[BackendSpec], sink: Option<LogSink>) -> Result<()> {
        let mut state = self.state.lock();
        if state.initialized {
            return Ok(());
        }
        self.init_locked(&mut state, force, sink)
    }

    /// Shut down all initialized backends (reverse initialization order),
    /// optionally release the loaded images, and run a fresh `init`.
    pub fn reinit(
        &self,
        force: &[BackendSpec],
        reload_images: bool,
        sink: Option<LogSink>,
    ) -> Result<()> {
        let mut state = self.state.lock();

        let mut table = (**self.table.read()).clone();
        for id in table.init_order.clone().iter().rev() {
            if let Some(record) = table.records.get_mut(id) {
                if let Some(backend) = record.backend.take() {
                    backend.shutdown();
                }
                record.state = PluginState::Unloaded;
            }
        }
        table.init_order.clear();

        for record in table.records.values_mut() {
            if record.state == PluginState::Failed {
                record.state = PluginState::Unloaded;
            }
            if reload_images {
                record.factory = None;
                record.image_name = None;
            }
        }
        *self.table.write() = Arc::new(table);

        state.initialized = false;
        self.init_locked(&mut state, force, sink)
    }

    fn init_locked(
        &self,
        state: &mut LoaderState,
        force: &[BackendSpec],
        sink: Option<LogSink>,
    ) -> Result<()> {
        log::set_sink(sink);

        let mut table = (**self.table.read()).clone();
        let mut failures: Vec<(BackendId, String)> = Vec::new();

        for id in BackendId::ALL {
            let image_name = force
                .iter()
                .find(|spec| spec.id == id)
                .map(|spec| spec.image_name().to_string())
                .unwrap_or_else(|| id.default_image().to_string());

            let record = table
                .records
                .get_mut(&id)
                .expect("one record per identifier");
            record.state = PluginState::Unloaded;

            match load_record(record, &image_name) {
                Ok(()) => table.init_order.push(id),
                Err(err) => {
                    record.state = PluginState::Failed;
                    record.backend = None;
                    failures.push((id, err.message));
                }
            }
        }

        *self.table.write() = Arc::new(table);
        tracing::debug!(
            "plugin table published: {} of {} backends initialized",
            BackendId::ALL.len() - failures.len(),
            BackendId::ALL.len()
        );

        if failures.len() == BackendId::ALL.len() {
            let details = failures
                .iter()
                .map(|(id, reason)| format!("{}: {reason}", id.canonical_name()))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::new(
                ErrorDomain::Plugin,
                ErrorKind::PluginInitFailed,
                format!("No plugin could be initialized ({details})"),
            ));
        }

        for (id, reason) in &failures {
            log::message(
                LOG_WARNING,
                &format!("Failed to load the '{}' plugin: {reason}", id.canonical_name()),
            );
        }

        state.initialized = true;
        Ok(())
    }

    pub fn is_plugin_available(&self, id: BackendId) -> bool {
        let table = self.table.read();
        table
            .records
            .get(&id)
            .is_some_and(|record| record.state == PluginState::LoadedInitialized)
    }

    /// Canonical names of the loaded backends, in identifier order.
    pub fn available_plugin_names(&self) -> Vec<&'static str> {
        let table = self.table.read();
        BackendId::ALL
            .into_iter()
            .filter(|id| {
                table
                    .records
                    .get(id)
                    .is_some_and(|record| record.state == PluginState::LoadedInitialized)
            })
            .map(BackendId::canonical_name)
            .collect()
    }

    /// Image name actually bound for `id`, `None` unless the backend is
    /// loaded and initialized.
    pub fn plugin_image_name(&self, id: BackendId) -> Option<String> {
        let table = self.table.read();
        table.records.get(&id).and_then(|record| {
            (record.state == PluginState::LoadedInitialized)
                .then(|| record.image_name.clone())
                .flatten()
        })
    }

    /// Dispatch: capture the published table, require a fully initialized
    /// record, and forward. The captured `Arc` keeps the backend alive for
    /// the whole call even if a concurrent reinit publishes a new table.
    pub fn with_backend<T>(
        &self,
        id: BackendId,
        call: impl FnOnce(&Arc<dyn Backend>) -> Result<T>,
    ) -> Result<T> {
        let table = Arc::clone(&self.table.read());
        let record = table.records.get(&id);
        match record {
            Some(record) if record.state == PluginState::LoadedInitialized => {
                let backend = record
                    .backend
                    .as_ref()
                    .ok_or_else(|| Error::not_available(id))?;
                call(backend)
            }
            _ => Err(Error::not_available(id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::registry::register_image;
    use blockkit_contracts::TechModes;

    struct FakeBackend {
        id: BackendId,
        probe_ok: bool,
        shutdowns: Arc<AtomicUsize>,
    }

    impl Backend for FakeBackend {
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
                    "probe refused",
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

    fn register_fake(name: &str, id: BackendId, probe_ok: bool) -> Arc<AtomicUsize> {
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let factory_shutdowns = Arc::clone(&shutdowns);
        register_image(
            name,
            Arc::new(move || {
                Arc::new(FakeBackend {
                    id,
                    probe_ok,
                    shutdowns: Arc::clone(&factory_shutdowns),
                }) as Arc<dyn Backend>
            }),
        );
        shutdowns
    }

    /// Force every identifier to a fake image named `<prefix>_<name>`.
    fn fake_force_all(prefix: &str) -> Vec<BackendSpec> {
        BackendId::ALL
            .into_iter()
            .map(|id| {
                let image = format!("{prefix}_{}", id.canonical_name());
                register_fake(&image, id, true);
                BackendSpec::with_image(id, image)
            })
            .collect()
    }

    #[test]
    fn init_marks_exactly_the_successful_identifiers() {
        let force = fake_force_all("ldr_exact");
        let loader = Loader::new();
        loader.init(&force, None).expect("all fakes load");

        for id in BackendId::ALL {
            assert!(loader.is_plugin_available(id), "{id} should be available");
        }
        let names: Vec<&str> = BackendId::ALL
            .iter()
            .map(|id| id.canonical_name())
            .collect();
        assert_eq!(loader.available_plugin_names(), names);
    }

    #[test]
    fn missing_image_only_affects_its_identifier() {
        let mut force = fake_force_all("ldr_missing");
        for spec in &mut force {
            if spec.id == BackendId::Crypto {
                spec.image = Some("does-not-exist.so".to_string());
            }
        }

        let loader = Loader::new();
        loader.init(&force, None).expect("partial success is Ok");

        assert!(!loader.is_plugin_available(BackendId::Crypto));
        assert!(loader.is_plugin_available(BackendId::Lvm));
        assert!(!loader.available_plugin_names().contains(&"crypto"));
        assert_eq!(loader.plugin_image_name(BackendId::Crypto), None);
    }

    #[test]
    fn probe_failure_keeps_backend_unavailable() {
        let mut force = fake_force_all("ldr_probe");
        register_fake("ldr_probe_refuses", BackendId::Smart, false);
        for spec in &mut force {
            if spec.id == BackendId::Smart {
                spec.image = Some("ldr_probe_refuses".to_string());
            }
        }

        let loader = Loader::new();
        loader.init(&force, None).expect("partial success is Ok");
        assert!(!loader.is_plugin_available(BackendId::Smart));

        let err = loader
            .with_backend(BackendId::Smart, |_| Ok(()))
            .expect_err("dispatch into failed plugin");
        assert_eq!(err.kind, ErrorKind::NotAvailable);
    }

    #[test]
    fn all_identifiers_failing_is_plugin_init_failed() {
        let force: Vec<BackendSpec> = BackendId::ALL
            .into_iter()
            .map(|id| BackendSpec::with_image(id, "ldr-nowhere.so"))
            .collect();

        let loader = Loader::new();
        let err = loader.init(&force, None).expect_err("nothing can load");
        assert_eq!(err.kind, ErrorKind::PluginInitFailed);
        for id in BackendId::ALL {
            assert!(err.message.contains(id.canonical_name()));
        }
        assert!(loader.available_plugin_names().is_empty());
    }

    #[test]
    fn second_init_has_no_side_effects() {
        let force = fake_force_all("ldr_twice");
        let loader = Loader::new();
        loader.init(&force, None).expect("first init");

        // different (broken) force list must be ignored
        let broken: Vec<BackendSpec> = BackendId::ALL
            .into_iter()
            .map(|id| BackendSpec::with_image(id, "ldr-nowhere.so"))
            .collect();
        loader.init(&broken, None).expect("second init is a no-op");
        assert!(loader.is_plugin_available(BackendId::Lvm));
    }

    #[test]
    fn reinit_swaps_forced_image_and_shuts_down_previous() {
        let force = fake_force_all("ldr_swap");
        let shutdowns = register_fake(
            "ldr_swap_crypto_orig",
            BackendId::Crypto,
            true,
        );
        let mut force_orig = force.clone();
        for spec in &mut force_orig {
            if spec.id == BackendId::Crypto {
                spec.image = Some("ldr_swap_crypto_orig".to_string());
            }
        }

        let loader = Loader::new();
        loader.init(&force_orig, None).expect("first cycle");
        assert_eq!(
            loader.plugin_image_name(BackendId::Crypto).as_deref(),
            Some("ldr_swap_crypto_orig")
        );

        register_fake("ldr_swap_crypto_alt", BackendId::Crypto, true);
        let mut force_alt = force.clone();
        for spec in &mut force_alt {
            if spec.id == BackendId::Crypto {
                spec.image = Some("ldr_swap_crypto_alt".to_string());
            }
        }
        loader
            .reinit(&force_alt, true, None)
            .expect("second cycle");

        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
        assert_eq!(
            loader.plugin_image_name(BackendId::Crypto).as_deref(),
            Some("ldr_swap_crypto_alt")
        );
        // every non-forced identifier is re-bound and available
        for id in BackendId::ALL {
            assert!(loader.is_plugin_available(id), "{id} after reinit");
        }
    }

    #[test]
    fn reinit_recovers_previously_unavailable_identifier() {
        let mut force = fake_force_all("ldr_recover");
        for spec in &mut force {
            if spec.id == BackendId::Nvme {
                spec.image = Some("does-not-exist.so".to_string());
            }
        }

        let loader = Loader::new();
        loader.init(&force, None).expect("partial success");
        assert!(!loader.is_plugin_available(BackendId::Nvme));

        let force = fake_force_all("ldr_recover");
        loader.reinit(&force, true, None).expect("recovery cycle");
        assert!(loader.is_plugin_available(BackendId::Nvme));
    }

    #[test]
    fn canonical_names_appear_exactly_once() {
        let force = fake_force_all("ldr_names");
        let loader = Loader::new();
        loader.init(&force, None).expect("all fakes load");

        let names = loader.available_plugin_names();
        for id in BackendId::ALL {
            assert_eq!(
                names
                    .iter()
                    .filter(|name| **name == id.canonical_name())
                    .count(),
                1
            );
        }
    }
}
