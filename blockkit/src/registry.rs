// SPDX-License-Identifier: GPL-3.0-only

//! Image registry
//!
//! Backends are bound by *image name*: the loader resolves the requested
//! name here and constructs the backend through the registered factory.
//! Resolution failing for one name never affects other identifiers. The
//! registry is pre-populated with the default image of every identifier;
//! alternates (and test doubles) can be registered at runtime and forced
//! in through an init force list.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use blockkit_backends::{
    BtrfsBackend, CryptoBackend, DmBackend, FsBackend, LoopBackend, LvmBackend, MdBackend,
    MpathBackend, NvdimmBackend, NvmeBackend, S390Backend, SmartBackend, SwapBackend,
};
use blockkit_contracts::Backend;
use blockkit_part::PartBackend;
use blockkit_types::BackendId;

/// Constructs a backend instance; the "symbol resolution" step of
/// loading an image.
pub type ImageFactory = Arc<dyn Fn() -> Arc<dyn Backend> + Send + Sync>;

static IMAGES: RwLock<Option<HashMap<String, ImageFactory>>> = RwLock::new(None);

fn builtin_images() -> HashMap<String, ImageFactory> {
    let mut images: HashMap<String, ImageFactory> = HashMap::new();

    images.insert(
        BackendId::Lvm.default_image().to_string(),
        Arc::new(|| Arc::new(LvmBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Btrfs.default_image().to_string(),
        Arc::new(|| Arc::new(BtrfsBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Swap.default_image().to_string(),
        Arc::new(|| Arc::new(SwapBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Loop.default_image().to_string(),
        Arc::new(|| Arc::new(LoopBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Crypto.default_image().to_string(),
        Arc::new(|| Arc::new(CryptoBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Mpath.default_image().to_string(),
        Arc::new(|| Arc::new(MpathBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Dm.default_image().to_string(),
        Arc::new(|| Arc::new(DmBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::MdRaid.default_image().to_string(),
        Arc::new(|| Arc::new(MdBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::S390.default_image().to_string(),
        Arc::new(|| Arc::new(S390Backend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Part.default_image().to_string(),
        Arc::new(|| Arc::new(PartBackend::with_default_io()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Fs.default_image().to_string(),
        Arc::new(|| Arc::new(FsBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Nvdimm.default_image().to_string(),
        Arc::new(|| Arc::new(NvdimmBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Nvme.default_image().to_string(),
        Arc::new(|| Arc::new(NvmeBackend::new()) as Arc<dyn Backend>),
    );
    images.insert(
        BackendId::Smart.default_image().to_string(),
        Arc::new(|| Arc::new(SmartBackend::new()) as Arc<dyn Backend>),
    );

    images
}

/// Register an image under `name`, replacing any previous registration.
pub fn register_image(name: &str, factory: ImageFactory) {
    let mut images = IMAGES.write();
    images
        .get_or_insert_with(builtin_images)
        .insert(name.to_string(), factory);
}

/// Resolve an image name to its factory.
pub fn resolve_image(name: &str) -> Option<ImageFactory> {
    let mut images = IMAGES.write();
    images.get_or_insert_with(builtin_images).get(name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockkit_contracts::{Result, TechModes};

    struct NullBackend;

    impl Backend for NullBackend {
        fn id(&self) -> BackendId {
            BackendId::Crypto
        }
        fn probe_dependencies(&self) -> Result<()> {
            Ok(())
        }
        fn initialize(&self) -> Result<()> {
            Ok(())
        }
        fn shutdown(&self) {}
        fn is_tech_available(&self, _tech: u32, _modes: TechModes) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn every_default_image_is_registered() {
        for id in BackendId::ALL {
            assert!(
                resolve_image(id.default_image()).is_some(),
                "missing default image for {id}"
            );
        }
    }

    #[test]
    fn unknown_images_do_not_resolve() {
        assert!(resolve_image("does-not-exist.so").is_none());
    }

    #[test]
    fn runtime_registration_overrides() {
        register_image("registry_test_alt", Arc::new(|| Arc::new(NullBackend) as Arc<dyn Backend>));
        let factory = resolve_image("registry_test_alt").expect("registered image");
        assert_eq!(factory().id(), BackendId::Crypto);
    }
}
