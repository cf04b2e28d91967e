// SPDX-License-Identifier: GPL-3.0-only

//! Loader lifecycle against the process-wide façade: partial failure,
//! forced-image substitution and reinit semantics.

use std::sync::Mutex;
use std::sync::atomic::Ordering;

use blockkit::BackendId;
use blockkit_testing::{force_all_stubs, register_stub};

/// The façade drives one process-wide loader; these tests serialize on a
/// shared lock because they reinit it.
static LOADER_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn forced_missing_image_fails_only_its_identifier() {
    let _guard = LOADER_LOCK.lock().unwrap();
    blockkit_testing::init_tracing();

    let mut force = force_all_stubs("it_partial");
    for spec in &mut force {
        if spec.id == BackendId::Crypto {
            spec.image = Some("does-not-exist.so".to_string());
        }
    }

    blockkit::init(&force, None).expect("partial failure is still Ok");

    assert!(!blockkit::is_plugin_available(BackendId::Crypto));
    assert!(blockkit::is_plugin_available(BackendId::Lvm));
    assert!(blockkit::is_plugin_available(BackendId::Part));

    let names = blockkit::available_plugin_names();
    assert!(!names.contains(&"crypto"));
    assert!(names.contains(&"lvm"));

    // dispatch into the unavailable backend is NotAvailable
    let err = blockkit::crypto::is_luks("/dev/null").expect_err("crypto is not loaded");
    assert_eq!(err.kind, blockkit::ErrorKind::NotAvailable);
    assert!(err.message.contains("crypto"));

    // the canonical name query works regardless of load state
    assert_eq!(blockkit::plugin_canonical_name(BackendId::Crypto), "crypto");
}

#[test]
fn reinit_binds_the_alternate_image() {
    let _guard = LOADER_LOCK.lock().unwrap();

    let force = force_all_stubs("it_swap");
    // make sure some cycle ran; a previous test may already have
    // initialized the process-wide loader
    let _ = blockkit::init(&force, None);

    let shutdowns = register_stub("it_swap_crypto_alt", BackendId::Crypto, true);
    let mut force_alt = force_all_stubs("it_swap");
    for spec in &mut force_alt {
        if spec.id == BackendId::Crypto {
            spec.image = Some("it_swap_crypto_alt".to_string());
        }
    }

    blockkit::reinit(&force_alt, true, None).expect("reinit cycle");

    assert_eq!(
        blockkit::plugin_image_name(BackendId::Crypto).as_deref(),
        Some("it_swap_crypto_alt")
    );
    // every non-forced identifier is re-bound and available again
    for id in BackendId::ALL {
        assert!(blockkit::is_plugin_available(id), "{id} after reinit");
    }
    // names appear exactly once, in identifier order
    let names = blockkit::available_plugin_names();
    let expected: Vec<&str> = BackendId::ALL.iter().map(|id| id.canonical_name()).collect();
    assert_eq!(names, expected);

    // the alternate image was freshly constructed, nothing of it was
    // shut down yet
    assert_eq!(shutdowns.load(Ordering::SeqCst), 0);

    // a further reinit recovers an identifier that previously failed
    let mut force_broken = force_all_stubs("it_swap");
    for spec in &mut force_broken {
        if spec.id == BackendId::Nvme {
            spec.image = Some("does-not-exist.so".to_string());
        }
    }
    blockkit::reinit(&force_broken, true, None).expect("cycle with broken nvme");
    assert!(!blockkit::is_plugin_available(BackendId::Nvme));

    blockkit::reinit(&force_all_stubs("it_swap"), true, None).expect("recovery cycle");
    assert!(blockkit::is_plugin_available(BackendId::Nvme));
}

#[test]
fn log_sink_receives_loader_warnings() {
    let _guard = LOADER_LOCK.lock().unwrap();

    use std::sync::Arc;
    let messages: Arc<Mutex<Vec<(i32, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink_messages = Arc::clone(&messages);

    let mut force = force_all_stubs("it_sink");
    for spec in &mut force {
        if spec.id == BackendId::Smart {
            spec.image = Some("does-not-exist.so".to_string());
        }
    }

    blockkit::reinit(
        &force,
        true,
        Some(Arc::new(move |level, msg| {
            sink_messages.lock().unwrap().push((level, msg.to_string()));
        })),
    )
    .expect("cycle with one failure");

    let messages = messages.lock().unwrap();
    assert!(
        messages
            .iter()
            .any(|(level, msg)| *level == 4 && msg.contains("smart")),
        "expected a WARNING naming the failed plugin, got {messages:?}"
    );
}
