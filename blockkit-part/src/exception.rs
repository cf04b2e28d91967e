// SPDX-License-Identifier: GPL-3.0-only

//! Exception capture from the table-I/O layer
//!
//! The I/O layer signals anomalies through a single process-global
//! callback, mirroring the exception model of callback-driven partition
//! libraries. The engine's handler copies the message into a thread-local
//! slot and answers [`ExceptionResolution::Unhandled`], which makes the
//! failing call return failure; the engine then drains the slot into its
//! own diagnostic. The slot is strictly per-thread.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::RwLock;

/// What the handler decided about an anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionResolution {
    /// Not handled; the raising call must fail.
    Unhandled,
    /// Handled; the raising call may continue.
    Ignored,
}

pub type ExceptionHandler = Arc<dyn Fn(&str) -> ExceptionResolution + Send + Sync>;

static HANDLER: RwLock<Option<ExceptionHandler>> = RwLock::new(None);

thread_local! {
    static SLOT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Install (or with `None` remove) the process-global handler.
pub fn set_exception_handler(handler: Option<ExceptionHandler>) {
    *HANDLER.write() = handler;
}

/// Report an anomaly from inside the I/O layer. With no handler installed
/// the anomaly is unhandled.
pub fn raise(message: &str) -> ExceptionResolution {
    let handler = HANDLER.read();
    match handler.as_ref() {
        Some(handler) => handler(message),
        None => ExceptionResolution::Unhandled,
    }
}

/// The engine's capturing handler: store the message for the current
/// thread, report unhandled.
pub fn capturing_handler() -> ExceptionHandler {
    Arc::new(|message| {
        SLOT.with(|slot| {
            *slot.borrow_mut() = Some(message.to_string());
        });
        ExceptionResolution::Unhandled
    })
}

/// Clear the current thread's slot. Every engine operation starts here.
pub fn clear_slot() {
    SLOT.with(|slot| slot.borrow_mut().take());
}

/// Consume the current thread's slot.
pub fn drain_slot() -> Option<String> {
    SLOT.with(|slot| slot.borrow_mut().take())
}

/// Serializes tests that swap the process-global handler.
#[cfg(test)]
pub(crate) static TEST_HANDLER_LOCK: parking_lot::Mutex<()> = parking_lot::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captured_message_is_per_thread() {
        let _guard = TEST_HANDLER_LOCK.lock();
        set_exception_handler(Some(capturing_handler()));

        clear_slot();
        raise("local anomaly");

        let other = std::thread::spawn(|| {
            clear_slot();
            raise("remote anomaly");
            drain_slot()
        })
        .join()
        .expect("thread joins");

        assert_eq!(other.as_deref(), Some("remote anomaly"));
        assert_eq!(drain_slot().as_deref(), Some("local anomaly"));
        assert_eq!(drain_slot(), None);

        set_exception_handler(None);
    }

    #[test]
    fn raise_without_handler_is_unhandled() {
        let _guard = TEST_HANDLER_LOCK.lock();
        set_exception_handler(None);
        assert_eq!(raise("nobody listens"), ExceptionResolution::Unhandled);
    }
}
