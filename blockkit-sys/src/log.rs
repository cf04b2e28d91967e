// SPDX-License-Identifier: GPL-3.0-only

//! Process-wide log sink
//!
//! `blockkit::init` installs the caller's sink here; everything the
//! library logs flows through [`message`], which forwards to the sink and
//! mirrors the event into `tracing` at the mapped level. A `None` sink
//! disables the callback path; the `tracing` mirror stays.

use parking_lot::RwLock;

use blockkit_contracts::LogSink;
use blockkit_contracts::logging::{self, LOG_DEBUG, LOG_ERR, LOG_INFO, LOG_NOTICE, LOG_WARNING};

static SINK: RwLock<Option<LogSink>> = RwLock::new(None);

/// Replace the process-wide sink. Passing `None` disables it.
pub fn set_sink(sink: Option<LogSink>) {
    *SINK.write() = sink;
}

/// Log `msg` at a syslog `level` (out-of-range levels are clamped).
pub fn message(level: i32, msg: &str) {
    let level = logging::clamp_level(level);
    match level {
        l if l <= LOG_ERR => tracing::error!("{msg}"),
        LOG_WARNING => tracing::warn!("{msg}"),
        LOG_NOTICE | LOG_INFO => tracing::info!("{msg}"),
        _ => tracing::debug!("{msg}"),
    }

    let sink = SINK.read();
    if let Some(sink) = sink.as_ref() {
        sink(level, msg);
    }
}

pub fn warn(msg: &str) {
    message(LOG_WARNING, msg);
}

pub fn info(msg: &str) {
    message(LOG_INFO, msg);
}

pub fn debug(msg: &str) {
    message(LOG_DEBUG, msg);
}
