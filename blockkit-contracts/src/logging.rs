// SPDX-License-Identifier: GPL-3.0-only

//! Log sink contract
//!
//! The library logs through a single injectable callback installed at
//! init. Levels follow syslog semantics; sub-loggers of wrapped tools
//! translate their native levels onto this scale, clamping anything finer
//! than debug to debug.

use std::sync::Arc;

/// Process-wide log callback: `(level, message)`.
pub type LogSink = Arc<dyn Fn(i32, &str) + Send + Sync>;

pub const LOG_EMERG: i32 = 0;
pub const LOG_ALERT: i32 = 1;
pub const LOG_CRIT: i32 = 2;
pub const LOG_ERR: i32 = 3;
pub const LOG_WARNING: i32 = 4;
pub const LOG_NOTICE: i32 = 5;
pub const LOG_INFO: i32 = 6;
pub const LOG_DEBUG: i32 = 7;

/// Clamp a translated level into the syslog range.
pub fn clamp_level(level: i32) -> i32 {
    level.clamp(LOG_EMERG, LOG_DEBUG)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_above_debug_clamp_to_debug() {
        assert_eq!(clamp_level(9), LOG_DEBUG);
        assert_eq!(clamp_level(-1), LOG_EMERG);
        assert_eq!(clamp_level(LOG_INFO), LOG_INFO);
    }
}
