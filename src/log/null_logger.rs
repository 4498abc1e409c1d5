//! Used when the `logging` feature is disabled. Messages go nowhere, but the configuration API
//! keeps working and the `log` crate's max level still tracks the requested level.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
