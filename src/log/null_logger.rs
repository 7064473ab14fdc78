//! A logger that writes nothing but still honors the configured maximum level, so the
//! `log` macros short-circuit the way they do with the console logger installed.

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
