//! Logging for the simulation engine. This is diagnostic output about what the engine is
//! doing, not data collection: per-tick state for analysis is delivered through
//! `Model::subscribe_to_tick_end`.
//!
//! The module (re)exports the five logging macros `error!`, `warn!`, `info!`, `debug!` and
//! `trace!`. The engine logs model construction at `info`, one state-count line per tick at
//! `debug`, and individual infections and recoveries at `trace`.
//!
//! Logging is _disabled_ by default. It is configured through a global configuration:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!  - `set_module_filter()` / `set_module_filters()` / `remove_module_filter()`: per-module levels
//!
//! The runner's `--log-level` option accepts a filter string such as `info,sirv::agent=trace`,
//! parsed by [`parse_log_spec`].
//!
//! ```rust
//! use sirv::log::{set_log_level, set_module_filter, LevelFilter};
//!
//! // Per-tick counts, but every infection from the agent module.
//! set_log_level(LevelFilter::Debug);
//! set_module_filter("sirv::agent", LevelFilter::Trace);
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use std::collections::hash_map::Entry;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard};

pub use log::{debug, error, info, trace, warn, LevelFilter};
#[cfg(feature = "logging")]
use log4rs::Handle;

use crate::error::SirvError;
use crate::hashing::HashMap;

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// Holds the global level, the per-module levels, and a handle to the installed logger.
///
/// Loggers are installed process-wide, so only the singleton above exists. The public API
/// is the set of free functions below.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// Level for modules without their own filter. `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    /// Module path to maximum level.
    pub(in crate::log) module_filters: HashMap<String, LevelFilter>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_filters: HashMap::default(),
            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_filters.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() == level {
                    return false;
                }
                entry.insert(level);
            }
            Entry::Vacant(entry) => {
                entry.insert(level);
            }
        }
        true
    }

    fn set_module_filters(&mut self, module_filters: &[(&str, LevelFilter)]) {
        let mut mutated = false;
        for (module, level) in module_filters {
            mutated |= self.insert_module_filter(module, *level);
        }
        if mutated {
            self.set_config();
        }
    }

    fn remove_module_filter(&mut self, module: &str) {
        if self.module_filters.remove(module).is_some() {
            self.set_config();
        }
    }
}

/// A parsed `--log-level` value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogSpec {
    /// Global level, if the filter string named one.
    pub level: Option<LevelFilter>,
    pub module_filters: Vec<(String, LevelFilter)>,
}

impl LogSpec {
    /// Installs these levels in the global configuration.
    pub fn apply(&self) {
        let mut log_configuration = get_log_configuration();
        let filters: Vec<(&str, LevelFilter)> = self
            .module_filters
            .iter()
            .map(|(module, level)| (module.as_str(), *level))
            .collect();
        for (module, level) in &filters {
            log_configuration.insert_module_filter(module, *level);
        }
        // A module filter alone still needs a logger to print anything.
        let level = self.level.unwrap_or(log_configuration.global_log_level);
        log_configuration.set_log_level(level);
    }
}

fn parse_level(value: &str) -> Result<LevelFilter, SirvError> {
    LevelFilter::from_str(value.trim()).map_err(|_| {
        SirvError::ConfigurationError(format!("unknown log level `{}`", value.trim()))
    })
}

/// Parses a comma-separated log filter string: a bare level (`info`) sets the global level
/// and `module=level` (`sirv::agent=trace`) sets a module filter. Levels are
/// case-insensitive.
///
/// # Errors
///
/// Returns `SirvError::ConfigurationError` for an unknown level or an empty module name.
pub fn parse_log_spec(spec: &str) -> Result<LogSpec, SirvError> {
    let mut parsed = LogSpec::default();
    for directive in spec.split(',').map(str::trim).filter(|d| !d.is_empty()) {
        match directive.split_once('=') {
            Some((module, level)) => {
                let module = module.trim();
                if module.is_empty() {
                    return Err(SirvError::ConfigurationError(format!(
                        "missing module name in log directive `{directive}`"
                    )));
                }
                parsed
                    .module_filters
                    .push((module.to_string(), parse_level(level)?));
            }
            None => parsed.level = Some(parse_level(directive)?),
        }
    }
    Ok(parsed)
}

// The public API

/// Enables the logger with no global level filter / full logging. Equivalent to
/// `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filters(&[(module_path, level_filter)]);
}

/// Sets the level filters for a set of modules in one reconfiguration.
pub fn set_module_filters(module_filters: &[(&str, LevelFilter)]) {
    get_log_configuration().set_module_filters(module_filters);
}

/// Removes a module-specific level filter. The global level filter will apply to the module.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}
