#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    str::FromStr,
    sync::{Arc, Mutex, OnceLock},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::constants::{
    DEFAULT_COOLOFF_STRUCTURE_MINUTES, DEFAULT_MAX_MEMORY_MB, DEFAULT_TOO_MUCH_OUTPUT_THRESHOLD,
    HIDDEN_TEST_PREFIX, TEACHER_TEST_PREFIX,
};

/// Values the evaluation pipeline reads from configuration. Passed explicitly
/// so that callers (and tests) never depend on the process environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(default, setter(into)))]
#[builder(doc)]
pub struct EvalSettings {
    /// Builds printing at least this many lines are rejected unparsed.
    #[builder(default = DEFAULT_TOO_MUCH_OUTPUT_THRESHOLD)]
    pub too_much_output_threshold: usize,
    /// Cap on the cooloff after a structure or compilation failure.
    #[builder(default = DEFAULT_COOLOFF_STRUCTURE_MINUTES)]
    pub cooloff_structure_minutes: i64,
    /// Memory budget used when the assignment does not set one.
    #[builder(default = DEFAULT_MAX_MEMORY_MB)]
    pub default_max_memory_mb:     u32,
    /// Class-name prefix of public teacher tests.
    #[builder(default = TEACHER_TEST_PREFIX.to_string())]
    pub teacher_prefix:            String,
    /// Class-name prefix of hidden teacher tests.
    #[builder(default = HIDDEN_TEST_PREFIX.to_string())]
    pub hidden_prefix:             String,
}

impl Default for EvalSettings {
    fn default() -> Self {
        EvalSettings::builder().build()
    }
}

/// Runtime configuration shared across the crate.
pub struct ConfigState {
    /// Settings handed to the evaluation pipeline.
    settings: EvalSettings,
}

impl ConfigState {
    /// Construct a new configuration instance from the environment.
    fn new() -> Result<Self> {
        let settings = EvalSettings::builder()
            .too_much_output_threshold(read_env_or(
                "DROPGRADE_TOO_MUCH_OUTPUT_THRESHOLD",
                DEFAULT_TOO_MUCH_OUTPUT_THRESHOLD,
            )?)
            .cooloff_structure_minutes(read_env_or(
                "DROPGRADE_COOLOFF_STRUCTURE_MINUTES",
                DEFAULT_COOLOFF_STRUCTURE_MINUTES,
            )?)
            .default_max_memory_mb(read_env_or(
                "DROPGRADE_DEFAULT_MAX_MEMORY_MB",
                DEFAULT_MAX_MEMORY_MB,
            )?)
            .teacher_prefix(read_prefix("DROPGRADE_TEACHER_PREFIX", TEACHER_TEST_PREFIX))
            .hidden_prefix(read_prefix("DROPGRADE_HIDDEN_PREFIX", HIDDEN_TEST_PREFIX))
            .build();

        Ok(Self { settings })
    }

    /// Returns the evaluation settings.
    pub fn settings(&self) -> &EvalSettings {
        &self.settings
    }
}

/// Shared configuration handle used throughout the crate.
#[derive(Clone)]
pub struct ConfigHandle(Arc<ConfigState>);

impl std::ops::Deref for ConfigHandle {
    type Target = ConfigState;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Global storage for the lazily constructed configuration state.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<ConfigState>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<ConfigState>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Ensure the global configuration has been initialized and return a handle.
pub fn ensure_initialized() -> Result<ConfigHandle> {
    let slot = slot();
    let mut guard = slot.lock().expect("config slot poisoned");
    if let Some(cfg) = guard.as_ref() {
        return Ok(ConfigHandle(Arc::clone(cfg)));
    }

    let cfg = Arc::new(ConfigState::new()?);
    *guard = Some(Arc::clone(&cfg));
    Ok(ConfigHandle(cfg))
}

/// Returns the active configuration, initializing it on demand.
pub fn get() -> Result<ConfigHandle> {
    ensure_initialized()
}

/// Returns a copy of the configured evaluation settings.
pub fn eval_settings() -> Result<EvalSettings> {
    Ok(get()?.settings().clone())
}

/// Reads a numeric environment variable, falling back to `default` when unset
/// or blank.
fn read_env_or<T>(env: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(env) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{env} must be a number, got `{value}`")),
        _ => Ok(default),
    }
}

/// Reads a test-class prefix from the environment.
fn read_prefix(env: &str, default: &str) -> String {
    std::env::var(env)
        .map(|value| value.trim().to_owned())
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = EvalSettings::default();
        assert_eq!(settings.too_much_output_threshold, 30_000);
        assert_eq!(settings.cooloff_structure_minutes, 2);
        assert_eq!(settings.default_max_memory_mb, 512);
        assert_eq!(settings.teacher_prefix, "TestTeacher");
        assert_eq!(settings.hidden_prefix, "TestTeacherHidden");
    }

    #[test]
    fn unset_variables_fall_back() {
        let value: usize =
            read_env_or("DROPGRADE_SURELY_UNSET_VARIABLE", 7).expect("fallback value");
        assert_eq!(value, 7);
        assert_eq!(read_prefix("DROPGRADE_SURELY_UNSET_PREFIX", "TestX"), "TestX");
    }
}
