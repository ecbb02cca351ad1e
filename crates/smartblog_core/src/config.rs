//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_AUTOSAVE_DELAY_MS, DEFAULT_NOTICE_LIMIT, DEFAULT_TITLE_SAVE_DELAY_MS,
};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Runtime configuration for an editing session.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub autosave_delay_ms: u64,
    pub title_save_delay_ms: u64,
    pub notice_limit: usize,
    pub autosave_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
            title_save_delay_ms: DEFAULT_TITLE_SAVE_DELAY_MS,
            notice_limit: DEFAULT_NOTICE_LIMIT,
            autosave_enabled: true,
        }
    }
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment, falling back to `default` when
/// the variable is missing or unrecognized.
pub fn env_flag_or(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|raw| raw.trim().parse().ok())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing
    /// or fail to parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            autosave_delay_ms: env_parse("SMARTBLOG_AUTOSAVE_DELAY_MS")
                .unwrap_or(defaults.autosave_delay_ms),
            title_save_delay_ms: env_parse("SMARTBLOG_TITLE_SAVE_DELAY_MS")
                .unwrap_or(defaults.title_save_delay_ms),
            notice_limit: env_parse::<usize>("SMARTBLOG_NOTICE_LIMIT")
                .filter(|limit| *limit > 0)
                .unwrap_or(defaults.notice_limit),
            autosave_enabled: env_flag_or("SMARTBLOG_AUTOSAVE", defaults.autosave_enabled),
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    pub fn title_save_delay(&self) -> Duration {
        Duration::from_millis(self.title_save_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    /// Restores the previous value of `key` on drop.
    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl EnvGuard {
        #[allow(unused_unsafe)]
        fn set(key: &'static str, value: &str) -> Self {
            let previous = env::var(key).ok();
            // SAFETY: env mutation is serialized through `env_lock`.
            unsafe { env::set_var(key, value) };
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        #[allow(unused_unsafe)]
        fn drop(&mut self) {
            // SAFETY: env mutation is serialized through `env_lock`.
            unsafe {
                match self.previous.as_deref() {
                    Some(previous) => env::set_var(self.key, previous),
                    None => env::remove_var(self.key),
                }
            }
        }
    }

    #[test]
    fn parse_env_flag_accepts_truthy_and_falsy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert_eq!(parse_env_flag(value), Some(true), "value: {}", value);
        }
        for value in ["", "0", "false", " no ", "OFF"] {
            assert_eq!(parse_env_flag(value), Some(false), "value: {}", value);
        }
        assert_eq!(parse_env_flag("maybe"), None);
    }

    #[test]
    fn from_env_reads_overrides() {
        let _lock = env_lock().lock().expect("env lock");
        let _delay = EnvGuard::set("SMARTBLOG_AUTOSAVE_DELAY_MS", "250");
        let _title = EnvGuard::set("SMARTBLOG_TITLE_SAVE_DELAY_MS", " 40 ");
        let _autosave = EnvGuard::set("SMARTBLOG_AUTOSAVE", "off");

        let config = Config::from_env();
        assert_eq!(config.autosave_delay(), Duration::from_millis(250));
        assert_eq!(config.title_save_delay(), Duration::from_millis(40));
        assert!(!config.autosave_enabled);
    }

    #[test]
    fn from_env_falls_back_on_garbage() {
        let _lock = env_lock().lock().expect("env lock");
        let _delay = EnvGuard::set("SMARTBLOG_AUTOSAVE_DELAY_MS", "soon");
        let _limit = EnvGuard::set("SMARTBLOG_NOTICE_LIMIT", "0");
        let _autosave = EnvGuard::set("SMARTBLOG_AUTOSAVE", "sometimes");

        let config = Config::from_env();
        assert_eq!(config.autosave_delay_ms, DEFAULT_AUTOSAVE_DELAY_MS);
        assert_eq!(config.notice_limit, DEFAULT_NOTICE_LIMIT);
        assert!(config.autosave_enabled);
    }
}
