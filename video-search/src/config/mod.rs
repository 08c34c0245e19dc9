//! Configuration and dependency initialization.

mod dependencies;

pub use dependencies::{ConnectionMode, Dependencies};

use std::env;
use std::str::FromStr;
use tracing::warn;

/// Read an environment variable, falling back to `default` when unset.
pub fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an environment variable, falling back to `default` when unset or invalid.
pub fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

/// Read a boolean flag. Accepts `true/false`, `1/0`, `yes/no` and `on/off`.
pub fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
            warn!(variable = name, value = %raw, "Invalid flag, using default");
            default
        }),
        Err(_) => default,
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a comma separated list, dropping empty entries.
pub fn env_list(name: &str, default: &str) -> Vec<String> {
    env_or(name, default)
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_unset_variables_use_defaults() {
        assert!(env_flag("VIDEO_SEARCH_TEST_UNSET_FLAG", true));
        assert_eq!(env_parse("VIDEO_SEARCH_TEST_UNSET_PORT", 8080u16), 8080);
        assert_eq!(
            env_list("VIDEO_SEARCH_TEST_UNSET_TOPICS", "a, b,,c"),
            vec!["a", "b", "c"]
        );
    }
}
