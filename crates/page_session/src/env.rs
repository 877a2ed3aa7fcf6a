//! Env-var knobs. A missing or unparsable value falls back to the default.

use std::env;
use std::str::FromStr;

pub fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub fn env_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

pub fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key).map(|v| v.trim().to_ascii_lowercase()) {
        Ok(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Ok(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

/// Comma separated list; blank entries are dropped.
pub fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => split_list(&v),
        _ => default.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_drops_blanks() {
        assert_eq!(split_list(" MMR, ,MMK ,"), vec!["MMR", "MMK"]);
    }

    #[test]
    fn missing_keys_use_defaults() {
        assert_eq!(env_parse("PAGE_SESSION_TEST_MISSING_NUM", 42u32), 42);
        assert!(env_bool("PAGE_SESSION_TEST_MISSING_BOOL", true));
        assert_eq!(env_list("PAGE_SESSION_TEST_MISSING_LIST", &["a"]), vec!["a"]);
    }
}
