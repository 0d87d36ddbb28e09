use std::time::Duration;

pub const LEGACY_FALLBACK_ENV: &str = "AMBIT_REQUEST_CONTEXT_LEGACY_FALLBACK";
pub const DRAIN_TIMEOUT_ENV: &str = "AMBIT_WAIT_UNTIL_DRAIN_MS";

const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Read the deprecated legacy slot when the primary one is empty.
    pub legacy_fallback: bool,
    pub drain_timeout_ms: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            legacy_fallback: true,
            drain_timeout_ms: DEFAULT_DRAIN_TIMEOUT_MS,
        }
    }
}

impl ContextConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Malformed values are logged and
    /// replaced by their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let legacy_fallback = match lookup(LEGACY_FALLBACK_ENV) {
            Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    value=%raw,
                    "invalid {LEGACY_FALLBACK_ENV}, expected true/false"
                );
                defaults.legacy_fallback
            }),
            None => defaults.legacy_fallback,
        };

        let drain_timeout_ms = match lookup(DRAIN_TIMEOUT_ENV) {
            Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
                tracing::warn!(value=%raw, "invalid {DRAIN_TIMEOUT_ENV}, using default");
                defaults.drain_timeout_ms
            }),
            None => defaults.drain_timeout_ms,
        };

        if !legacy_fallback {
            tracing::info!("legacy request context slot disabled");
        }

        Self {
            legacy_fallback,
            drain_timeout_ms,
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
