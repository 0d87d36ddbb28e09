use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for a process hosting request contexts.
///
/// - `service_name`: identifies this component in the startup log line
/// - `log_format`: `"json"` for structured output, anything else for human text
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Returns `false` when a
/// global subscriber was already installed.
pub fn init_tracing(service_name: &str, log_format: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .is_ok()
    };

    if installed {
        tracing::info!(service_name, log_format, "tracing initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_is_idempotent() {
        let _ = init_tracing("ambit-test", "text");
        assert!(!init_tracing("ambit-test", "json"));
    }
}
