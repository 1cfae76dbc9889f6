//! Logging setup for the binary.
//!
//! Logs go to stderr so generated SQL on stdout stays clean. The level for
//! this crate comes from `RELATIONAL_MODEL_LOG` (default `warn`); `RUST_LOG`
//! directives are honored as well and win for any crate they name.

use std::io::IsTerminal;
use std::sync::Once;

use tracing_subscriber::{EnvFilter, filter::LevelFilter};

static LOG_ENV_VAR: &str = "RELATIONAL_MODEL_LOG";
const CRATE_NAME: &str = "relational_model";

/// Install the global subscriber. Safe to call more than once.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (env_filter, log_level) = env_filter_and_log_level();

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();

        tracing::debug!("log level: {}", log_level);
    });
}

fn env_filter_and_log_level() -> (EnvFilter, String) {
    let directive_string = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let mut env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::ERROR.into())
        .parse_lossy(&directive_string);

    let log_level = std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| "warn".to_string());

    if !directive_string.contains(&format!("{CRATE_NAME}=")) {
        match format!("{CRATE_NAME}={log_level}").parse() {
            Ok(directive) => env_filter = env_filter.add_directive(directive),
            Err(_) => env_filter = env_filter.add_directive(LevelFilter::WARN.into()),
        }
    }

    (env_filter, log_level)
}
