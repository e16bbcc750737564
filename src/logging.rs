use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing for hosts that embed the engine.
///
/// - Stdout: compact, human-readable
/// - Default level: INFO, override via RUST_LOG env
///
/// Optional: hosts with their own subscriber should skip this and the
/// engine's spans will flow into theirs.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,roundtable_engine=debug"));

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();

    tracing::debug!("Tracing initialized");
}
