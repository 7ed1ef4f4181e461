//! Structured logging bootstrap.
//!
//! Mirrors the reference lineage's `logging` feature: a JSON `tracing`
//! subscriber behind a Cargo feature, controlled by an environment variable,
//! with a no-op fallback so the library never forces a subscriber on a
//! consumer that wants its own.

/// Environment variable controlling the log filter, e.g. `KINETOSCOPE_LOG=debug`.
pub const LOG_ENV_VAR: &str = "KINETOSCOPE_LOG";

#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init_logging() {
    // No subscriber installed; callers who want `tracing` output wire up their
    // own, same as a library build without the `logging` feature enabled.
}
