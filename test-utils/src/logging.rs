use tracing_subscriber::EnvFilter;

/// Installs a test subscriber once per process.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`, so factory debug logs
/// only show up when asked for.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_test_writer()
        .try_init();
}
