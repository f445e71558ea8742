use tracing_subscriber::EnvFilter;

/// Initialise logging. The default level is `info`; passing `debug = true`
/// raises it to `debug` and lets `RUST_LOG` override the filter.
pub fn init(debug: bool) {
    // With debug off, force `info` regardless of `RUST_LOG` so a stray
    // environment variable cannot flood the host's log.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init();
}
