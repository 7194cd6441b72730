use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber used by the binaries.
///
/// `verbosity` counts `-d` flags: none shows warnings, then info, debug and
/// trace. `RUST_LOG` takes precedence when set.
pub fn init(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}
