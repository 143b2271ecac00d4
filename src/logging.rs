use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber for the binaries.
///
/// The level comes from `RUST_LOG` (default `info`), e.g.
/// `RUST_LOG=capacity_forecast=debug` to see per-computation spans.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Verbose subscriber captured by the test harness. Safe to call from every test.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
