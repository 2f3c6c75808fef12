//! Shared setup for unit and integration tests.

use std::env;
use std::sync::Once;

use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

static TEST_SETUP: Once = Once::new();

/// Installs a stderr tracing subscriber once per test binary.
///
/// Defaults to `semtree=trace`; set `RUST_LOG` to narrow it down.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let filter = env::var("RUST_LOG")
            .ok()
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new("semtree=trace"));

        let installed = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(filter),
            )
            .try_init();

        match installed {
            Ok(()) => info!("test tracing installed"),
            Err(e) => eprintln!("tracing subscriber already set: {}", e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_repeated_calls_when_initializing_then_setup_runs_once() {
        init_test_setup();
        init_test_setup();

        assert!(TEST_SETUP.is_completed());
    }
}
