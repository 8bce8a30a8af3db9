use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Installs the global subscriber once. Levels come from `ULTRASAFE_LOG`
/// (e.g. `ULTRASAFE_LOG=ultrasafe=debug`), falling back to `ultrasafe=info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("ULTRASAFE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("ultrasafe=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .with(filter)
            .init();
    });
}
