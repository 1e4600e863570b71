//! Process-entry-point logging setup.
//!
//! Must be called exactly once, from the binary's `main`, never from a
//! library crate — process-wide state like this has no place baked into
//! the core.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
