use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a global subscriber honoring `RUST_LOG` (default `info`).
///
/// The engine itself only emits events; hosts that already install a
/// subscriber should not call this. Returns `false` if one was already set.
pub fn init_tracing(json: bool) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };

    result.is_ok()
}
