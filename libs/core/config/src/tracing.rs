use crate::{env_flag, Environment};
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations. Safe to call
/// multiple times.
///
/// Configuration:
/// - Shows file:line where errors occur
/// - Hides environment variables (less noise)
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Default filter directive when `RUST_LOG` is not set.
///
/// `verbose` (or `DEBUG=true`) raises the level to debug.
pub fn default_directive(environment: &Environment, verbose: bool) -> &'static str {
    if verbose || env_flag("DEBUG") {
        "debug"
    } else if environment.is_production() {
        "warn"
    } else {
        "info"
    }
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// Logs go to stderr so that stdout stays reserved for command output.
///
/// - **Production** (`APP_ENV=production`):
///   - JSON format for log aggregation
///   - Hides module targets
///
/// - **Development** (default):
///   - Pretty-printed format
///
/// Both include the ErrorLayer, so eyre reports carry the span trace of
/// where an error happened.
///
/// Environment variables:
/// - `APP_ENV`: Set to "production" for JSON logs (default: "development")
/// - `RUST_LOG`: Override log levels (e.g., "debug", "domain_ip_costs=trace")
/// - `DEBUG`: "true" raises the default level to debug
///
/// Safe to call multiple times; later calls are no-ops.
pub fn init_tracing(environment: &Environment, verbose: bool) {
    let is_production = environment.is_production();
    let directive = default_directive(environment, verbose);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => {
            info!(
                "Tracing initialized with ErrorLayer. Environment: {:?}",
                environment
            );
        }
        Err(_) => {
            // Already initialized, common in tests
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}
