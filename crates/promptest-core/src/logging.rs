use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when neither `PROMPTEST_LOG` nor `RUST_LOG` is set
pub const DEFAULT_FILTER: &str = "promptest=warn";

/// Helper macro for logging elapsed time at trace level.
///
/// Usage:
/// ```rust,ignore
/// let start = Instant::now();
/// // ... some work ...
/// trace_time!(start, "operation_name");
/// // Or with additional fields:
/// trace_time!(start, "operation_name", model = model_name);
/// ```
#[macro_export]
macro_rules! trace_time {
    ($start:expr, $name:expr) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $name);
    };
    ($start:expr, $name:expr $(, $field:ident = $value:expr)*) => {
        tracing::trace!(elapsed = ?$start.elapsed(), $($field = $value),*, $name);
    };
}

/// Whether `PROMPTEST_LOG_JSON` asks for JSON-formatted log lines
pub fn json_requested() -> bool {
    std::env::var("PROMPTEST_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Initialize structured logging on stderr.
///
/// `PROMPTEST_LOG` takes precedence over `RUST_LOG`; a bare level such as
/// `debug` is scoped to the promptest crates.
pub fn init_tracing(log_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = std::env::var("PROMPTEST_LOG")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|level| {
            EnvFilter::new(if level.contains('=') {
                level
            } else {
                format!("promptest={}", level)
            })
        })
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);

    if log_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}
