//! Telemetry helpers for applications embedding `stock-chart`.
//!
//! The engine only emits `tracing` events. Diagnostics are grouped by target so a
//! host can enable one channel at a time, for example
//! `RUST_LOG=stock_chart::selection=debug`.

/// Target for redraw diagnostics (skipped paints, draw areas, factors).
pub const TARGET_REDRAW: &str = "stock_chart::redraw";
/// Target for pointer and wheel dispatch.
pub const TARGET_EVENT: &str = "stock_chart::event";
/// Target for surface resize.
pub const TARGET_RESIZE: &str = "stock_chart::resize";
/// Target for time-window and point selection changes.
pub const TARGET_SELECTION: &str = "stock_chart::selection";

/// Initializes a default `tracing` subscriber when the `telemetry` feature is enabled.
///
/// Returns `true` when initialization succeeds.
/// Returns `false` when no initialization is performed (feature disabled) or if a
/// global subscriber was already set by the host application.
#[must_use]
pub fn init_default_tracing() -> bool {
    #[cfg(feature = "telemetry")]
    {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_target(true)
            .compact();

        return builder.try_init().is_ok();
    }

    #[cfg(not(feature = "telemetry"))]
    {
        false
    }
}
