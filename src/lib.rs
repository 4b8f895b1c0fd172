//! stock-chart: interactive OHLCV time-series chart engine.
//!
//! A [`StockChart`] stacks six surfaces (background, nav bar, time selector,
//! y-scale, main plot and hover). Drawings on each surface turn the chart
//! state into backend-agnostic [`render::RenderFrame`]s; the host supplies one
//! [`render::Renderer`] per surface through a [`surface::SurfaceProvider`]
//! and forwards pointer and wheel events to the chart.

pub mod chart;
pub mod core;
pub mod drawing;
pub mod error;
pub mod interaction;
pub mod render;
pub mod surface;
pub mod telemetry;

pub use chart::{ChartConfig, SeriesId, StockChart, ViewModel};
pub use error::{ChartError, ChartResult};
pub use surface::{SurfaceKind, SurfaceProvider};
