use thiserror::Error;

pub type ChartResult<T> = Result<T, ChartError>;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: i32, height: i32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid chart id: {0:?}")]
    InvalidChartId(String),

    /// The host could not provide a drawable surface or its 2D context.
    #[error("surface `{surface}` unavailable: {reason}")]
    SurfaceUnavailable { surface: String, reason: String },

    #[error("config json: {0}")]
    Json(#[from] serde_json::Error),
}
