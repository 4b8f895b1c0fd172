use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::drawing::DrawStyle;
use crate::error::{ChartError, ChartResult};

/// Chart bootstrap configuration.
///
/// Every field has a serde default so hosts can persist a partial JSON
/// document and load it back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Smallest selectable duration, in seconds.
    #[serde(default = "default_min_zoom_secs")]
    pub min_zoom_secs: i64,
    /// Fraction of the data span appended to the master range as future margin.
    #[serde(default = "default_extend_future_ratio")]
    pub extend_future_ratio: f64,
    #[serde(default)]
    pub candle_style: DrawStyle,
    /// Show labels in the host local zone instead of UTC.
    #[serde(default)]
    pub local_zone: bool,
    #[serde(default = "default_nav_height_px")]
    pub nav_height_px: i32,
    #[serde(default = "default_yscale_width_px")]
    pub yscale_width_px: i32,
    #[serde(default = "default_layout_margin_px")]
    pub layout_margin_px: i32,
    #[serde(default = "default_selector_handle_width_px")]
    pub selector_handle_width_px: i32,
    #[serde(default = "default_selector_handle_height_px")]
    pub selector_handle_height_px: i32,
    /// Fraction of the selection moved by one wheel notch.
    #[serde(default = "default_wheel_step_ratio")]
    pub wheel_step_ratio: f64,
    /// Candle bodies this narrow or narrower are drawn as thin bars.
    #[serde(default = "default_min_body_width_px")]
    pub min_body_width_px: i32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            min_zoom_secs: default_min_zoom_secs(),
            extend_future_ratio: default_extend_future_ratio(),
            candle_style: DrawStyle::default(),
            local_zone: false,
            nav_height_px: default_nav_height_px(),
            yscale_width_px: default_yscale_width_px(),
            layout_margin_px: default_layout_margin_px(),
            selector_handle_width_px: default_selector_handle_width_px(),
            selector_handle_height_px: default_selector_handle_height_px(),
            wheel_step_ratio: default_wheel_step_ratio(),
            min_body_width_px: default_min_body_width_px(),
        }
    }
}

impl ChartConfig {
    #[must_use]
    pub fn min_zoom(&self) -> TimeDelta {
        TimeDelta::seconds(self.min_zoom_secs)
    }

    #[must_use]
    pub fn with_min_zoom(mut self, min_zoom: TimeDelta) -> Self {
        self.min_zoom_secs = min_zoom.num_seconds();
        self
    }

    #[must_use]
    pub fn with_extend_future_ratio(mut self, ratio: f64) -> Self {
        self.extend_future_ratio = ratio;
        self
    }

    #[must_use]
    pub fn with_candle_style(mut self, style: DrawStyle) -> Self {
        self.candle_style = style;
        self
    }

    #[must_use]
    pub fn with_local_zone(mut self, local_zone: bool) -> Self {
        self.local_zone = local_zone;
        self
    }

    /// Sets the nav bar height, y-scale width and the margin between them.
    #[must_use]
    pub fn with_layout(mut self, nav_height_px: i32, yscale_width_px: i32, margin_px: i32) -> Self {
        self.nav_height_px = nav_height_px;
        self.yscale_width_px = yscale_width_px;
        self.layout_margin_px = margin_px;
        self
    }

    #[must_use]
    pub fn with_wheel_step_ratio(mut self, ratio: f64) -> Self {
        self.wheel_step_ratio = ratio;
        self
    }

    pub fn validate(&self) -> ChartResult<()> {
        if self.min_zoom_secs <= 0 {
            return Err(ChartError::InvalidConfig(
                "min zoom duration must be > 0".to_owned(),
            ));
        }
        if !self.extend_future_ratio.is_finite() || self.extend_future_ratio < 0.0 {
            return Err(ChartError::InvalidConfig(
                "extend future ratio must be finite and >= 0".to_owned(),
            ));
        }
        if !self.wheel_step_ratio.is_finite()
            || self.wheel_step_ratio <= 0.0
            || self.wheel_step_ratio >= 1.0
        {
            return Err(ChartError::InvalidConfig(
                "wheel step ratio must be in (0, 1)".to_owned(),
            ));
        }
        for (name, value) in [
            ("nav height", self.nav_height_px),
            ("y-scale width", self.yscale_width_px),
            ("selector handle width", self.selector_handle_width_px),
            ("selector handle height", self.selector_handle_height_px),
        ] {
            if value <= 0 {
                return Err(ChartError::InvalidConfig(format!("{name} must be > 0")));
            }
        }
        if self.layout_margin_px < 0 || self.min_body_width_px < 0 {
            return Err(ChartError::InvalidConfig(
                "layout margin and min body width must be >= 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Serializes config to pretty JSON for debug/config files.
    pub fn to_json_pretty(&self) -> ChartResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes and validates config from JSON.
    pub fn from_json_str(input: &str) -> ChartResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }
}

fn default_min_zoom_secs() -> i64 {
    300
}

fn default_extend_future_ratio() -> f64 {
    0.1
}

fn default_nav_height_px() -> i32 {
    70
}

fn default_yscale_width_px() -> i32 {
    80
}

fn default_layout_margin_px() -> i32 {
    3
}

fn default_selector_handle_width_px() -> i32 {
    8
}

fn default_selector_handle_height_px() -> i32 {
    30
}

fn default_wheel_step_ratio() -> f64 {
    0.2
}

fn default_min_body_width_px() -> i32 {
    3
}
