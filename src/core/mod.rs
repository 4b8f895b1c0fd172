pub mod geometry;
pub mod range_format;
pub mod series;
pub mod time_mask;
pub mod time_slice;
pub mod transform;

pub use geometry::{Point, Rect};
pub use range_format::{NiceRangeFormatter, RangeFormatter};
pub use series::{DataStock, PointId, Series, Trend, ValueRange};
pub use time_mask::{ScanMask, format_time};
pub use time_slice::{SliceComparison, TimePosition, TimeSlice};
pub use transform::{XTransform, YTransform};
