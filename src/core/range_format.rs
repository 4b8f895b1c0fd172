use crate::core::series::ValueRange;

/// Axis quantization and label formatting service.
///
/// Drawings consume it as an opaque collaborator so hosts can plug their own
/// notion of "nice" steps and number formatting.
pub trait RangeFormatter {
    /// Rounds `[low, high]` outward to a step giving about `steps` intervals.
    fn quantize(&self, low: f64, high: f64, steps: u32) -> ValueRange;

    /// Display string for `value` given the axis step.
    fn format(&self, value: f64, step: Option<f64>) -> String;
}

/// Default formatter using 1/2/5 x 10^n steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NiceRangeFormatter;

impl RangeFormatter for NiceRangeFormatter {
    fn quantize(&self, low: f64, high: f64, steps: u32) -> ValueRange {
        let range = ValueRange::new(low.min(high), low.max(high)).widened();
        if steps == 0 || !range.delta().is_finite() {
            return range;
        }

        let step = nice_step(range.delta() / f64::from(steps));
        let low = (range.low / step).floor() * step;
        let mut high = (range.high / step).ceil() * step;
        if high <= low {
            high = low + step;
        }
        ValueRange {
            low,
            high,
            step: Some(step),
        }
    }

    fn format(&self, value: f64, step: Option<f64>) -> String {
        if !value.is_finite() {
            return "nan".to_owned();
        }
        let precision = step.map_or(2, precision_from_step);
        format!("{value:.precision$}")
    }
}

fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }

    let magnitude = 10.0_f64.powf(raw.log10().floor());
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return raw;
    }

    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn precision_from_step(step: f64) -> usize {
    if !step.is_finite() || step <= 0.0 {
        return 2;
    }
    let text = format!("{:.12}", step.abs());
    let Some((_, fraction)) = text.split_once('.') else {
        return 0;
    };
    fraction.trim_end_matches('0').len().clamp(0, 12)
}
