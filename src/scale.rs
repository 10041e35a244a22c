//! Axis range helpers for the render layer.

/// Pad a continuous range by 5% on both ends. A degenerate range widens by
/// 1.0 so plotters always receives a non-empty axis.
pub fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

/// Padded extent of a value sequence. Empty input falls back to (0.0, 1.0).
pub fn numeric_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for val in values {
        if val < min {
            min = val;
        }
        if val > max {
            max = val;
        }
    }

    if min == f64::INFINITY {
        return (0.0, 1.0);
    }
    pad_range(min, max)
}

/// Padded extent that always includes zero, for bar-family baselines.
pub fn numeric_range_with_zero(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for val in values {
        if val < min {
            min = val;
        }
        if val > max {
            max = val;
        }
    }

    if min == f64::INFINITY {
        return (0.0, 1.0);
    }
    if min > 0.0 {
        min = 0.0;
    }
    if max < 0.0 {
        max = 0.0;
    }
    pad_range(min, max)
}

/// Index range for n categorical slots, with half a slot of margin on each
/// side so the outer marks are not clipped.
pub fn categorical_range(n: usize) -> (f64, f64) {
    (-0.5, n.max(1) as f64 - 0.5)
}
