//! Bin edge computation for continuous labels.

use crate::error::{LabelcraftError, Result};

/// Number of bins or explicit edges.
#[derive(Debug, Clone, PartialEq)]
pub enum Bins {
    Count(usize),
    Edges(Vec<f64>),
}

impl From<usize> for Bins {
    fn from(n: usize) -> Self {
        Bins::Count(n)
    }
}

impl From<Vec<f64>> for Bins {
    fn from(edges: Vec<f64>) -> Self {
        Bins::Edges(edges)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinOptions {
    /// Quantile edges instead of equal-width edges (only with `Bins::Count`).
    pub quantiles: bool,
    /// Decimal places used in generated interval names.
    pub precision: Option<usize>,
    pub labels: Option<Vec<String>>,
    /// Intervals are `(a, b]` when true, `[a, b)` otherwise.
    pub right: bool,
}

impl Default for BinOptions {
    fn default() -> Self {
        Self {
            quantiles: false,
            precision: None,
            labels: None,
            right: true,
        }
    }
}

impl BinOptions {
    pub fn quantiles() -> Self {
        Self {
            quantiles: true,
            ..Self::default()
        }
    }
}

pub const DEFAULT_PRECISION: usize = 3;

/// Equal-width edges over `[min, max]`, widened by 0.1% on the open side.
pub fn equal_width_edges(values: &[f64], n: usize) -> Result<Vec<f64>> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !min.is_finite() || !max.is_finite() {
        return Err(LabelcraftError::Transform(
            "cannot bin labels without finite values".to_string(),
        ));
    }
    Ok(linspace_edges(min, max, n))
}

fn linspace_edges(min: f64, max: f64, n: usize) -> Vec<f64> {
    if min == max {
        let adjust = if min == 0.0 { 0.001 } else { 0.001 * min.abs() };
        return linspace(min - adjust, max + adjust, n);
    }
    linspace(min, max, n)
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let step = (hi - lo) / n as f64;
    (0..=n)
        .map(|i| if i == n { hi } else { lo + step * i as f64 })
        .collect()
}

/// Widen the outer edge so the extreme value lands inside the last interval.
pub fn widen_open_side(edges: &mut [f64], right: bool) {
    let n = edges.len();
    if n < 2 {
        return;
    }
    let adjust = (edges[n - 1] - edges[0]) * 0.001;
    if right {
        edges[0] -= adjust;
    } else {
        edges[n - 1] += adjust;
    }
}

/// Linearly interpolated quantile of sorted values.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

pub fn quantile_edges(values: &[f64], n: usize) -> Result<Vec<f64>> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let edges: Vec<f64> = (0..=n)
        .filter_map(|i| quantile(&sorted, i as f64 / n as f64))
        .collect();
    if edges.len() != n + 1 {
        return Err(LabelcraftError::Transform(
            "cannot compute quantile bins without values".to_string(),
        ));
    }
    check_increasing(&edges)?;
    Ok(edges)
}

pub fn check_increasing(edges: &[f64]) -> Result<()> {
    if edges.len() < 2 {
        return Err(LabelcraftError::Transform(
            "at least two bin edges are required".to_string(),
        ));
    }
    if edges.iter().any(|e| !e.is_finite()) {
        return Err(LabelcraftError::Transform(format!("bin edges must be finite: {:?}", edges)));
    }
    if edges.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(LabelcraftError::Transform(format!(
            "bin edges must be unique and increasing: {:?}",
            edges
        )));
    }
    Ok(())
}

/// Index of the interval containing `value`, if any.
///
/// `include_lowest` also admits `value == edges[0]` into the first
/// right-closed interval.
pub fn assign(edges: &[f64], value: f64, right: bool, include_lowest: bool) -> Option<usize> {
    if value.is_nan() || edges.len() < 2 {
        return None;
    }
    let last = edges.len() - 2;
    if right {
        if include_lowest && value == edges[0] {
            return Some(0);
        }
        // first edge >= value closes the interval on the right
        let upper = edges.partition_point(|e| *e < value);
        if upper == 0 || upper > last + 1 {
            return None;
        }
        Some(upper - 1)
    } else {
        let upper = edges.partition_point(|e| *e <= value);
        if upper == 0 || upper > last + 1 {
            return None;
        }
        Some(upper - 1)
    }
}

pub const MAX_PRECISION: usize = 20;

/// Smallest precision from `precision` up at which every edge prints
/// differently, so no two intervals share a name.
pub fn distinct_precision(edges: &[f64], precision: usize) -> Result<usize> {
    (precision..=MAX_PRECISION.max(precision))
        .find(|&p| {
            edges
                .windows(2)
                .all(|pair| format!("{:.p$}", pair[0], p = p) != format!("{:.p$}", pair[1], p = p))
        })
        .ok_or_else(|| {
            LabelcraftError::Transform(format!(
                "bin edges are indistinguishable at {} decimal places: {:?}",
                MAX_PRECISION, edges
            ))
        })
}

pub fn interval_names(edges: &[f64], right: bool, include_lowest: bool, precision: usize) -> Vec<String> {
    edges
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let (open, close) = match (right, include_lowest && i == 0) {
                (true, true) => ('[', ']'),
                (true, false) => ('(', ']'),
                (false, _) => ('[', ')'),
            };
            format!(
                "{}{:.p$}, {:.p$}{}",
                open,
                pair[0],
                pair[1],
                close,
                p = precision
            )
        })
        .collect()
}
