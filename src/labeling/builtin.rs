//! Stock aggregations over a single payload column.

use super::function::{LabelFunction, Params};
use super::view::WindowView;
use crate::error::{LabelcraftError, Result};
use crate::types::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Count,
    Sum,
    Mean,
    Min,
    Max,
    Last,
}

impl Aggregation {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::Count => "count",
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Last => "last",
        }
    }

    pub fn needs_column(&self) -> bool {
        !matches!(self, Aggregation::Count)
    }

    fn apply(&self, window: &WindowView<'_>, column: Option<&str>) -> anyhow::Result<Value> {
        let column = match (self, column) {
            (Aggregation::Count, _) => return Ok(Value::Integer(window.len() as i64)),
            (_, Some(column)) => column,
            (_, None) => anyhow::bail!("aggregation '{}' needs a column", self.name()),
        };
        if let Aggregation::Last = self {
            return Ok(window.last(column)?.cloned().unwrap_or(Value::Null));
        }

        let values = window.f64_values(column)?;
        let value = match self {
            Aggregation::Sum => Some(values.iter().sum()),
            Aggregation::Mean if values.is_empty() => None,
            Aggregation::Mean => Some(values.iter().sum::<f64>() / values.len() as f64),
            Aggregation::Min => values.iter().copied().reduce(f64::min),
            Aggregation::Max => values.iter().copied().reduce(f64::max),
            Aggregation::Count | Aggregation::Last => None,
        };
        Ok(value.map(Value::Float).unwrap_or(Value::Null))
    }
}

/// Build a labeling function named `<aggregation>_<column>` (or `count`).
pub fn aggregate(aggregation: Aggregation, column: Option<&str>) -> Result<LabelFunction> {
    if aggregation.needs_column() && column.is_none() {
        return Err(LabelcraftError::invalid(
            "label.column",
            format!("aggregation '{}' needs a column", aggregation.name()),
        ));
    }
    let column = column.map(str::to_string);
    let name = match &column {
        Some(column) if aggregation.needs_column() => format!("{}_{}", aggregation.name(), column),
        _ => aggregation.name().to_string(),
    };

    Ok(LabelFunction::new(
        name,
        move |window: &WindowView<'_>, _params: &Params| aggregation.apply(window, column.as_deref()),
    )
    .accepts(Vec::<String>::new()))
}

pub fn count() -> LabelFunction {
    LabelFunction::new("count", |window: &WindowView<'_>, _params: &Params| {
        Ok(window.len() as i64)
    })
    .accepts(Vec::<String>::new())
}

pub fn sum(column: &str) -> LabelFunction {
    let column = column.to_string();
    LabelFunction::new(
        format!("sum_{}", column),
        move |window: &WindowView<'_>, _params: &Params| {
            Aggregation::Sum.apply(window, Some(&column))
        },
    )
    .accepts(Vec::<String>::new())
}
