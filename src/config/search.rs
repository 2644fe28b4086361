use super::traits::ConfigSection;
use crate::engines::windowing::{MinimumData, Span, WindowPlan, WindowSize};
use crate::error::{LabelcraftError, Result};
use crate::labeling::Params;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cap on accepted examples per entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawLimit", into = "RawLimit")]
pub enum ExampleLimit {
    #[default]
    Unbounded,
    Count(usize),
    /// Per label value (matched on its display form); other labels are discarded.
    PerLabel(BTreeMap<String, usize>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLimit {
    Count(i64),
    PerLabel(BTreeMap<String, i64>),
}

impl TryFrom<RawLimit> for ExampleLimit {
    type Error = LabelcraftError;

    fn try_from(raw: RawLimit) -> Result<Self> {
        let count = |n: i64| {
            usize::try_from(n).map_err(|_| {
                LabelcraftError::invalid(
                    "num_examples_per_instance",
                    format!("expected -1 or a non-negative count, got {}", n),
                )
            })
        };
        match raw {
            RawLimit::Count(-1) => Ok(ExampleLimit::Unbounded),
            RawLimit::Count(n) => Ok(ExampleLimit::Count(count(n)?)),
            RawLimit::PerLabel(map) => map
                .into_iter()
                .map(|(label, n)| Ok((label, count(n)?)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(ExampleLimit::PerLabel),
        }
    }
}

impl From<ExampleLimit> for RawLimit {
    fn from(limit: ExampleLimit) -> Self {
        match limit {
            ExampleLimit::Unbounded => RawLimit::Count(-1),
            ExampleLimit::Count(n) => RawLimit::Count(n as i64),
            ExampleLimit::PerLabel(map) => {
                RawLimit::PerLabel(map.into_iter().map(|(k, v)| (k, v as i64)).collect())
            }
        }
    }
}

impl From<usize> for ExampleLimit {
    fn from(n: usize) -> Self {
        ExampleLimit::Count(n)
    }
}

/// `-1` is the unbounded sentinel; any other negative count is rejected.
impl TryFrom<i64> for ExampleLimit {
    type Error = LabelcraftError;

    fn try_from(n: i64) -> Result<Self> {
        ExampleLimit::try_from(RawLimit::Count(n))
    }
}

impl fmt::Display for ExampleLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExampleLimit::Unbounded => f.write_str("-1"),
            ExampleLimit::Count(n) => write!(f, "{}", n),
            ExampleLimit::PerLabel(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

/// What happens when the labeling function fails on a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop the whole search with the failing entity and cutoff.
    #[default]
    Abort,
    /// Log a warning and leave the window out of the table.
    Skip,
}

fn default_true() -> bool {
    true
}

/// Every recognised search option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub window_size: WindowSize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_data: Option<MinimumData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_data: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<Span>,
    #[serde(default)]
    pub num_examples_per_instance: ExampleLimit,
    #[serde(default = "default_true")]
    pub drop_empty: bool,
    #[serde(default)]
    pub drop_partial: bool,
    #[serde(default)]
    pub on_error: ErrorPolicy,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub params: Params,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self::new(WindowSize::All)
    }
}

impl SearchConfig {
    pub fn new(window_size: WindowSize) -> Self {
        Self {
            window_size,
            minimum_data: None,
            maximum_data: None,
            gap: None,
            num_examples_per_instance: ExampleLimit::Unbounded,
            drop_empty: true,
            drop_partial: false,
            on_error: ErrorPolicy::Abort,
            verbose: false,
            parallel: false,
            params: Params::new(),
        }
    }

    pub fn with_gap(mut self, gap: Span) -> Self {
        self.gap = Some(gap);
        self
    }

    pub fn with_minimum_data(mut self, minimum_data: MinimumData) -> Self {
        self.minimum_data = Some(minimum_data);
        self
    }

    pub fn with_maximum_data(mut self, maximum_data: Span) -> Self {
        self.maximum_data = Some(maximum_data);
        self
    }

    pub fn with_limit(mut self, limit: impl Into<ExampleLimit>) -> Self {
        self.num_examples_per_instance = limit.into();
        self
    }

    pub fn with_drop_empty(mut self, drop_empty: bool) -> Self {
        self.drop_empty = drop_empty;
        self
    }

    pub fn with_drop_partial(mut self, drop_partial: bool) -> Self {
        self.drop_partial = drop_partial;
        self
    }

    pub fn with_error_policy(mut self, on_error: ErrorPolicy) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<crate::types::Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Gap actually used between cutoffs.
    pub fn effective_gap(&self) -> Option<Span> {
        self.gap.or_else(|| self.window_size.default_gap())
    }

    pub fn window_plan(&self) -> WindowPlan {
        WindowPlan {
            window_size: self.window_size,
            gap: self.gap,
            minimum_data: self.minimum_data,
            maximum_data: self.maximum_data,
        }
    }
}

impl ConfigSection for SearchConfig {
    fn section_name() -> &'static str {
        "search"
    }

    fn validate(&self) -> Result<()> {
        match self.window_size {
            WindowSize::Duration(offset) if !offset.is_positive() => {
                return Err(LabelcraftError::invalid(
                    "window_size",
                    format!("duration must be positive, got {}", offset),
                ));
            }
            WindowSize::Rows(0) => {
                return Err(LabelcraftError::invalid("window_size", "row count must be at least 1"));
            }
            _ => {}
        }

        match self.gap {
            Some(Span::Duration(offset)) if !offset.is_positive() => {
                return Err(LabelcraftError::invalid(
                    "gap",
                    format!("duration must be positive, got {}", offset),
                ));
            }
            Some(Span::Rows(0)) => {
                return Err(LabelcraftError::invalid("gap", "row count must be at least 1"));
            }
            _ => {}
        }

        if let Some(MinimumData::Duration(offset)) = self.minimum_data {
            if offset.is_negative() {
                return Err(LabelcraftError::invalid(
                    "minimum_data",
                    format!("duration must not be negative, got {}", offset),
                ));
            }
        }

        match (self.minimum_data, self.maximum_data) {
            (_, Some(Span::Duration(max))) if max.is_negative() => {
                return Err(LabelcraftError::invalid(
                    "maximum_data",
                    format!("duration must not be negative, got {}", max),
                ));
            }
            (Some(MinimumData::Duration(min)), Some(Span::Duration(max))) if max < min => {
                return Err(LabelcraftError::invalid(
                    "maximum_data",
                    format!("{} is shorter than minimum_data {}", max, min),
                ));
            }
            (Some(MinimumData::Rows(min)), Some(Span::Rows(max))) if max <= min => {
                return Err(LabelcraftError::invalid(
                    "maximum_data",
                    format!("{} rows leaves no window after minimum_data of {} rows", max, min),
                ));
            }
            _ => {}
        }

        Ok(())
    }
}
