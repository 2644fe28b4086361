use super::binning::quantile;
use super::metadata::TransformRecord;
use super::table::LabelTable;
use crate::types::{LabelType, Timestamp, Value};
use std::cmp::Ordering;
use std::fmt;

/// Summary statistics of a continuous label column.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousSummary {
    pub count: usize,
    pub nulls: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); NaN below two values.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl ContinuousSummary {
    pub fn from_values<'a>(labels: impl IntoIterator<Item = &'a Value>) -> Option<Self> {
        let mut nulls = 0;
        let mut values: Vec<f64> = Vec::new();
        for label in labels {
            match label.as_f64() {
                Some(v) if !v.is_nan() => values.push(v),
                _ => nulls += 1,
            }
        }
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Some(Self {
            count,
            nulls,
            mean,
            std,
            min: values[0],
            q25: quantile(&values, 0.25)?,
            median: quantile(&values, 0.5)?,
            q75: quantile(&values, 0.75)?,
            max: values[count - 1],
        })
    }
}

/// Human-readable report rebuilt from stored metadata and current labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    pub label_name: String,
    pub label_type: LabelType,
    pub total: usize,
    pub distribution: Vec<(Value, usize)>,
    pub summary: Option<ContinuousSummary>,
    pub settings: Vec<(String, String)>,
    pub entity_counts: Vec<(String, usize)>,
    pub transforms: Vec<TransformRecord>,
}

impl LabelTable {
    /// Count of each distinct label, ordered by value.
    pub fn distribution(&self) -> Vec<(Value, usize)> {
        let mut labels: Vec<&Value> = self.labels().collect();
        labels.sort_by(|a, b| a.total_cmp(b));

        let mut counts: Vec<(Value, usize)> = Vec::new();
        for label in labels {
            match counts.last_mut() {
                Some((value, n)) if value.total_cmp(label) == Ordering::Equal => *n += 1,
                _ => counts.push((label.clone(), 1)),
            }
        }
        counts
    }

    /// Records per entity, including entities that produced none.
    pub fn count_per_entity(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .metadata
            .entities
            .iter()
            .map(|summary| (summary.entity.clone(), 0))
            .collect();
        for record in &self.records {
            match counts.iter_mut().find(|(entity, _)| *entity == record.entity) {
                Some((_, n)) => *n += 1,
                None => counts.push((record.entity.clone(), 1)),
            }
        }
        counts
    }

    /// Cumulative number of records at each distinct cutoff time.
    pub fn count_by_time(&self) -> Vec<(Timestamp, usize)> {
        let mut cutoffs: Vec<Timestamp> = self.cutoffs().collect();
        cutoffs.sort();

        let mut cumulative: Vec<(Timestamp, usize)> = Vec::new();
        for (i, cutoff) in cutoffs.into_iter().enumerate() {
            match cumulative.last_mut() {
                Some((time, n)) if *time == cutoff => *n = i + 1,
                _ => cumulative.push((cutoff, i + 1)),
            }
        }
        cumulative
    }

    pub fn describe(&self) -> Description {
        let settings = &self.metadata.settings;
        let optional = |value: Option<String>| value.unwrap_or_else(|| "none".to_string());

        let settings = vec![
            ("entity_column".to_string(), self.metadata.entity_column.clone()),
            ("time_column".to_string(), self.metadata.time_column.clone()),
            ("label_type".to_string(), self.metadata.label_type.to_string()),
            ("window_size".to_string(), settings.window_size.to_string()),
            ("gap".to_string(), optional(settings.effective_gap().map(|g| g.to_string()))),
            (
                "minimum_data".to_string(),
                optional(settings.minimum_data.map(|m| m.to_string())),
            ),
            (
                "maximum_data".to_string(),
                optional(settings.maximum_data.map(|m| m.to_string())),
            ),
            (
                "num_examples_per_instance".to_string(),
                settings.num_examples_per_instance.to_string(),
            ),
            ("drop_empty".to_string(), settings.drop_empty.to_string()),
            ("drop_partial".to_string(), settings.drop_partial.to_string()),
        ];

        let summary = match self.metadata.label_type {
            LabelType::Continuous => ContinuousSummary::from_values(self.labels()),
            LabelType::Discrete => None,
        };

        Description {
            label_name: self.metadata.label_name.clone(),
            label_type: self.metadata.label_type,
            total: self.records.len(),
            distribution: self.distribution(),
            summary,
            settings,
            entity_counts: self.count_per_entity(),
            transforms: self.metadata.transforms.clone(),
        }
    }
}

fn heading(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{}", title)?;
    writeln!(f, "{}", "-".repeat(title.len()))
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        heading(f, &format!("Label Distribution ({})", self.label_name))?;
        match &self.summary {
            Some(s) => {
                writeln!(f, "{:<8}{}", "count", s.count)?;
                writeln!(f, "{:<8}{:.4}", "mean", s.mean)?;
                writeln!(f, "{:<8}{:.4}", "std", s.std)?;
                writeln!(f, "{:<8}{:.4}", "min", s.min)?;
                writeln!(f, "{:<8}{:.4}", "25%", s.q25)?;
                writeln!(f, "{:<8}{:.4}", "50%", s.median)?;
                writeln!(f, "{:<8}{:.4}", "75%", s.q75)?;
                writeln!(f, "{:<8}{:.4}", "max", s.max)?;
                if s.nulls > 0 {
                    writeln!(f, "{:<8}{}", "null", s.nulls)?;
                }
            }
            None => {
                for (value, count) in &self.distribution {
                    writeln!(f, "{:<16}{}", value.to_string(), count)?;
                }
                writeln!(f, "{:<16}{}", "Total:", self.total)?;
            }
        }

        writeln!(f)?;
        heading(f, "Settings")?;
        for (name, value) in &self.settings {
            writeln!(f, "{:<28}{}", name, value)?;
        }

        writeln!(f)?;
        heading(f, "Records per Entity")?;
        for (entity, count) in &self.entity_counts {
            writeln!(f, "{:<28}{}", entity, count)?;
        }

        writeln!(f)?;
        heading(f, "Transforms")?;
        if self.transforms.is_empty() {
            writeln!(f, "No transforms applied")?;
        }
        for (i, transform) in self.transforms.iter().enumerate() {
            writeln!(f, "{}. {}", i + 1, transform)?;
        }
        Ok(())
    }
}
