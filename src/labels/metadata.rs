use crate::config::SearchConfig;
use crate::engines::windowing::Offset;
use crate::types::{LabelType, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Bumped whenever the serialized metadata layout changes.
pub const METADATA_VERSION: u32 = 1;

/// Per-entity bookkeeping captured during the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entity: String,
    pub rows: usize,
    pub first_event: Option<Timestamp>,
    pub last_event: Option<Timestamp>,
    pub windows: usize,
    pub empty: usize,
    pub partial: usize,
    pub failed: usize,
    pub records: usize,
}

impl EntitySummary {
    pub fn new(entity: &str, timestamps: &[Timestamp]) -> Self {
        Self {
            entity: entity.to_string(),
            rows: timestamps.len(),
            first_event: timestamps.first().copied(),
            last_event: timestamps.last().copied(),
            windows: 0,
            empty: 0,
            partial: 0,
            failed: 0,
            records: 0,
        }
    }
}

/// How a sample was sized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSpec {
    N(usize),
    Frac(f64),
    /// Per label value, matched on its display form.
    PerLabel(BTreeMap<String, usize>),
}

impl fmt::Display for SampleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSpec::N(n) => write!(f, "n={}", n),
            SampleSpec::Frac(frac) => write!(f, "frac={}", frac),
            SampleSpec::PerLabel(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "n={{{}}}", parts.join(", "))
            }
        }
    }
}

/// One entry of the append-only transform log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transform", rename_all = "snake_case")]
pub enum TransformRecord {
    /// Labels became `label >= value`.
    Threshold { value: f64 },
    Bin {
        quantiles: bool,
        right: bool,
        precision: usize,
        edges: Vec<f64>,
        labels: Vec<String>,
    },
    Lead { offset: Offset },
    Sample {
        spec: SampleSpec,
        seed: u64,
        replace: bool,
        per_entity: bool,
        before: usize,
        after: usize,
    },
}

impl TransformRecord {
    pub fn name(&self) -> &'static str {
        match self {
            TransformRecord::Threshold { .. } => "threshold",
            TransformRecord::Bin { .. } => "bin",
            TransformRecord::Lead { .. } => "apply_lead",
            TransformRecord::Sample { .. } => "sample",
        }
    }
}

impl fmt::Display for TransformRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformRecord::Threshold { value } => write!(f, "threshold: label >= {}", value),
            TransformRecord::Bin {
                quantiles,
                right,
                edges,
                labels,
                ..
            } => write!(
                f,
                "bin: {} bins ({}, {}), edges {:?}, labels {:?}",
                labels.len(),
                if *quantiles { "quantiles" } else { "equal width" },
                if *right { "right-closed" } else { "left-closed" },
                edges,
                labels
            ),
            TransformRecord::Lead { offset } => write!(f, "apply_lead: cutoffs shifted {} earlier", offset),
            TransformRecord::Sample {
                spec,
                seed,
                replace,
                per_entity,
                before,
                after,
            } => write!(
                f,
                "sample: {} (seed {}, replace {}, per entity {}) kept {} of {} records",
                spec, seed, replace, per_entity, after, before
            ),
        }
    }
}

/// Search configuration and provenance carried with a label table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub version: u32,
    pub entity_column: String,
    pub time_column: String,
    pub label_name: String,
    pub label_type: LabelType,
    pub settings: SearchConfig,
    pub entities: Vec<EntitySummary>,
    pub transforms: Vec<TransformRecord>,
}

impl SearchMetadata {
    pub fn entity(&self, key: &str) -> Option<&EntitySummary> {
        self.entities.iter().find(|summary| summary.entity == key)
    }
}
