use super::metadata::{SearchMetadata, TransformRecord};
use crate::config::SearchConfig;
use crate::types::{LabelType, Timestamp, Value};
use serde::{Deserialize, Serialize};

/// One accepted window: entity, cutoff time and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    pub entity: String,
    pub cutoff: Timestamp,
    pub label: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<(String, Value)>,
}

impl LabelRecord {
    pub fn new(entity: impl Into<String>, cutoff: Timestamp, label: impl Into<Value>) -> Self {
        Self {
            entity: entity.into(),
            cutoff,
            label: label.into(),
            extras: Vec::new(),
        }
    }

    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extras.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Ordered label records plus the metadata that produced them.
///
/// Records are sorted entity-then-cutoff, with entities in first-seen input
/// order. Transforms never drop metadata; each one appends to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTable {
    pub(crate) records: Vec<LabelRecord>,
    pub(crate) metadata: SearchMetadata,
}

impl LabelTable {
    pub fn new(records: Vec<LabelRecord>, metadata: SearchMetadata) -> Self {
        Self { records, metadata }
    }

    pub fn records(&self) -> &[LabelRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<LabelRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &Value> {
        self.records.iter().map(|r| &r.label)
    }

    pub fn cutoffs(&self) -> impl Iterator<Item = Timestamp> + '_ {
        self.records.iter().map(|r| r.cutoff)
    }

    pub fn metadata(&self) -> &SearchMetadata {
        &self.metadata
    }

    pub fn settings(&self) -> &SearchConfig {
        &self.metadata.settings
    }

    pub fn label_name(&self) -> &str {
        &self.metadata.label_name
    }

    pub fn label_type(&self) -> LabelType {
        self.metadata.label_type
    }

    pub fn transforms(&self) -> &[TransformRecord] {
        &self.metadata.transforms
    }

    /// Names of auxiliary columns in first-seen order.
    pub fn extra_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for record in &self.records {
            for (name, _) in &record.extras {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    pub(crate) fn push_transform(&mut self, transform: TransformRecord) {
        log::debug!("Label table transform: {}", transform);
        self.metadata.transforms.push(transform);
    }
}
