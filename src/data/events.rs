use crate::error::{LabelcraftError, Result};
use crate::types::{Timestamp, Value};
use std::collections::HashMap;
use std::ops::Range;

/// Contiguous block of one entity's events inside the arena.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityGroup {
    pub key: String,
    pub rows: Range<usize>,
}

impl EntityGroup {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Immutable event arena grouped by entity.
///
/// Entities appear in first-seen order of the input and each entity's events
/// are stable-sorted by timestamp, so equal timestamps keep their input order.
/// Groups are index ranges into the single `timestamps`/`rows` buffers.
#[derive(Debug, Clone)]
pub struct EventFrame {
    columns: Vec<String>,
    timestamps: Vec<Timestamp>,
    rows: Vec<Vec<Value>>,
    groups: Vec<EntityGroup>,
    index: HashMap<String, usize>,
}

impl EventFrame {
    pub fn builder<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> EventFrameBuilder {
        EventFrameBuilder::new(columns)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn groups(&self) -> &[EntityGroup] {
        &self.groups
    }

    pub fn group(&self, key: &str) -> Option<&EntityGroup> {
        self.index.get(key).map(|&i| &self.groups[i])
    }

    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.key.as_str())
    }

    pub fn num_entities(&self) -> usize {
        self.groups.len()
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self, group: &EntityGroup) -> &[Timestamp] {
        &self.timestamps[group.rows.clone()]
    }

    pub fn rows(&self, group: &EntityGroup) -> &[Vec<Value>] {
        &self.rows[group.rows.clone()]
    }

    pub fn first_timestamp(&self, key: &str) -> Option<Timestamp> {
        self.group(key).and_then(|g| self.timestamps(g).first().copied())
    }
}

/// Collects events in input order and arranges them into an [`EventFrame`].
#[derive(Debug, Clone, Default)]
pub struct EventFrameBuilder {
    columns: Vec<String>,
    entities: Vec<String>,
    timestamps: Vec<Timestamp>,
    rows: Vec<Vec<Value>>,
}

impl EventFrameBuilder {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn push(
        &mut self,
        entity: impl Into<String>,
        timestamp: Timestamp,
        values: Vec<Value>,
    ) -> Result<&mut Self> {
        if values.len() != self.columns.len() {
            return Err(LabelcraftError::DataLoading(format!(
                "Row {} has {} values but the frame has {} columns",
                self.rows.len(),
                values.len(),
                self.columns.len()
            )));
        }
        self.entities.push(entity.into());
        self.timestamps.push(timestamp);
        self.rows.push(values);
        Ok(self)
    }

    pub fn build(self) -> EventFrame {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut keys: Vec<String> = Vec::new();
        let mut entity_of_row = Vec::with_capacity(self.entities.len());

        for entity in self.entities {
            let next = keys.len();
            let slot = *index.entry(entity.clone()).or_insert(next);
            if slot == next {
                keys.push(entity);
            }
            entity_of_row.push(slot);
        }

        let mut order: Vec<usize> = (0..self.timestamps.len()).collect();
        order.sort_by_key(|&row| (entity_of_row[row], self.timestamps[row]));

        let mut rows: Vec<Option<Vec<Value>>> = self.rows.into_iter().map(Some).collect();
        let mut sorted_rows = Vec::with_capacity(order.len());
        let mut timestamps = Vec::with_capacity(order.len());
        let mut groups: Vec<EntityGroup> = keys
            .into_iter()
            .map(|key| EntityGroup { key, rows: 0..0 })
            .collect();

        for (position, &row) in order.iter().enumerate() {
            let group = &mut groups[entity_of_row[row]];
            if group.rows.is_empty() {
                group.rows = position..position;
            }
            group.rows.end = position + 1;
            timestamps.push(self.timestamps[row]);
            sorted_rows.push(rows[row].take().unwrap_or_default());
        }

        log::debug!(
            "Built event frame: {} events across {} entities",
            timestamps.len(),
            groups.len()
        );

        EventFrame {
            columns: self.columns,
            timestamps,
            rows: sorted_rows,
            groups,
            index,
        }
    }
}
