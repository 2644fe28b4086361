use super::progress::{ConsoleProgress, ProgressCallback, SilentProgress};
use crate::config::{ConfigSection, ErrorPolicy, ExampleLimit, SearchConfig};
use crate::data::{EntityGroup, EventFrame};
use crate::engines::windowing::{WindowCursor, WindowPlan};
use crate::error::{LabelcraftError, Result};
use crate::labeling::{validate_params, LabelingFunction, WindowView};
use crate::labels::{EntitySummary, LabelRecord, LabelTable, SearchMetadata, METADATA_VERSION};
use crate::types::{LabelType, Value};
use polars::prelude::DataFrame;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Accepted-example bookkeeping for one entity.
enum CapTracker {
    Unbounded,
    Count { limit: usize, accepted: usize },
    PerLabel { remaining: BTreeMap<String, usize> },
}

impl CapTracker {
    fn new(limit: &ExampleLimit) -> Self {
        match limit {
            ExampleLimit::Unbounded => CapTracker::Unbounded,
            ExampleLimit::Count(limit) => CapTracker::Count {
                limit: *limit,
                accepted: 0,
            },
            ExampleLimit::PerLabel(counts) => CapTracker::PerLabel {
                remaining: counts.clone(),
            },
        }
    }

    fn is_full(&self) -> bool {
        match self {
            CapTracker::Unbounded => false,
            CapTracker::Count { limit, accepted } => accepted >= limit,
            CapTracker::PerLabel { remaining } => remaining.values().all(|n| *n == 0),
        }
    }

    /// Count `label` if there is room for it.
    fn admit(&mut self, label: &Value) -> bool {
        match self {
            CapTracker::Unbounded => true,
            CapTracker::Count { limit, accepted } => {
                if accepted < limit {
                    *accepted += 1;
                    true
                } else {
                    false
                }
            }
            CapTracker::PerLabel { remaining } => match remaining.get_mut(&label.to_string()) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    true
                }
                _ => false,
            },
        }
    }
}

struct EntityOutcome {
    summary: EntitySummary,
    records: Vec<LabelRecord>,
}

/// Slides windows over every entity stream and labels them.
///
/// Entities are visited in first-seen order and each entity's records come
/// out in cutoff order, so a search over the same events and settings always
/// produces the same table, in parallel mode too.
pub struct SearchEngine<F: LabelingFunction> {
    entity_column: String,
    time_column: String,
    function: F,
}

impl<F: LabelingFunction> SearchEngine<F> {
    pub fn new(entity_column: impl Into<String>, time_column: impl Into<String>, function: F) -> Self {
        Self {
            entity_column: entity_column.into(),
            time_column: time_column.into(),
            function,
        }
    }

    pub fn entity_column(&self) -> &str {
        &self.entity_column
    }

    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    pub fn function(&self) -> &F {
        &self.function
    }

    pub fn search(&self, events: &EventFrame, config: &SearchConfig) -> Result<LabelTable> {
        if config.verbose {
            self.search_with_progress(events, config, &mut ConsoleProgress::new())
        } else {
            self.search_with_progress(events, config, &mut SilentProgress)
        }
    }

    /// Convert a polars frame with the engine's entity and time columns, then search.
    pub fn search_dataframe(&self, df: &DataFrame, config: &SearchConfig) -> Result<LabelTable> {
        config.validate()?;
        validate_params(&self.function, &config.params)?;
        let events = EventFrame::from_dataframe(df, &self.entity_column, &self.time_column)?;
        self.search(&events, config)
    }

    pub fn search_with_progress(
        &self,
        events: &EventFrame,
        config: &SearchConfig,
        progress: &mut dyn ProgressCallback,
    ) -> Result<LabelTable> {
        config.validate()?;
        validate_params(&self.function, &config.params)?;

        let plan = config.window_plan();
        let groups = events.groups();
        log::info!(
            "Searching {} entities ({} events) with '{}': window_size={}, gap={}, limit={}",
            groups.len(),
            events.len(),
            self.function.name(),
            config.window_size,
            config
                .effective_gap()
                .map(|gap| gap.to_string())
                .unwrap_or_else(|| "none".to_string()),
            config.num_examples_per_instance
        );

        progress.on_search_start(groups.len());
        let outcomes = if config.parallel {
            self.run_parallel(events, &plan, config, progress)?
        } else {
            self.run_sequential(events, &plan, config, progress)?
        };

        let mut entities = Vec::with_capacity(outcomes.len());
        let mut records = Vec::new();
        for outcome in outcomes {
            entities.push(outcome.summary);
            records.extend(outcome.records);
        }

        let label_type = LabelType::infer(records.iter().map(|r| &r.label));
        log::info!(
            "Search produced {} records ({} label) across {} entities",
            records.len(),
            label_type,
            entities.len()
        );
        progress.on_search_complete(records.len());

        let metadata = SearchMetadata {
            version: METADATA_VERSION,
            entity_column: self.entity_column.clone(),
            time_column: self.time_column.clone(),
            label_name: self.function.name().to_string(),
            label_type,
            settings: config.clone(),
            entities,
            transforms: Vec::new(),
        };
        Ok(LabelTable::new(records, metadata))
    }

    fn run_sequential(
        &self,
        events: &EventFrame,
        plan: &WindowPlan,
        config: &SearchConfig,
        progress: &mut dyn ProgressCallback,
    ) -> Result<Vec<EntityOutcome>> {
        let mut outcomes = Vec::with_capacity(events.num_entities());
        for (index, group) in events.groups().iter().enumerate() {
            if progress.should_stop() {
                log::warn!("Search interrupted after {} entities", index);
                return Err(LabelcraftError::Interrupted {
                    completed_entities: index,
                });
            }
            let outcome = self.label_entity(events, group, plan, config)?;
            progress.on_entity_complete(index, &outcome.summary);
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    // Entities are labeled in batches of one per worker so a stop request is
    // still honoured between entities. Results keep entity order.
    fn run_parallel(
        &self,
        events: &EventFrame,
        plan: &WindowPlan,
        config: &SearchConfig,
        progress: &mut dyn ProgressCallback,
    ) -> Result<Vec<EntityOutcome>> {
        let batch = rayon::current_num_threads().max(1);
        let mut outcomes = Vec::with_capacity(events.num_entities());
        for (chunk_index, chunk) in events.groups().chunks(batch).enumerate() {
            let completed = chunk_index * batch;
            if progress.should_stop() {
                log::warn!("Search interrupted after {} entities", completed);
                return Err(LabelcraftError::Interrupted {
                    completed_entities: completed,
                });
            }

            let results: Vec<Result<EntityOutcome>> = chunk
                .par_iter()
                .map(|group| self.label_entity(events, group, plan, config))
                .collect();
            for (offset, result) in results.into_iter().enumerate() {
                let outcome = result?;
                progress.on_entity_complete(completed + offset, &outcome.summary);
                outcomes.push(outcome);
            }
        }
        Ok(outcomes)
    }

    fn label_entity(
        &self,
        events: &EventFrame,
        group: &EntityGroup,
        plan: &WindowPlan,
        config: &SearchConfig,
    ) -> Result<EntityOutcome> {
        let timestamps = events.timestamps(group);
        let rows = events.rows(group);
        let mut summary = EntitySummary::new(&group.key, timestamps);
        let mut cap = CapTracker::new(&config.num_examples_per_instance);
        let mut records = Vec::new();

        for window in WindowCursor::new(timestamps, *plan) {
            if cap.is_full() {
                break;
            }
            summary.windows += 1;

            if window.partial {
                summary.partial += 1;
                if config.drop_partial {
                    continue;
                }
            }
            if window.is_empty() {
                summary.empty += 1;
                if config.drop_empty {
                    continue;
                }
            }

            let view = WindowView::new(&group.key, &window, events.columns(), timestamps, rows);
            debug_assert!(view.timestamps().iter().all(|ts| window.contains(*ts)));

            match self.function.evaluate(&view, &config.params) {
                Ok(output) => {
                    if !cap.admit(&output.value) {
                        continue;
                    }
                    records.push(LabelRecord {
                        entity: group.key.clone(),
                        cutoff: window.start,
                        label: output.value,
                        extras: output.extras,
                    });
                }
                Err(err) => match config.on_error {
                    ErrorPolicy::Abort => {
                        return Err(LabelcraftError::Labeling {
                            entity: group.key.clone(),
                            cutoff: window.start.to_rfc3339(),
                            message: format!("{:#}", err),
                        });
                    }
                    ErrorPolicy::Skip => {
                        summary.failed += 1;
                        log::warn!(
                            "Skipping window {} of entity '{}' at {}: {:#}",
                            window.number,
                            group.key,
                            window.start,
                            err
                        );
                    }
                },
            }
        }

        summary.records = records.len();
        log::debug!(
            "Entity '{}': {} windows, {} empty, {} partial, {} failed, {} records",
            summary.entity,
            summary.windows,
            summary.empty,
            summary.partial,
            summary.failed,
            summary.records
        );
        Ok(EntityOutcome { summary, records })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cap_tracker_counts() {
        let mut cap = CapTracker::new(&ExampleLimit::Count(2));
        assert!(!cap.is_full());
        assert!(cap.admit(&Value::Integer(1)));
        assert!(cap.admit(&Value::Integer(1)));
        assert!(cap.is_full());
        assert!(!cap.admit(&Value::Integer(1)));

        let zero = CapTracker::new(&ExampleLimit::Count(0));
        assert!(zero.is_full());
    }

    #[test]
    fn test_cap_tracker_per_label() {
        let mut counts = BTreeMap::new();
        counts.insert("true".to_string(), 1);
        counts.insert("false".to_string(), 2);
        let mut cap = CapTracker::new(&ExampleLimit::PerLabel(counts));

        assert!(cap.admit(&Value::Bool(true)));
        assert!(!cap.admit(&Value::Bool(true)));
        assert!(!cap.admit(&Value::String("other".to_string())));
        assert!(cap.admit(&Value::Bool(false)));
        assert!(!cap.is_full());
        assert!(cap.admit(&Value::Bool(false)));
        assert!(cap.is_full());
    }
}
