use crate::engines::windowing::Window;
use crate::error::{LabelcraftError, Result};
use crate::types::{Timestamp, Value};

/// Where a window sits in its entity stream.
#[derive(Debug, Clone, Copy)]
pub struct WindowContext<'a> {
    pub entity: &'a str,
    pub number: usize,
    pub start: Timestamp,
    pub end: Timestamp,
    pub next_start: Option<Timestamp>,
    pub partial: bool,
}

/// Read-only slice of one entity's events handed to a labeling function.
///
/// Only rows whose timestamps fall inside the window are reachable.
#[derive(Debug, Clone, Copy)]
pub struct WindowView<'a> {
    context: WindowContext<'a>,
    columns: &'a [String],
    timestamps: &'a [Timestamp],
    rows: &'a [Vec<Value>],
}

impl<'a> WindowView<'a> {
    /// `timestamps` and `rows` are the whole entity stream; the view narrows
    /// them to `window.rows`.
    pub fn new(
        entity: &'a str,
        window: &Window,
        columns: &'a [String],
        timestamps: &'a [Timestamp],
        rows: &'a [Vec<Value>],
    ) -> Self {
        Self {
            context: WindowContext {
                entity,
                number: window.number,
                start: window.start,
                end: window.end,
                next_start: window.next_start,
                partial: window.partial,
            },
            columns,
            timestamps: &timestamps[window.rows.clone()],
            rows: &rows[window.rows.clone()],
        }
    }

    pub fn context(&self) -> &WindowContext<'a> {
        &self.context
    }

    pub fn entity(&self) -> &'a str {
        self.context.entity
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    pub fn timestamps(&self) -> &'a [Timestamp] {
        self.timestamps
    }

    pub fn rows(&self) -> &'a [Vec<Value>] {
        self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, &'a [Value])> + 'a {
        self.timestamps
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &'a Value> + 'a> {
        let index = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| LabelcraftError::MissingColumn {
                column: name.to_string(),
                available: self.columns.to_vec(),
            })?;
        Ok(self.rows.iter().map(move |row| &row[index]))
    }

    /// Numeric values of a column; nulls and non-numeric cells are skipped.
    pub fn f64_values(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self
            .column(name)?
            .filter_map(Value::as_f64)
            .filter(|v| !v.is_nan())
            .collect())
    }

    pub fn last(&self, name: &str) -> Result<Option<&'a Value>> {
        Ok(self.column(name)?.last())
    }
}
