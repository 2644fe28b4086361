use super::span::{MinimumData, Span, WindowSize};
use crate::types::Timestamp;
use std::ops::Range;

/// Resolved windowing parameters for one search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowPlan {
    pub window_size: WindowSize,
    pub gap: Option<Span>,
    pub minimum_data: Option<MinimumData>,
    pub maximum_data: Option<Span>,
}

impl WindowPlan {
    pub fn new(window_size: WindowSize) -> Self {
        Self {
            window_size,
            gap: None,
            minimum_data: None,
            maximum_data: None,
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

    /// Configured gap, falling back to the window size.
    pub fn effective_gap(&self) -> Option<Span> {
        self.gap.or_else(|| self.window_size.default_gap())
    }
}

/// One window over an entity stream.
///
/// `start` is the cutoff time. Rows are indices into the entity's slice and
/// every row timestamp lies in `[start, end)`, or `[start, end]` when
/// `closed_end` is set (row-count windows and truncated final windows).
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub number: usize,
    pub start: Timestamp,
    pub end: Timestamp,
    pub closed_end: bool,
    pub next_start: Option<Timestamp>,
    pub rows: Range<usize>,
    pub partial: bool,
}

impl Window {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.start && (ts < self.end || (self.closed_end && ts == self.end))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Position {
    cutoff: Timestamp,
    // first row of the window
    row: usize,
    // positional row that row-count steps are counted from
    anchor: usize,
}

impl Position {
    fn at(cutoff: Timestamp, row: usize) -> Self {
        Self { cutoff, row, anchor: row }
    }
}

/// Lazy window sequence over one entity's ascending timestamps.
///
/// State is only the next position and the window counter; `reset` restarts
/// the sequence and yields exactly the same windows again.
#[derive(Debug, Clone)]
pub struct WindowCursor<'a> {
    timestamps: &'a [Timestamp],
    plan: WindowPlan,
    position: Option<Position>,
    number: usize,
}

impl<'a> WindowCursor<'a> {
    pub fn new(timestamps: &'a [Timestamp], plan: WindowPlan) -> Self {
        let mut cursor = Self {
            timestamps,
            plan,
            position: None,
            number: 0,
        };
        cursor.reset();
        cursor
    }

    pub fn reset(&mut self) {
        self.number = 0;
        self.position = self.first_position().filter(|p| self.admits(p));
    }

    pub fn plan(&self) -> &WindowPlan {
        &self.plan
    }

    /// Earliest admissible cutoff, if the stream holds enough lead-in data.
    pub fn first_cutoff(&self) -> Option<Timestamp> {
        self.first_position().filter(|p| self.admits(p)).map(|p| p.cutoff)
    }

    fn row_at(&self, from: usize, cutoff: Timestamp) -> usize {
        from + self.timestamps[from..].partition_point(|ts| *ts < cutoff)
    }

    /// Position at a row picked by count. Time-bounded windows still start
    /// at the first row stamped at or after the cutoff, so rows tied with the
    /// anchor are not left out.
    fn anchored(&self, anchor: usize) -> Option<Position> {
        let cutoff = *self.timestamps.get(anchor)?;
        let row = match self.plan.window_size {
            WindowSize::Rows(_) => anchor,
            WindowSize::Duration(_) | WindowSize::All => self.row_at(0, cutoff),
        };
        Some(Position { cutoff, row, anchor })
    }

    fn first_position(&self) -> Option<Position> {
        let first = *self.timestamps.first()?;
        match self.plan.minimum_data {
            None => Some(Position::at(first, 0)),
            Some(MinimumData::Duration(offset)) => {
                let cutoff = offset.after(first);
                Some(Position::at(cutoff, self.row_at(0, cutoff)))
            }
            Some(MinimumData::Rows(rows)) => self.anchored(rows),
            Some(MinimumData::Cutoff(cutoff)) => Some(Position::at(cutoff, self.row_at(0, cutoff))),
        }
    }

    fn admits(&self, position: &Position) -> bool {
        if position.row >= self.timestamps.len() {
            return false;
        }
        match self.plan.maximum_data {
            None => true,
            Some(Span::Rows(rows)) => position.anchor < rows,
            Some(Span::Duration(offset)) => match self.timestamps.first() {
                Some(&first) => position.cutoff <= offset.after(first),
                None => false,
            },
        }
    }

    // Non-positive gaps never advance; config validation rejects them earlier.
    fn advance(&self, position: Position) -> Option<Position> {
        match self.plan.effective_gap()? {
            Span::Duration(offset) if !offset.is_positive() => None,
            Span::Rows(0) => None,
            Span::Duration(offset) => {
                let cutoff = offset.after(position.cutoff);
                Some(Position::at(cutoff, self.row_at(position.row, cutoff)))
            }
            Span::Rows(rows) => self.anchored(position.anchor.checked_add(rows)?),
        }
    }

    fn materialize(&self, position: Position, next_start: Option<Timestamp>) -> Window {
        let len = self.timestamps.len();
        let last = self.timestamps[len - 1];
        let (end, closed_end, end_row, partial) = match self.plan.window_size {
            WindowSize::All => (last, true, len, false),
            WindowSize::Duration(size) => {
                let end = size.after(position.cutoff);
                if end > last {
                    (last, true, len, true)
                } else {
                    (end, false, self.row_at(position.row, end), false)
                }
            }
            WindowSize::Rows(size) => {
                let wanted = position.row.saturating_add(size);
                let end_row = wanted.min(len);
                let end = if end_row > position.row {
                    self.timestamps[end_row - 1]
                } else {
                    position.cutoff
                };
                (end, true, end_row, wanted > len)
            }
        };

        Window {
            number: self.number,
            start: position.cutoff,
            end,
            closed_end,
            next_start,
            rows: position.row..end_row,
            partial,
        }
    }
}

impl Iterator for WindowCursor<'_> {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        let position = self.position.take()?;
        let next = self.advance(position).filter(|p| self.admits(p));
        let window = self.materialize(position, next.map(|p| p.cutoff));
        self.position = next;
        self.number += 1;
        Some(window)
    }
}
