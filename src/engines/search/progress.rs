use crate::labels::EntitySummary;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

/// Side channel for search progress. Never affects the produced labels.
pub trait ProgressCallback: Send {
    fn on_search_start(&mut self, _total_entities: usize) {}

    fn on_entity_complete(&mut self, index: usize, summary: &EntitySummary);

    fn on_search_complete(&mut self, _total_records: usize) {}

    /// Polled between entities only; a window is never interrupted.
    fn should_stop(&self) -> bool {
        false
    }
}

pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_entity_complete(&mut self, _index: usize, _summary: &EntitySummary) {}
}

/// Prints a line every `every` entities, like a progress bar for terminals.
pub struct ConsoleProgress {
    total: usize,
    every: usize,
    records: usize,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            total: 0,
            every: 1,
            records: 0,
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_search_start(&mut self, total_entities: usize) {
        self.total = total_entities;
        self.every = (total_entities / 20).max(1);
        println!("Searching {} entities...", total_entities);
    }

    fn on_entity_complete(&mut self, index: usize, summary: &EntitySummary) {
        self.records += summary.records;
        let done = index + 1;
        if done % self.every == 0 || done == self.total {
            println!(
                "  Elapsed entities {}/{} ({:.0}%), {} examples so far",
                done,
                self.total,
                done as f64 / self.total.max(1) as f64 * 100.0,
                self.records
            );
        }
    }

    fn on_search_complete(&mut self, total_records: usize) {
        println!("Search complete: {} label records", total_records);
    }
}

pub enum ProgressMessage {
    SearchStart(usize),
    EntityComplete { index: usize, summary: EntitySummary },
    SearchComplete(usize),
}

/// Forwards progress over a channel, e.g. to a UI thread, and lets that
/// side request a stop through a shared flag.
pub struct ChannelProgress {
    sender: Sender<ProgressMessage>,
    stop: Arc<AtomicBool>,
}

impl ChannelProgress {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self {
            sender,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = stop;
        self
    }

    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }
}

impl ProgressCallback for ChannelProgress {
    fn on_search_start(&mut self, total_entities: usize) {
        let _ = self.sender.send(ProgressMessage::SearchStart(total_entities));
    }

    fn on_entity_complete(&mut self, index: usize, summary: &EntitySummary) {
        let _ = self.sender.send(ProgressMessage::EntityComplete {
            index,
            summary: summary.clone(),
        });
    }

    fn on_search_complete(&mut self, total_records: usize) {
        let _ = self.sender.send(ProgressMessage::SearchComplete(total_records));
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}
