//! Single-writer usage aggregator
//!
//! Workers never touch the usage table. They send [`ClassObservation`]s
//! over a channel and one task folds them into a [`UsageTable`], handing
//! the finished table back through its `JoinHandle` once every sender has
//! been dropped.

use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How often one page used one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassObservation {
    pub class: String,
    pub count: usize,
}

impl ClassObservation {
    pub fn new(class: impl Into<String>, count: usize) -> Self {
        Self {
            class: class.into(),
            count,
        }
    }
}

/// Site-wide class usage counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageTable(HashMap<String, usize>);

impl UsageTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` uses of `class`
    pub fn record(&mut self, class: &str, count: usize) {
        match self.0.get_mut(class) {
            Some(total) => *total += count,
            None => {
                self.0.insert(class.to_string(), count);
            }
        }
    }

    /// Total uses of `class`, zero if never seen
    pub fn get(&self, class: &str) -> usize {
        self.0.get(class).copied().unwrap_or(0)
    }

    /// Returns true if `class` was seen at least once
    pub fn is_used(&self, class: &str) -> bool {
        self.get(class) > 0
    }

    /// Number of distinct classes seen
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0.iter().map(|(class, count)| (class.as_str(), *count))
    }

    /// Entries sorted by descending count, then by name
    pub fn sorted(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

impl FromIterator<ClassObservation> for UsageTable {
    fn from_iter<I: IntoIterator<Item = ClassObservation>>(iter: I) -> Self {
        let mut table = UsageTable::new();
        for observation in iter {
            table.record(&observation.class, observation.count);
        }
        table
    }
}

/// Folds a batch of observations into a table
pub fn aggregate<I>(observations: I) -> UsageTable
where
    I: IntoIterator<Item = ClassObservation>,
{
    observations.into_iter().collect()
}

/// Spawns the aggregator task
///
/// The task ends when the channel closes, which happens once every
/// `Sender` clone is dropped.
pub fn spawn_aggregator(mut receiver: mpsc::Receiver<ClassObservation>) -> JoinHandle<UsageTable> {
    tokio::spawn(async move {
        let mut table = UsageTable::new();
        let mut received = 0usize;

        while let Some(observation) = receiver.recv().await {
            table.record(&observation.class, observation.count);
            received += 1;
        }

        tracing::debug!(
            "Aggregator closed after {} observations, {} distinct classes",
            received,
            table.len()
        );
        table
    })
}
