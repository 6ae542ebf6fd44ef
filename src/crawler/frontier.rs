//! Crawl frontier
//!
//! The identifier space is walked in ascending order. On every job start the
//! frontier is rebuilt from the dataset: it begins just above the largest
//! identifier already recorded, so restarts skip finished work. Records that
//! were in flight when a previous run stopped may still be written twice;
//! the dataset tolerates duplicates.

use crate::storage::JsonlDataset;
use std::io;
use std::ops::Range;

/// Lazy ascending sequence of identifiers to attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frontier {
    next: u64,
    ceiling: u64,
}

impl Frontier {
    /// Creates a frontier over `range` (end exclusive)
    pub fn new(range: Range<u64>) -> Self {
        Self {
            next: range.start,
            ceiling: range.end,
        }
    }

    /// Creates a frontier that resumes above the dataset's largest identifier
    ///
    /// # Arguments
    ///
    /// * `dataset` - The dataset to scan
    /// * `floor` - First identifier when the dataset is empty or missing
    /// * `ceiling` - Exclusive upper bound
    pub fn resume(dataset: &JsonlDataset, floor: u64, ceiling: u64) -> io::Result<Self> {
        let start = resume_point(dataset.max_professor_id()?, floor);
        Ok(Self::new(start..ceiling))
    }

    /// Next identifier that would be produced
    pub fn peek(&self) -> Option<u64> {
        (self.next < self.ceiling).then_some(self.next)
    }

    /// Exclusive upper bound
    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Identifiers left to produce
    pub fn remaining(&self) -> u64 {
        self.ceiling.saturating_sub(self.next)
    }
}

impl Iterator for Frontier {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let id = self.peek()?;
        self.next += 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining());
        (remaining.unwrap_or(usize::MAX), remaining.ok())
    }
}

/// First identifier to attempt given the largest recorded one
pub fn resume_point(max_recorded: Option<u64>, floor: u64) -> u64 {
    match max_recorded {
        Some(max) if max >= floor => max.saturating_add(1),
        _ => floor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn dataset_with(lines: &str) -> (TempDir, JsonlDataset) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("professors_dataset.jsonl");
        std::fs::write(&path, lines).unwrap();
        (dir, JsonlDataset::new(path))
    }

    #[test]
    fn test_resume_above_max_recorded() {
        let (_dir, dataset) = dataset_with(
            "{\"professor_id\":3}\n{\"professor_id\":12}\n{\"professor_id\":7}\n",
        );

        let mut frontier = Frontier::resume(&dataset, 1, 100).unwrap();
        assert_eq!(frontier.next(), Some(13));
        assert!(frontier.all(|id| id > 12));
    }

    #[test]
    fn test_missing_dataset_starts_at_floor() {
        let dir = TempDir::new().unwrap();
        let dataset = JsonlDataset::new(dir.path().join("absent.jsonl"));

        let frontier = Frontier::resume(&dataset, 1, 100).unwrap();
        assert_eq!(frontier.peek(), Some(1));
    }

    #[test]
    fn test_empty_dataset_starts_at_floor() {
        let (_dir, dataset) = dataset_with("");
        let frontier = Frontier::resume(&dataset, 5, 100).unwrap();
        assert_eq!(frontier.peek(), Some(5));
    }

    #[test]
    fn test_floor_above_recorded_ids() {
        assert_eq!(resume_point(Some(40), 1000), 1000);
        assert_eq!(resume_point(Some(1000), 1000), 1001);
        assert_eq!(resume_point(None, 1), 1);
    }

    #[test]
    fn test_sequence_is_ascending_and_bounded() {
        let frontier = Frontier::new(10..15);
        assert_eq!(frontier.remaining(), 5);
        assert_eq!(frontier.collect::<Vec<_>>(), vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn test_exhausted_frontier() {
        let mut frontier = Frontier::new(7..7);
        assert_eq!(frontier.peek(), None);
        assert_eq!(frontier.next(), None);

        let (_dir, dataset) = dataset_with("{\"professor_id\":99}\n");
        let mut frontier = Frontier::resume(&dataset, 1, 100).unwrap();
        assert_eq!(frontier.next(), None);
    }
}
