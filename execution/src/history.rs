//! Recent results and hot/cold statistics derived from them.

use std::collections::VecDeque;

use croupier_types::casino::{is_black, is_red, HISTORY_LEN, POCKET_COUNT};
use croupier_types::RoundRecord;

/// Red/black/green tally over the window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorCounts {
    pub red: usize,
    pub black: usize,
    pub green: usize,
}

/// A bounded window of completed rounds, oldest first.
#[derive(Clone, Debug)]
pub struct RoundHistory {
    records: VecDeque<RoundRecord>,
    capacity: usize,
}

impl Default for RoundHistory {
    fn default() -> Self {
        Self::new(HISTORY_LEN)
    }
}

impl RoundHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Seed from previously stored records (oldest first).
    pub fn from_records(capacity: usize, records: impl IntoIterator<Item = RoundRecord>) -> Self {
        let mut history = Self::new(capacity);
        for record in records {
            history.push(record);
        }
        history
    }

    pub fn push(&mut self, record: RoundRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&RoundRecord> {
        self.records.back()
    }

    /// Up to `limit` winning numbers, newest first.
    pub fn recent_numbers(&self, limit: usize) -> Vec<u8> {
        self.records
            .iter()
            .rev()
            .take(limit)
            .map(|record| record.winning_number)
            .collect()
    }

    fn frequencies(&self) -> [usize; POCKET_COUNT] {
        let mut counts = [0usize; POCKET_COUNT];
        for record in &self.records {
            if let Some(count) = counts.get_mut(record.winning_number as usize) {
                *count += 1;
            }
        }
        counts
    }

    /// Most frequent numbers, ties broken by the lower number.
    pub fn hot_numbers(&self, limit: usize) -> Vec<(u8, usize)> {
        let mut ranked: Vec<(u8, usize)> = self
            .frequencies()
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(number, count)| (number as u8, *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Least frequent numbers (including ones never drawn), ties broken by the lower number.
    pub fn cold_numbers(&self, limit: usize) -> Vec<(u8, usize)> {
        let mut ranked: Vec<(u8, usize)> = self
            .frequencies()
            .iter()
            .enumerate()
            .map(|(number, count)| (number as u8, *count))
            .collect();
        ranked.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    pub fn color_counts(&self) -> ColorCounts {
        let mut counts = ColorCounts::default();
        for record in &self.records {
            let number = record.winning_number;
            if is_red(number) {
                counts.red += 1;
            } else if is_black(number) {
                counts.black += 1;
            } else {
                counts.green += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(numbers: &[u8]) -> Vec<RoundRecord> {
        numbers
            .iter()
            .enumerate()
            .map(|(i, n)| RoundRecord {
                round_id: i as u64 + 1,
                winning_number: *n,
            })
            .collect()
    }

    #[test]
    fn test_window_drops_oldest() {
        let history = RoundHistory::from_records(3, records(&[1, 2, 3, 4]));
        assert_eq!(history.len(), 3);
        assert_eq!(history.recent_numbers(10), vec![4, 3, 2]);
        assert_eq!(history.last().map(|r| r.round_id), Some(4));
    }

    #[test]
    fn test_hot_and_cold() {
        let history = RoundHistory::from_records(10, records(&[7, 7, 7, 0, 0, 12]));
        assert_eq!(history.hot_numbers(2), vec![(7, 3), (0, 2)]);
        let cold = history.cold_numbers(3);
        assert_eq!(cold, vec![(1, 0), (2, 0), (3, 0)]);
    }

    #[test]
    fn test_color_counts() {
        let history = RoundHistory::from_records(10, records(&[1, 2, 0, 3, 36]));
        assert_eq!(
            history.color_counts(),
            ColorCounts {
                red: 3,
                black: 1,
                green: 1
            }
        );
    }

    #[test]
    fn test_empty_history() {
        let history = RoundHistory::default();
        assert!(history.is_empty());
        assert!(history.hot_numbers(5).is_empty());
        assert_eq!(history.cold_numbers(1), vec![(0, 0)]);
    }
}
