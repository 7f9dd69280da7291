//! Planet ranking and aggregation.
//!
//! This module provides utilities for ranking planets by player count
//! and summarising the ones that don't make the featured list.

use crate::models::{to_fixed, EntityRecord};

/// Planets split into the featured list and an aggregate remainder.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    /// Top planets by player count, most populated first.
    pub featured: Vec<EntityRecord>,
    /// Number of planets folded into the remainder.
    pub other_planets: usize,
    /// Combined player count of the remainder.
    pub other_count: u64,
}

/// Sort planets by player count, highest first.
///
/// The sort is stable: planets with equal counts keep their fetch order.
pub fn sort_by_participants(records: &mut [EntityRecord]) {
    records.sort_by(|a, b| b.participant_count.cmp(&a.participant_count));
}

/// Rank planets and split them into the top `featured_count` and the rest.
pub fn rank(mut records: Vec<EntityRecord>, featured_count: usize) -> Ranking {
    sort_by_participants(&mut records);

    let split = featured_count.min(records.len());
    let rest = records.split_off(split);

    Ranking {
        featured: records,
        other_planets: rest.len(),
        other_count: rest.iter().map(|r| r.participant_count).sum(),
    }
}

/// Total player count across all planets.
pub fn total_participants(records: &[EntityRecord]) -> u64 {
    records.iter().map(|r| r.participant_count).sum()
}

/// Format a player count, collapsing thousands to one-decimal `k` notation.
pub fn format_count(count: u64) -> String {
    if count >= 1000 {
        format!("{}k", to_fixed(count as f64 / 1000.0, 1))
    } else {
        count.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, count: u64) -> EntityRecord {
        EntityRecord::new(name, count, 50.0)
    }

    #[test]
    fn test_sort_is_stable_and_descending() {
        let mut records = vec![
            record("A", 10),
            record("B", 50),
            record("C", 50),
            record("D", 5),
        ];

        sort_by_participants(&mut records);

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C", "A", "D"]);
    }

    #[test]
    fn test_rank_selects_top_and_sums_rest() {
        let records = vec![
            record("A", 100),
            record("B", 700),
            record("C", 300),
            record("D", 50),
            record("E", 900),
            record("F", 20),
            record("G", 400),
        ];

        let ranking = rank(records, 5);

        let names: Vec<_> = ranking.featured.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["E", "B", "G", "C", "A"]);
        assert_eq!(ranking.other_planets, 2);
        assert_eq!(ranking.other_count, 70);
    }

    #[test]
    fn test_rank_with_fewer_than_featured() {
        let ranking = rank(vec![record("A", 1), record("B", 2)], 5);
        assert_eq!(ranking.featured.len(), 2);
        assert_eq!(ranking.other_planets, 0);
        assert_eq!(ranking.other_count, 0);

        let ranking = rank(Vec::new(), 5);
        assert!(ranking.featured.is_empty());
        assert_eq!(ranking.other_count, 0);
    }

    #[test]
    fn test_rank_preserves_total() {
        let records: Vec<_> = (0..12).map(|i| record(&format!("P{}", i), i * 37)).collect();
        let total = total_participants(&records);

        let ranking = rank(records, 5);
        let featured_total: u64 = ranking.featured.iter().map(|r| r.participant_count).sum();

        assert_eq!(ranking.featured.len(), 5);
        assert_eq!(ranking.other_planets, 7);
        assert_eq!(featured_total + ranking.other_count, total);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1.0k");
        assert_eq!(format_count(12345), "12.3k");
        assert_eq!(format_count(1250), "1.3k");
        assert_eq!(format_count(3250), "3.3k");
        assert_eq!(format_count(1150), "1.1k");
        assert_eq!(format_count(250_000), "250.0k");
    }
}
