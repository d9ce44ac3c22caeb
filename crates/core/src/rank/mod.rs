use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{DataTable, Period, RankChartError, Result};

/// One entity's slot in a period's frame.
///
/// `radius`, `target_x` and `target_y` are filled in by the
/// [`ScaleSet`](crate::ScaleSet); `x` and `y` by the
/// [`LayoutEngine`](crate::LayoutEngine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub id: String,
    /// Table row of the entity. Used as tie-break and color key.
    pub row: usize,
    pub value: f64,
    pub radius: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub x: f64,
    pub y: f64,
}

impl RankedEntry {
    fn unplaced(id: &str, row: usize, value: f64) -> Self {
        Self {
            id: id.to_string(),
            row,
            value,
            radius: 0.0,
            target_x: 0.0,
            target_y: 0.0,
            x: 0.0,
            y: 0.0,
        }
    }

    /// Distance between two centres minus the sum of both radii. Negative
    /// values mean the circles overlap.
    pub fn clearance(&self, other: &RankedEntry) -> f64 {
        (self.x - other.x).hypot(self.y - other.y) - (self.radius + other.radius)
    }
}

/// Ranked entries visible for one period, sorted by value descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub period: Period,
    pub entries: Vec<RankedEntry>,
}

impl Frame {
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    /// Largest pairwise overlap depth, `0.0` when no circles intersect.
    pub fn max_overlap(&self) -> f64 {
        let mut worst: f64 = 0.0;
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                worst = worst.max(-a.clearance(b));
            }
        }
        worst
    }
}

/// Selects the `n` highest-valued entities for `period`.
///
/// Entities whose value is absent or not finite are skipped. Equal values
/// keep table row order. Asking for more entries than qualify returns fewer;
/// zero qualifying entities is [`RankChartError::EmptyPeriod`].
pub fn extract_top_n(table: &DataTable, period: &Period, n: usize) -> Result<Frame> {
    let index = table.period_index(period)?;

    let mut entries: Vec<RankedEntry> = table
        .entities()
        .iter()
        .filter_map(|entity| {
            entity
                .value_at(index)
                .filter(|value| value.is_finite())
                .map(|value| RankedEntry::unplaced(entity.id(), entity.row(), value))
        })
        .collect();

    if entries.is_empty() {
        return Err(RankChartError::EmptyPeriod {
            period: period.to_string(),
        });
    }

    entries.sort_by(rank_order);
    entries.truncate(n);

    Ok(Frame {
        period: period.clone(),
        entries,
    })
}

fn rank_order(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    b.value
        .partial_cmp(&a.value)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.row.cmp(&b.row))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        DataTable::from_json_str(
            r#"[
                ["name", "yearsListed", "img", "num", "2020", "2021", "2022"],
                ["C", 1, "", 1, 80, 70, null],
                ["A", 1, "", 2, 100, 60, null],
                ["B", 1, "", 3, 90, 90, null],
                ["D", 1, "", 4, null, 95, "x"],
                ["E", 1, "", 5, 90, 50, ""]
            ]"#,
        )
        .unwrap()
    }

    fn ids(frame: &Frame) -> Vec<&str> {
        frame.ids().collect()
    }

    #[test]
    fn takes_top_two_in_value_order() {
        let frame = extract_top_n(&table(), &Period::from("2020"), 2).unwrap();
        assert_eq!(ids(&frame), ["A", "B"]);
        assert_eq!(frame.entries[0].value, 100.0);
        assert_eq!(frame.entries[1].value, 90.0);
    }

    #[test]
    fn ties_keep_table_order() {
        let frame = extract_top_n(&table(), &Period::from("2020"), 10).unwrap();
        assert_eq!(ids(&frame), ["A", "B", "E", "C"]);
    }

    #[test]
    fn absent_entity_only_joins_where_it_has_a_value() {
        let table = table();
        let first = extract_top_n(&table, &Period::from("2020"), 10).unwrap();
        assert!(!ids(&first).contains(&"D"));

        let second = extract_top_n(&table, &Period::from("2021"), 2).unwrap();
        assert_eq!(ids(&second), ["D", "B"]);
    }

    #[test]
    fn values_are_non_increasing_and_bounded_by_n() {
        let table = table();
        for period in table.periods().iter().take(2) {
            for n in 0..6 {
                let frame = extract_top_n(&table, period, n).unwrap();
                assert!(frame.entries.len() <= n);
                assert!(frame
                    .entries
                    .windows(2)
                    .all(|pair| pair[0].value >= pair[1].value));
            }
        }
    }

    #[test]
    fn period_without_finite_values_is_empty() {
        let err = extract_top_n(&table(), &Period::from("2022"), 5).unwrap_err();
        assert!(err.is_empty_period());
    }
}
