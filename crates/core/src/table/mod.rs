//! Normalised ranking table.
//!
//! The source data is a rectangular JSON array whose first row holds the
//! headers `[name, yearsListed, img, num, period_1, period_2, ...]` and whose
//! remaining rows describe one entity each. Shape problems are reported as
//! [`RankChartError::DataFormat`] here so the ranking code only ever sees a
//! well-formed table.

use std::{collections::HashSet, fmt, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RankChartError, Result};

/// Number of leading metadata columns before the first period column.
const METADATA_COLUMNS: usize = 4;

/// Discrete time key, ordered by its column position in the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(String);

impl Period {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Period {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Descriptive columns carried along with an entity but never ranked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub years_listed: i64,
    pub img: String,
    pub num: i64,
}

/// One row of the table. Immutable once the table is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRecord {
    id: String,
    row: usize,
    metadata: EntityMetadata,
    values: Vec<Option<f64>>,
}

impl EntityRecord {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Zero-based position of the entity among the table's entity rows.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    /// Raw value at the period with the given index. `NaN` marks a cell that
    /// held something other than a number.
    pub fn value_at(&self, period_index: usize) -> Option<f64> {
        self.values.get(period_index).copied().flatten()
    }
}

/// The full record set for a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataTable {
    periods: Vec<Period>,
    entities: Vec<EntityRecord>,
}

impl DataTable {
    /// Builds a table from the raw JSON rows, validating the header row and
    /// every entity row against it.
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut rows = rows.into_iter();
        let headers = rows
            .next()
            .ok_or_else(|| RankChartError::format("missing header row"))?;

        if headers.len() <= METADATA_COLUMNS {
            return Err(RankChartError::format(format!(
                "header row needs at least {} columns, found {}",
                METADATA_COLUMNS + 1,
                headers.len()
            )));
        }

        let mut seen = HashSet::new();
        let mut periods = Vec::with_capacity(headers.len() - METADATA_COLUMNS);
        for (column, header) in headers.iter().enumerate().skip(METADATA_COLUMNS) {
            let label = header_label(header).ok_or_else(|| {
                RankChartError::format(format!("period header in column {column} is empty"))
            })?;
            if !seen.insert(label.clone()) {
                return Err(RankChartError::format(format!(
                    "period `{label}` appears more than once"
                )));
            }
            periods.push(Period::new(label));
        }

        let mut ids = HashSet::new();
        let mut entities = Vec::new();
        for (row, cells) in rows.enumerate() {
            if cells.len() != headers.len() {
                return Err(RankChartError::format(format!(
                    "row {} has {} cells, expected {}",
                    row + 1,
                    cells.len(),
                    headers.len()
                )));
            }

            let id = text_cell(&cells[0]);
            if id.is_empty() {
                return Err(RankChartError::format(format!("row {} has no name", row + 1)));
            }
            if !ids.insert(id.clone()) {
                return Err(RankChartError::format(format!("duplicate entity `{id}`")));
            }

            let metadata = EntityMetadata {
                years_listed: integer_cell(&cells[1]),
                img: text_cell(&cells[2]),
                num: integer_cell(&cells[3]),
            };
            let values = cells[METADATA_COLUMNS..].iter().map(value_cell).collect();

            entities.push(EntityRecord {
                id,
                row,
                metadata,
                values,
            });
        }

        if entities.is_empty() {
            return Err(RankChartError::format("table has no entity rows"));
        }

        tracing::debug!(
            periods = periods.len(),
            entities = entities.len(),
            "loaded ranking table"
        );

        Ok(Self { periods, entities })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let rows: Vec<Vec<Value>> = serde_json::from_str(json)?;
        Self::from_rows(rows)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    pub fn period_index(&self, period: &Period) -> Result<usize> {
        self.periods
            .iter()
            .position(|candidate| candidate == period)
            .ok_or_else(|| RankChartError::UnknownPeriod {
                period: period.to_string(),
            })
    }

    pub fn entity(&self, id: &str) -> Option<&EntityRecord> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    /// Smallest and largest finite value across every period and entity.
    pub fn value_domain(&self) -> Option<(f64, f64)> {
        self.entities
            .iter()
            .flat_map(|entity| entity.values.iter().copied().flatten())
            .filter(|value| value.is_finite())
            .fold(None, |domain, value| match domain {
                None => Some((value, value)),
                Some((min, max)) => Some((min.min(value), max.max(value))),
            })
    }
}

fn header_label(value: &Value) -> Option<String> {
    let label = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!label.is_empty()).then_some(label)
}

fn text_cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

fn integer_cell(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|value| value as i64))
            .unwrap_or(0),
        Value::String(text) => text.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn value_cell(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) if text.trim().is_empty() => None,
        Value::String(text) => Some(text.trim().parse().unwrap_or(f64::NAN)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn rows(value: Value) -> Vec<Vec<Value>> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn parses_headers_metadata_and_cells() {
        let table = DataTable::from_rows(rows(json!([
            ["name", "yearsListed", "img", "num", "2020", "2021"],
            ["Lee", "3", "lee.png", 7, "3510.5", null],
            ["Ke", 2, "", "1", 3620, "n/a"],
        ])))
        .unwrap();

        assert_eq!(table.periods(), &[Period::from("2020"), Period::from("2021")]);
        let lee = table.entity("Lee").unwrap();
        assert_eq!(lee.metadata().years_listed, 3);
        assert_eq!(lee.metadata().num, 7);
        assert_eq!(lee.value_at(0), Some(3510.5));
        assert_eq!(lee.value_at(1), None);

        let ke = table.entity("Ke").unwrap();
        assert_eq!(ke.row(), 1);
        assert!(ke.value_at(1).unwrap().is_nan());
        assert_eq!(table.value_domain(), Some((3510.5, 3620.0)));
    }

    #[test]
    fn rejects_short_header_row() {
        let err = DataTable::from_rows(rows(json!([["name", "yearsListed", "img", "num"]])))
            .unwrap_err();
        assert!(matches!(err, RankChartError::DataFormat(_)));
    }

    #[test]
    fn rejects_ragged_rows_and_duplicates() {
        let ragged = DataTable::from_rows(rows(json!([
            ["name", "yearsListed", "img", "num", "2020"],
            ["A", 1, "", 1],
        ])));
        assert!(matches!(ragged, Err(RankChartError::DataFormat(_))));

        let duplicate = DataTable::from_rows(rows(json!([
            ["name", "yearsListed", "img", "num", "2020"],
            ["A", 1, "", 1, 10],
            ["A", 1, "", 1, 20],
        ])));
        let err = duplicate.unwrap_err();
        assert!(err.to_string().contains("duplicate entity `A`"));
    }

    #[test]
    fn rejects_table_without_entities_or_period_labels() {
        let empty = DataTable::from_json_str(r#"[["name", "yearsListed", "img", "num", "2020"]]"#);
        assert!(matches!(empty, Err(RankChartError::DataFormat(_))));

        let unlabeled = DataTable::from_json_str(
            r#"[["name", "yearsListed", "img", "num", null], ["A", 1, "", 1, 2]]"#,
        );
        assert!(matches!(unlabeled, Err(RankChartError::DataFormat(_))));
    }

    #[test]
    fn unknown_period_is_reported() {
        let table = DataTable::from_json_str(
            r#"[["name", "yearsListed", "img", "num", "2020"], ["A", 1, "", 1, 2]]"#,
        )
        .unwrap();
        let err = table.period_index(&Period::from("1999")).unwrap_err();
        assert!(matches!(err, RankChartError::UnknownPeriod { .. }));
    }
}
