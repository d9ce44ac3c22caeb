use std::{cell::RefCell, collections::HashSet, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{Frame, Period, ScaleSet};

/// A bubble as the renderer draws it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub value: f64,
    pub color_key: usize,
    pub color: String,
    pub label: String,
}

/// Membership change between two consecutive emitted frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameDiff {
    pub entered: Vec<String>,
    pub updated: Vec<String>,
    pub exited: Vec<String>,
}

impl FrameDiff {
    /// `entered` and `updated` follow the order of `next`, `exited` the order
    /// of `previous`.
    pub fn between(previous: &[String], next: &Frame) -> Self {
        let before: HashSet<&str> = previous.iter().map(String::as_str).collect();
        let after: HashSet<&str> = next.ids().collect();

        let (updated, entered): (Vec<String>, Vec<String>) = next
            .ids()
            .map(str::to_string)
            .partition(|id| before.contains(id.as_str()));
        let exited = previous
            .iter()
            .filter(|id| !after.contains(id.as_str()))
            .cloned()
            .collect();

        Self {
            entered,
            updated,
            exited,
        }
    }
}

/// Everything the renderer needs for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameUpdate {
    pub period: Period,
    pub index: usize,
    pub sprites: Vec<Sprite>,
    pub diff: FrameDiff,
}

impl FrameUpdate {
    pub fn new(index: usize, frame: &Frame, scales: &ScaleSet, diff: FrameDiff) -> Self {
        let sprites = frame
            .entries
            .iter()
            .map(|entry| Sprite {
                id: entry.id.clone(),
                x: entry.x,
                y: entry.y,
                radius: entry.radius,
                value: entry.value,
                color_key: entry.row,
                color: scales.color_for_row(entry.row).to_string(),
                label: entry.id.clone(),
            })
            .collect();

        Self {
            period: frame.period.clone(),
            index,
            sprites,
            diff,
        }
    }
}

/// Consumer of laid-out frames.
pub trait Renderer {
    fn present(&mut self, update: FrameUpdate);
}

/// Keeps every presented update. Clones share the same log.
#[derive(Debug, Default, Clone)]
pub struct FrameLog {
    shared: Rc<RefCell<Vec<FrameUpdate>>>,
}

impl FrameLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<FrameUpdate> {
        self.shared.borrow().clone()
    }

    pub fn take(&self) -> Vec<FrameUpdate> {
        std::mem::take(&mut *self.shared.borrow_mut())
    }

    pub fn len(&self) -> usize {
        self.shared.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.borrow().is_empty()
    }

    /// Period indices of the presented updates, in presentation order.
    pub fn index_trace(&self) -> Vec<usize> {
        self.shared.borrow().iter().map(|update| update.index).collect()
    }
}

impl Renderer for FrameLog {
    fn present(&mut self, update: FrameUpdate) {
        self.shared.borrow_mut().push(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RankedEntry;

    fn frame(ids: &[&str]) -> Frame {
        Frame {
            period: Period::from("2020"),
            entries: ids
                .iter()
                .enumerate()
                .map(|(row, id)| RankedEntry {
                    id: id.to_string(),
                    row,
                    value: 100.0 - row as f64,
                    radius: 10.0,
                    target_x: 0.0,
                    target_y: 0.0,
                    x: 0.0,
                    y: 0.0,
                })
                .collect(),
        }
    }

    fn owned(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn diff_splits_membership() {
        let diff = FrameDiff::between(&owned(&["A", "B", "C"]), &frame(&["B", "D", "A"]));

        assert_eq!(diff.entered, owned(&["D"]));
        assert_eq!(diff.updated, owned(&["B", "A"]));
        assert_eq!(diff.exited, owned(&["C"]));
    }

    #[test]
    fn first_frame_enters_everything() {
        let diff = FrameDiff::between(&[], &frame(&["A", "B"]));
        assert_eq!(diff.entered, owned(&["A", "B"]));
        assert!(diff.updated.is_empty() && diff.exited.is_empty());
    }

    #[test]
    fn frame_log_records_index_trace() {
        let log = FrameLog::new();
        let mut renderer = log.clone();
        let table = crate::DataTable::from_json_str(
            r#"[["name", "yearsListed", "img", "num", "2020"], ["A", 1, "", 1, 5]]"#,
        )
        .unwrap();
        let scales = ScaleSet::from_table(&table, &crate::ChartConfig::default());

        renderer.present(FrameUpdate::new(3, &frame(&["A"]), &scales, FrameDiff::default()));
        assert_eq!(log.index_trace(), vec![3]);
        assert_eq!(log.updates()[0].sprites[0].color, "#1f77b4");
        assert_eq!(log.take().len(), 1);
        assert!(log.is_empty());
    }
}
