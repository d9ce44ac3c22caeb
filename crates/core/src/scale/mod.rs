//! Value → pixel mappings shared by every frame of a session.
//!
//! The domain is taken once over all periods so that bubble sizes and
//! heights stay comparable for the whole animation.

use serde::{Deserialize, Serialize};

use crate::{ChartConfig, DataTable, Frame, Period, RankChartError, Result};

/// Categorical colors, indexed by `row % 10`.
pub const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const DEFAULT_TICK_COUNT: usize = 10;

/// Continuous linear map from `domain` onto `range`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    pub domain: [f64; 2],
    pub range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    /// Maps `value` onto the range. A zero-width domain maps everything to
    /// the middle of the range.
    pub fn map(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            return r0 + (r1 - r0) * 0.5;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    /// Widens the domain outward to multiples of a round tick step.
    pub fn nice(mut self, count: usize) -> Self {
        let [mut lo, mut hi] = self.domain;
        if !(hi > lo) {
            return self;
        }

        let mut previous = None;
        for _ in 0..10 {
            let step = tick_step(lo, hi, count);
            if previous == Some(step) {
                break;
            }
            lo = (lo / step).floor() * step;
            hi = (hi / step).ceil() * step;
            previous = Some(step);
        }

        self.domain = [lo, hi];
        self
    }

    /// Round values inside the domain, roughly `count` of them.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let [lo, hi] = self.domain;
        if !(hi > lo) {
            return if lo.is_finite() { vec![lo] } else { Vec::new() };
        }

        let step = tick_step(lo, hi, count);
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    }
}

/// Evenly spaced categorical positions, one per period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointScale {
    pub domain: Vec<Period>,
    pub range: [f64; 2],
}

impl PointScale {
    pub fn new(domain: Vec<Period>, range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn position(&self, index: usize) -> f64 {
        let [r0, r1] = self.range;
        match self.domain.len() {
            0 | 1 => r0 + (r1 - r0) * 0.5,
            n => r0 + (r1 - r0) * index as f64 / (n - 1) as f64,
        }
    }

    pub fn position_of(&self, period: &Period) -> Option<f64> {
        self.domain
            .iter()
            .position(|candidate| candidate == period)
            .map(|index| self.position(index))
    }
}

/// Axis label and its pixel coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    pub label: String,
    pub pixel: f64,
}

/// The three mappings derived from a table: period → x, value → y and
/// value → radius. Colors are keyed by table row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSet {
    x: PointScale,
    y: LinearScale,
    radius: LinearScale,
}

impl ScaleSet {
    pub fn from_table(table: &DataTable, config: &ChartConfig) -> Self {
        let domain = table
            .value_domain()
            .map(|(min, max)| [min, max])
            .unwrap_or([0.0, 0.0]);
        let [top, bottom] = config.canvas.y_span();

        let mut y = LinearScale::new(domain, [bottom, top]);
        let mut radius = LinearScale::new(domain, config.scale.radius_range);
        if config.scale.nice {
            y = y.nice(DEFAULT_TICK_COUNT);
            radius = radius.nice(DEFAULT_TICK_COUNT);
        }

        Self {
            x: PointScale::new(table.periods().to_vec(), config.canvas.x_span()),
            y,
            radius,
        }
    }

    pub fn x_for_period(&self, period: &Period) -> Option<f64> {
        self.x.position_of(period)
    }

    pub fn y_for_value(&self, value: f64) -> f64 {
        self.y.map(value)
    }

    pub fn radius_for_value(&self, value: f64) -> f64 {
        self.radius.map(value)
    }

    pub fn color_for_row(&self, row: usize) -> &'static str {
        CATEGORY10[row % CATEGORY10.len()]
    }

    /// Fills in radius and attraction targets for every entry and parks each
    /// entry on its target.
    pub fn annotate(&self, mut frame: Frame) -> Result<Frame> {
        let target_x =
            self.x_for_period(&frame.period)
                .ok_or_else(|| RankChartError::UnknownPeriod {
                    period: frame.period.to_string(),
                })?;

        for entry in &mut frame.entries {
            entry.radius = self.radius_for_value(entry.value);
            entry.target_x = target_x;
            entry.target_y = self.y_for_value(entry.value);
            entry.x = entry.target_x;
            entry.y = entry.target_y;
        }

        Ok(frame)
    }

    pub fn value_ticks(&self, count: usize) -> Vec<Tick> {
        let values = self.y.ticks(count);
        let decimals = label_decimals(&values);
        values
            .into_iter()
            .map(|value| Tick {
                label: format!("{value:.decimals$}"),
                pixel: self.y.map(value),
            })
            .collect()
    }

    pub fn period_ticks(&self) -> Vec<Tick> {
        self.x
            .domain
            .iter()
            .enumerate()
            .map(|(index, period)| Tick {
                label: period.to_string(),
                pixel: self.x.position(index),
            })
            .collect()
    }
}

fn tick_step(lo: f64, hi: f64, count: usize) -> f64 {
    let raw = (hi - lo) / count.max(1) as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * power
}

fn label_decimals(values: &[f64]) -> usize {
    match values {
        [first, second, ..] => {
            let step = (second - first).abs();
            if step >= 1.0 {
                0
            } else {
                (-step.log10().floor()) as usize
            }
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract_top_n;

    fn table() -> DataTable {
        DataTable::from_json_str(
            r#"[
                ["name", "yearsListed", "img", "num", "2019", "2020", "2021"],
                ["A", 1, "", 1, 2400, 2500, 2790],
                ["B", 1, "", 2, 2600, 2700, null],
                ["C", 1, "", 3, null, 2650, 2610]
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn uses_global_domain_across_periods() {
        let scales = ScaleSet::from_table(&table(), &ChartConfig::default());

        assert_eq!(scales.radius_for_value(2400.0), 5.0);
        assert_eq!(scales.radius_for_value(2790.0), 40.0);
        assert_eq!(scales.y_for_value(2400.0), 550.0);
        assert_eq!(scales.y_for_value(2790.0), 20.0);
    }

    #[test]
    fn radius_grows_with_value() {
        let scales = ScaleSet::from_table(&table(), &ChartConfig::default());
        let mut previous = f64::MIN;
        for value in (2400..=2790).step_by(13) {
            let radius = scales.radius_for_value(value as f64);
            assert!(radius >= previous);
            previous = radius;
        }
    }

    #[test]
    fn periods_are_evenly_spaced() {
        let scales = ScaleSet::from_table(&table(), &ChartConfig::default());
        assert_eq!(scales.x_for_period(&Period::from("2019")), Some(40.0));
        assert_eq!(scales.x_for_period(&Period::from("2020")), Some(490.0));
        assert_eq!(scales.x_for_period(&Period::from("2021")), Some(940.0));
        assert_eq!(scales.x_for_period(&Period::from("1990")), None);
    }

    #[test]
    fn single_period_and_flat_domain_use_midpoints() {
        let x = PointScale::new(vec![Period::from("2020")], [0.0, 100.0]);
        assert_eq!(x.position(0), 50.0);

        let flat = LinearScale::new([7.0, 7.0], [5.0, 40.0]);
        assert_eq!(flat.map(7.0), 22.5);
    }

    #[test]
    fn nice_extends_to_round_bounds() {
        let scale = LinearScale::new([2403.0, 2787.0], [0.0, 1.0]).nice(10);
        assert_eq!(scale.domain, [2400.0, 2800.0]);
        assert_eq!(scale.ticks(10).len(), 9);
    }

    #[test]
    fn annotate_targets_period_column() {
        let table = table();
        let scales = ScaleSet::from_table(&table, &ChartConfig::default());
        let frame = extract_top_n(&table, &Period::from("2020"), 3).unwrap();
        let frame = scales.annotate(frame).unwrap();

        for entry in &frame.entries {
            assert_eq!(entry.target_x, 490.0);
            assert_eq!(entry.x, entry.target_x);
            assert_eq!(entry.target_y, scales.y_for_value(entry.value));
        }
    }

    #[test]
    fn value_ticks_land_inside_plot() {
        let scales = ScaleSet::from_table(&table(), &ChartConfig::default());
        let ticks = scales.value_ticks(5);
        assert!(!ticks.is_empty());
        assert!(ticks.iter().all(|tick| tick.pixel >= 20.0 && tick.pixel <= 550.0));
        assert_eq!(ticks[0].label, "2400");
    }
}
