// src/data_input/dataset.rs

use ndarray::Array1;

use crate::constants::PERIOD_MATCH_TOLERANCE_S;
use crate::data_input::log_data::LogRowData;
use crate::types::PlotPoints;

/// One signal sampled over time (seconds since test start).
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSeries {
    pub time: Array1<f64>,
    pub values: Array1<f64>,
}

impl SampleSeries {
    /// # Panics
    /// Panics if `time` and `values` have different lengths.
    pub fn new(time: Array1<f64>, values: Array1<f64>) -> Self {
        assert_eq!(
            time.len(),
            values.len(),
            "time and values must have the same length"
        );
        Self { time, values }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn points(&self) -> PlotPoints {
        self.time
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }
}

/// All samples logged while one excitation period was applied.
/// Setpoint and controlled variable share the time vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcitationGroup {
    pub period_s: f64,
    pub time: Array1<f64>,
    pub setpoint: Array1<f64>,
    pub controlled: Array1<f64>,
}

impl ExcitationGroup {
    /// # Panics
    /// Panics if the three vectors differ in length.
    pub fn new(
        period_s: f64,
        time: Array1<f64>,
        setpoint: Array1<f64>,
        controlled: Array1<f64>,
    ) -> Self {
        assert!(
            time.len() == setpoint.len() && time.len() == controlled.len(),
            "time, setpoint and controlled must have the same length"
        );
        Self {
            period_s,
            time,
            setpoint,
            controlled,
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Frequency in Hz, or `None` when the period is not a positive finite number.
    pub fn frequency_hz(&self) -> Option<f64> {
        if self.period_s.is_finite() && self.period_s > 0.0 {
            Some(1.0 / self.period_s)
        } else {
            None
        }
    }
}

/// Parsed log rows in file order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<LogRowData>,
}

impl Dataset {
    pub fn new(rows: Vec<LogRowData>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[LogRowData] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Partitions the rows by period, in order of first appearance.
    pub fn groups(&self) -> Vec<ExcitationGroup> {
        let mut buckets: Vec<(f64, Vec<&LogRowData>)> = Vec::new();

        for row in &self.rows {
            match buckets
                .iter_mut()
                .find(|(period, _)| periods_match(*period, row.period_s))
            {
                Some((_, members)) => members.push(row),
                None => buckets.push((row.period_s, vec![row])),
            }
        }

        buckets
            .into_iter()
            .map(|(period, members)| build_group(period, &members))
            .collect()
    }

    /// Unique periods in ascending order.
    pub fn periods(&self) -> Vec<f64> {
        let mut periods: Vec<f64> = self.groups().iter().map(|g| g.period_s).collect();
        periods.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        periods
    }

    /// Group for a single period, e.g. one requested by the user.
    pub fn group_for_period(&self, period_s: f64) -> Option<ExcitationGroup> {
        let members: Vec<&LogRowData> = self
            .rows
            .iter()
            .filter(|row| periods_match(row.period_s, period_s))
            .collect();
        if members.is_empty() {
            None
        } else {
            Some(build_group(members[0].period_s, &members))
        }
    }
}

fn periods_match(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= PERIOD_MATCH_TOLERANCE_S * a.abs().max(b.abs()).max(1.0)
}

fn build_group(period_s: f64, members: &[&LogRowData]) -> ExcitationGroup {
    ExcitationGroup::new(
        period_s,
        members.iter().map(|r| r.time_sec).collect(),
        members.iter().map(|r| r.setpoint).collect(),
        members.iter().map(|r| r.controlled).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(time_sec: f64, period_s: f64, setpoint: f64) -> LogRowData {
        let base = NaiveDate::from_ymd_opt(2024, 5, 10)
            .and_then(|d| d.and_hms_opt(14, 0, 0))
            .unwrap();
        LogRowData {
            timestamp: base + chrono::Duration::milliseconds((time_sec * 1000.0) as i64),
            time_sec,
            period_s,
            setpoint,
            controlled: setpoint * 0.5,
        }
    }

    #[test]
    fn test_groups_keep_first_appearance_order() {
        let dataset = Dataset::new(vec![
            row(0.0, 8.0, 1.0),
            row(0.1, 8.0, 2.0),
            row(0.2, 4.0, 3.0),
            row(0.3, 2.0, 4.0),
            row(0.4, 4.0, 5.0),
        ]);

        assert_eq!(dataset.rows().len(), 5);
        let groups = dataset.groups();
        let periods: Vec<f64> = groups.iter().map(|g| g.period_s).collect();
        assert_eq!(periods, vec![8.0, 4.0, 2.0]);
        assert_eq!(groups[1].time.to_vec(), vec![0.2, 0.4]);
        assert_eq!(groups[1].setpoint.to_vec(), vec![3.0, 5.0]);
        assert_eq!(groups[1].controlled.to_vec(), vec![1.5, 2.5]);
    }

    #[test]
    fn test_periods_are_sorted_and_unique() {
        let dataset = Dataset::new(vec![
            row(0.0, 6.0, 0.0),
            row(0.1, 1.5, 0.0),
            row(0.2, 6.0, 0.0),
            row(0.3, 0.0, 0.0),
        ]);
        assert_eq!(dataset.periods(), vec![0.0, 1.5, 6.0]);
    }

    #[test]
    fn test_periods_within_tolerance_share_a_group() {
        // 0.1 * 3 is not exactly 0.3 after the float round trip
        let dataset = Dataset::new(vec![
            row(0.0, 0.3, 1.0),
            row(0.1, 0.1 * 3.0, 2.0),
            row(0.2, 0.3 + 1e-6, 3.0),
        ]);
        let groups = dataset.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].period_s, 0.3);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(dataset.group_for_period(0.1 * 3.0).map(|g| g.len()), Some(2));
    }

    #[test]
    fn test_group_for_period() {
        let dataset = Dataset::new(vec![row(0.0, 6.0, 1.0), row(0.1, 3.0, 2.0)]);
        let group = dataset.group_for_period(6.0).unwrap();
        assert_eq!(group.len(), 1);
        assert_eq!(group.frequency_hz(), Some(1.0 / 6.0));
        assert!(dataset.group_for_period(5.0).is_none());
    }

    #[test]
    fn test_non_positive_period_has_no_frequency() {
        let group = ExcitationGroup::new(0.0, Array1::zeros(2), Array1::zeros(2), Array1::zeros(2));
        assert_eq!(group.frequency_hz(), None);
        let group =
            ExcitationGroup::new(-2.0, Array1::zeros(2), Array1::zeros(2), Array1::zeros(2));
        assert_eq!(group.frequency_hz(), None);
    }

    #[test]
    fn test_series_points() {
        let series = SampleSeries::new(Array1::from(vec![0.0, 0.5]), Array1::from(vec![1.0, -1.0]));
        assert_eq!(series.points(), vec![(0.0, 1.0), (0.5, -1.0)]);
        assert_eq!(series.len(), 2);
    }
}
