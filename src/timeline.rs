//! Merging supply onto the simulated calendar.
//!
//! The engine runs as a pipeline of value-returning stages instead of
//! mutating one shared table:
//!
//! 1. [`DoseGrid::merge`] left-joins every manufacturer's series onto the
//!    simulated date axis, filling absent dates with zero.
//! 2. [`DoseGrid::accumulate`] turns each daily column into a running
//!    total over the full axis, so shipments received before the campaign
//!    window still count toward cumulative availability inside it.
//! 3. [`MergedTimeline::assemble`] attaches the projected compartments,
//!    totals the cumulative columns, splits them into dose pools, and
//!    keeps only the rows strictly inside the campaign window.
//!
//! [`MergedTimeline::melt`] reshapes the final table into long
//! `(date, series, value)` triples for charting consumers.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocation::split_supply;
use crate::error::VaxlineError;
use crate::log::warn;
use crate::params::Parameters;
use crate::projector::PopulationState;
use crate::supply::SupplySeries;

/// Per-manufacturer dose columns on the simulated date axis.
///
/// Columns hold daily amounts after [`DoseGrid::merge`] and running totals
/// after [`DoseGrid::accumulate`].
#[derive(Debug, Clone, PartialEq)]
pub struct DoseGrid {
    manufacturers: Vec<String>,
    dates: Vec<NaiveDate>,
    doses: Vec<Vec<f64>>,
}

impl DoseGrid {
    /// Left-joins `series` onto the date axis `start_date ..= start_date +
    /// horizon_days`. Dates a manufacturer never shipped on become zero.
    /// Rows dated outside the simulated horizon are dropped and counted in
    /// a warning; duplicate dates within one series are summed.
    ///
    /// # Errors
    /// `VaxlineError::Configuration` if two series share a manufacturer
    /// name.
    pub fn merge(
        parameters: &Parameters,
        series: &[SupplySeries],
    ) -> Result<DoseGrid, VaxlineError> {
        let dates: Vec<NaiveDate> = (0..=parameters.horizon_days)
            .map(|day| parameters.campaign_date(day))
            .collect();
        let first_date = dates[0];
        let last_date = dates[dates.len() - 1];

        let mut seen: HashSet<&str> = HashSet::new();
        let mut manufacturers = Vec::with_capacity(series.len());
        let mut doses = Vec::with_capacity(series.len());
        for one_series in series {
            if !seen.insert(one_series.manufacturer.as_str()) {
                return Err(VaxlineError::config(format!(
                    "duplicate manufacturer name `{}`",
                    one_series.manufacturer
                )));
            }

            let mut by_date: HashMap<NaiveDate, f64> = HashMap::new();
            let mut dropped = 0_usize;
            for record in &one_series.records {
                if record.date < first_date || record.date > last_date {
                    dropped += 1;
                    continue;
                }
                *by_date.entry(record.date).or_insert(0.0) += record.doses as f64;
            }
            if dropped > 0 {
                warn!(
                    "dropped {} supply rows for {} dated outside the simulated horizon {}..{}",
                    dropped, one_series.manufacturer, first_date, last_date
                );
            }

            let column: Vec<f64> = dates
                .iter()
                .map(|date| by_date.get(date).copied().unwrap_or(0.0))
                .collect();
            manufacturers.push(one_series.manufacturer.clone());
            doses.push(column);
        }

        Ok(DoseGrid {
            manufacturers,
            dates,
            doses,
        })
    }

    /// Replaces each daily column with its running total over the full
    /// axis.
    #[must_use]
    pub fn accumulate(mut self) -> DoseGrid {
        for column in &mut self.doses {
            let mut running = 0.0;
            for value in column.iter_mut() {
                running += *value;
                *value = running;
            }
        }
        self
    }
}

/// One emitted day of the merged table. `cumulative` is positionally
/// aligned with [`MergedTimeline::manufacturers`].
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    pub date: NaiveDate,
    pub eligible: f64,
    pub registered: f64,
    pub cumulative: Vec<f64>,
    pub total_vaccine: f64,
    pub first_dose: f64,
    pub second_dose: f64,
}

/// The campaign-window view of supply versus projected demand.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedTimeline {
    pub manufacturers: Vec<String>,
    pub rows: Vec<TimelineRow>,
}

/// One `(date, series, value)` triple of the long-format table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub series: String,
    pub value: f64,
}

impl MergedTimeline {
    /// Joins the projected trajectory with an accumulated [`DoseGrid`],
    /// computes totals and dose pools, and keeps the rows strictly inside
    /// the campaign window (both bounds exclusive). The `internal`
    /// compartment never reaches the table.
    ///
    /// # Errors
    /// `VaxlineError::Configuration` if the trajectory and the grid cover
    /// a different number of days.
    pub fn assemble(
        parameters: &Parameters,
        trajectory: &[PopulationState],
        grid: DoseGrid,
    ) -> Result<MergedTimeline, VaxlineError> {
        if trajectory.len() != grid.dates.len() {
            return Err(VaxlineError::config(format!(
                "trajectory covers {} days but the dose grid covers {}",
                trajectory.len(),
                grid.dates.len()
            )));
        }

        let mut rows = Vec::new();
        for (day, date) in grid.dates.iter().enumerate() {
            if !parameters.in_campaign_window(*date) {
                continue;
            }
            let state = &trajectory[day];
            let cumulative: Vec<f64> = grid.doses.iter().map(|column| column[day]).collect();
            let total_vaccine: f64 = cumulative.iter().sum();
            let (first_dose, second_dose) = split_supply(
                total_vaccine,
                state.registered,
                parameters.first_dose_fraction,
                parameters.allocation_policy,
            );
            rows.push(TimelineRow {
                date: *date,
                eligible: state.eligible,
                registered: state.registered,
                cumulative,
                total_vaccine,
                first_dose,
                second_dose,
            });
        }

        Ok(MergedTimeline {
            manufacturers: grid.manufacturers,
            rows,
        })
    }

    /// Reshapes the table into long format, one series at a time:
    /// `eligible`, `registered`, each manufacturer's cumulative column,
    /// then `total_vaccine`, `first_dose`, `second_dose`.
    #[must_use]
    pub fn melt(&self) -> Vec<SeriesPoint> {
        let mut points =
            Vec::with_capacity(self.rows.len() * (self.manufacturers.len() + 5));
        self.push_series(&mut points, "eligible", |row| row.eligible);
        self.push_series(&mut points, "registered", |row| row.registered);
        for (index, manufacturer) in self.manufacturers.iter().enumerate() {
            self.push_series(&mut points, manufacturer, |row| row.cumulative[index]);
        }
        self.push_series(&mut points, "total_vaccine", |row| row.total_vaccine);
        self.push_series(&mut points, "first_dose", |row| row.first_dose);
        self.push_series(&mut points, "second_dose", |row| row.second_dose);
        points
    }

    fn push_series<F>(&self, points: &mut Vec<SeriesPoint>, series: &str, value: F)
    where
        F: Fn(&TimelineRow) -> f64,
    {
        for row in &self.rows {
            points.push(SeriesPoint {
                date: row.date,
                series: series.to_string(),
                value: value(row),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AllocationPolicy;
    use crate::supply::SupplyRecord;
    use approx::assert_relative_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    /// Six-day axis 2021-06-01..=2021-06-06 with a window keeping only
    /// June 3 and June 4.
    fn test_parameters() -> Parameters {
        Parameters {
            horizon_days: 5,
            start_date: date(2021, 6, 1),
            window_open: date(2021, 6, 2),
            window_close: date(2021, 6, 5),
            ..Default::default()
        }
    }

    fn flat_trajectory(days: usize, eligible: f64, registered: f64) -> Vec<PopulationState> {
        vec![
            PopulationState {
                eligible,
                internal: 0.0,
                registered,
            };
            days
        ]
    }

    fn shipments(entries: &[(NaiveDate, u64)]) -> Vec<SupplyRecord> {
        entries
            .iter()
            .map(|&(date, doses)| SupplyRecord { date, doses })
            .collect()
    }

    #[test]
    fn merge_zero_fills_absent_dates() {
        let parameters = test_parameters();
        let series = vec![SupplySeries::new(
            "Pfizer",
            shipments(&[(date(2021, 6, 2), 100), (date(2021, 6, 4), 40)]),
        )];
        let grid = DoseGrid::merge(&parameters, &series).unwrap();
        assert_eq!(grid.doses[0], vec![0.0, 100.0, 0.0, 40.0, 0.0, 0.0]);
    }

    #[test]
    fn merge_sums_duplicate_dates() {
        let parameters = test_parameters();
        let series = vec![SupplySeries::new(
            "Pfizer",
            shipments(&[(date(2021, 6, 2), 100), (date(2021, 6, 2), 50)]),
        )];
        let grid = DoseGrid::merge(&parameters, &series).unwrap();
        assert_eq!(grid.doses[0][1], 150.0);
    }

    #[test]
    fn merge_drops_rows_outside_the_horizon() {
        let parameters = test_parameters();
        let series = vec![SupplySeries::new(
            "Pfizer",
            shipments(&[
                (date(2021, 5, 31), 999),
                (date(2021, 6, 3), 10),
                (date(2021, 6, 7), 999),
            ]),
        )];
        let grid = DoseGrid::merge(&parameters, &series).unwrap();
        assert_eq!(grid.doses[0].iter().sum::<f64>(), 10.0);
    }

    #[test]
    fn merge_rejects_duplicate_manufacturers() {
        let parameters = test_parameters();
        let series = vec![
            SupplySeries::new("Pfizer", vec![]),
            SupplySeries::new("Pfizer", vec![]),
        ];
        assert!(matches!(
            DoseGrid::merge(&parameters, &series),
            Err(VaxlineError::Configuration(_))
        ));
    }

    #[test]
    fn accumulate_builds_running_totals() {
        let parameters = test_parameters();
        let series = vec![SupplySeries::new(
            "Pfizer",
            shipments(&[(date(2021, 6, 2), 100), (date(2021, 6, 4), 40)]),
        )];
        let grid = DoseGrid::merge(&parameters, &series).unwrap().accumulate();
        assert_eq!(grid.doses[0], vec![0.0, 100.0, 100.0, 140.0, 140.0, 140.0]);
        for pair in grid.doses[0].windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }

    #[test]
    fn differencing_a_cumulative_column_recovers_the_daily_column() {
        let parameters = Parameters {
            horizon_days: 9,
            start_date: date(2021, 6, 1),
            ..Default::default()
        };
        let series = vec![SupplySeries::new(
            "Sinovac",
            shipments(&[
                (date(2021, 6, 1), 7),
                (date(2021, 6, 4), 11),
                (date(2021, 6, 9), 3),
            ]),
        )];
        let daily = DoseGrid::merge(&parameters, &series).unwrap();
        let cumulative = daily.clone().accumulate();

        let mut previous = 0.0;
        let recovered: Vec<f64> = cumulative.doses[0]
            .iter()
            .map(|&value| {
                let delta = value - previous;
                previous = value;
                delta
            })
            .collect();
        assert_eq!(recovered, daily.doses[0]);
    }

    #[test]
    fn assemble_filters_to_the_exclusive_window() {
        let parameters = test_parameters();
        let trajectory = flat_trajectory(6, 950.0, 50.0);
        let grid = DoseGrid::merge(&parameters, &[]).unwrap().accumulate();
        let timeline = MergedTimeline::assemble(&parameters, &trajectory, grid).unwrap();
        let dates: Vec<NaiveDate> = timeline.rows.iter().map(|row| row.date).collect();
        assert_eq!(dates, vec![date(2021, 6, 3), date(2021, 6, 4)]);
    }

    #[test]
    fn pre_window_shipments_still_accumulate() {
        let parameters = test_parameters();
        let trajectory = flat_trajectory(6, 950.0, 50.0);
        // Shipped June 1, before the window opens on the 2nd (exclusive).
        let series = vec![SupplySeries::new(
            "Pfizer",
            shipments(&[(date(2021, 6, 1), 30)]),
        )];
        let grid = DoseGrid::merge(&parameters, &series).unwrap().accumulate();
        let timeline = MergedTimeline::assemble(&parameters, &trajectory, grid).unwrap();
        assert_eq!(timeline.rows[0].cumulative[0], 30.0);
        assert_eq!(timeline.rows[0].total_vaccine, 30.0);
    }

    #[test]
    fn assemble_totals_across_manufacturers_and_conserves_supply() {
        let parameters = test_parameters();
        let trajectory = flat_trajectory(6, 950.0, 50.0);
        let series = vec![
            SupplySeries::new("Pfizer", shipments(&[(date(2021, 6, 2), 10)])),
            SupplySeries::new("Sinovac", shipments(&[(date(2021, 6, 3), 5)])),
        ];
        let grid = DoseGrid::merge(&parameters, &series).unwrap().accumulate();
        let timeline = MergedTimeline::assemble(&parameters, &trajectory, grid).unwrap();
        for row in &timeline.rows {
            assert_eq!(row.total_vaccine, row.cumulative.iter().sum::<f64>());
            assert!(row.first_dose >= 0.0);
            assert!(row.second_dose >= 0.0);
            assert_eq!(row.first_dose + row.second_dose, row.total_vaccine);
        }
        assert_eq!(timeline.rows[1].total_vaccine, 15.0);
    }

    #[test]
    fn abundant_supply_caps_first_doses_at_demand() {
        // 100 doses/day against a demand pinned at 50: every in-window row
        // has cumulative supply over demand, so first = 50 * 0.7.
        let parameters = Parameters {
            first_dose_fraction: 0.7,
            ..test_parameters()
        };
        let trajectory = flat_trajectory(6, 950.0, 50.0);
        let all_days: Vec<SupplyRecord> = (0..6)
            .map(|day| SupplyRecord {
                date: parameters.campaign_date(day),
                doses: 100,
            })
            .collect();
        let series = vec![SupplySeries::new("Pfizer", all_days)];
        let grid = DoseGrid::merge(&parameters, &series).unwrap().accumulate();
        let timeline = MergedTimeline::assemble(&parameters, &trajectory, grid).unwrap();
        for row in &timeline.rows {
            assert_eq!(row.first_dose, 35.0);
            assert_eq!(row.second_dose, row.total_vaccine - 35.0);
        }
    }

    #[test]
    fn scarce_supply_allocates_proportionally() {
        let parameters = Parameters {
            first_dose_fraction: 0.7,
            ..test_parameters()
        };
        let trajectory = flat_trajectory(6, 0.0, 1_000_000.0);
        let series = vec![SupplySeries::new(
            "Pfizer",
            shipments(&[(date(2021, 6, 2), 100)]),
        )];
        let grid = DoseGrid::merge(&parameters, &series).unwrap().accumulate();
        let timeline = MergedTimeline::assemble(&parameters, &trajectory, grid).unwrap();
        for row in &timeline.rows {
            assert_eq!(row.first_dose, 70.0);
            assert_eq!(row.second_dose, 30.0);
        }
    }

    #[test]
    fn independent_cap_may_leave_doses_unallocated() {
        let parameters = Parameters {
            first_dose_fraction: 0.7,
            allocation_policy: AllocationPolicy::IndependentCap,
            ..test_parameters()
        };
        let trajectory = flat_trajectory(6, 950.0, 50.0);
        let all_days: Vec<SupplyRecord> = (0..6)
            .map(|day| SupplyRecord {
                date: parameters.campaign_date(day),
                doses: 100,
            })
            .collect();
        let series = vec![SupplySeries::new("Pfizer", all_days)];
        let grid = DoseGrid::merge(&parameters, &series).unwrap().accumulate();
        let timeline = MergedTimeline::assemble(&parameters, &trajectory, grid).unwrap();
        for row in &timeline.rows {
            // first = 50 * 0.7, second = 50 * (1 - 0.7); the rest of the
            // cumulative total stays unallocated under this policy.
            assert_eq!(row.first_dose, 35.0);
            assert_relative_eq!(row.second_dose, 15.0, max_relative = 1e-12);
            assert!(row.first_dose + row.second_dose < row.total_vaccine);
        }
    }

    #[test]
    fn no_supply_yields_all_zero_supply_columns() {
        let parameters = test_parameters();
        let trajectory = flat_trajectory(6, 950.0, 50.0);
        let grid = DoseGrid::merge(&parameters, &[]).unwrap().accumulate();
        let timeline = MergedTimeline::assemble(&parameters, &trajectory, grid).unwrap();
        assert!(timeline.manufacturers.is_empty());
        for row in &timeline.rows {
            assert!(row.cumulative.is_empty());
            assert_eq!(row.total_vaccine, 0.0);
            assert_eq!(row.first_dose, 0.0);
            assert_eq!(row.second_dose, 0.0);
        }
    }

    #[test]
    fn assemble_rejects_mismatched_lengths() {
        let parameters = test_parameters();
        let trajectory = flat_trajectory(4, 950.0, 50.0);
        let grid = DoseGrid::merge(&parameters, &[]).unwrap().accumulate();
        assert!(matches!(
            MergedTimeline::assemble(&parameters, &trajectory, grid),
            Err(VaxlineError::Configuration(_))
        ));
    }

    #[test]
    fn melt_is_series_major_in_table_order() {
        let parameters = test_parameters();
        let trajectory = flat_trajectory(6, 950.0, 50.0);
        let series = vec![
            SupplySeries::new("Pfizer", shipments(&[(date(2021, 6, 2), 10)])),
            SupplySeries::new("Sinovac", shipments(&[(date(2021, 6, 3), 5)])),
        ];
        let grid = DoseGrid::merge(&parameters, &series).unwrap().accumulate();
        let timeline = MergedTimeline::assemble(&parameters, &trajectory, grid).unwrap();
        let points = timeline.melt();

        assert_eq!(points.len(), timeline.rows.len() * 7);
        let order: Vec<&str> = points
            .iter()
            .step_by(timeline.rows.len())
            .map(|point| point.series.as_str())
            .collect();
        assert_eq!(
            order,
            vec![
                "eligible",
                "registered",
                "Pfizer",
                "Sinovac",
                "total_vaccine",
                "first_dose",
                "second_dose"
            ]
        );
        // Within one series the points walk the window in date order.
        assert_eq!(points[0].date, date(2021, 6, 3));
        assert_eq!(points[1].date, date(2021, 6, 4));
        assert_eq!(points[0].value, 950.0);
    }
}
