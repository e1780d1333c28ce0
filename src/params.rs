//! Simulation, campaign, and allocation settings.
//!
//! [`Parameters`] collects everything a run depends on: the compartmental
//! model inputs, the simulated calendar, the campaign window, and the dose
//! split. Values deserialize from a JSON file in which every field is
//! optional; missing fields take the reference campaign defaults. Call
//! [`Parameters::validate`] (done automatically by
//! [`Parameters::from_json_file`]) before handing the settings to the rest
//! of the pipeline.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use chrono::{Days, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::VaxlineError;

/// How the second-dose pool is derived once the first-dose pool is fixed.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationPolicy {
    /// `second = total - first`: every cumulative dose lands in exactly one
    /// pool.
    #[default]
    Remainder,
    /// `second = demand_capped_share(total, registered, 1 - fraction)`: the
    /// second pool is capped against demand on its own. When supply falls
    /// short of demand on one side of the cap but not the other, the pools
    /// sum to less than the cumulative total.
    IndependentCap,
}

impl FromStr for AllocationPolicy {
    type Err = VaxlineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remainder" => Ok(AllocationPolicy::Remainder),
            "independent-cap" | "independent_cap" => Ok(AllocationPolicy::IndependentCap),
            other => Err(VaxlineError::config(format!(
                "unknown allocation policy `{other}`; expected `remainder` or `independent-cap`"
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Parameters {
    /// Total population `N` shared by the three compartments.
    pub population: f64,

    /// Day-zero size of the internal (in-progress) compartment.
    pub initial_internal: f64,

    /// Day-zero size of the registered compartment.
    pub initial_registered: f64,

    /// Per-day rate at which eligible people enter the registration
    /// pipeline, scaled by the internal prevalence.
    pub uptake_rate: f64,

    /// Per-day rate at which in-progress people complete registration.
    pub registration_rate: f64,

    /// Number of simulated days after day zero.
    pub horizon_days: u32,

    /// Calendar date of simulation day zero.
    pub start_date: NaiveDate,

    /// Campaign window lower bound, exclusive.
    pub window_open: NaiveDate,

    /// Campaign window upper bound, exclusive.
    pub window_close: NaiveDate,

    /// Share of cumulative supply offered to first doses, in `[0, 1]`.
    pub first_dose_fraction: f64,

    /// Second-dose derivation rule.
    pub allocation_policy: AllocationPolicy,

    /// RK4 substeps per simulated day.
    pub steps_per_day: u32,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            population: 25_000_000.0,
            initial_internal: 1.0,
            initial_registered: 0.0,
            uptake_rate: 0.10,
            registration_rate: 1.0 / 22.0,
            horizon_days: 700,
            start_date: NaiveDate::from_ymd_opt(2020, 6, 3).unwrap(),
            window_open: NaiveDate::from_ymd_opt(2020, 12, 15).unwrap(),
            window_close: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            first_dose_fraction: 0.7,
            allocation_policy: AllocationPolicy::default(),
            steps_per_day: 10,
        }
    }
}

impl Parameters {
    /// Loads parameters from a JSON file, filling missing fields with the
    /// reference defaults, and validates them.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting parameters fail validation.
    pub fn from_json_file(path: &Path) -> Result<Parameters, VaxlineError> {
        let config_file = File::open(path)?;
        let reader = BufReader::new(config_file);
        let parameters: Parameters = serde_json::from_reader(reader)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Checks that the settings describe a well-posed run.
    ///
    /// # Errors
    /// Returns `VaxlineError::Configuration` naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), VaxlineError> {
        if !self.population.is_finite() || self.population <= 0.0 {
            return Err(VaxlineError::config(format!(
                "population must be positive and finite, got {}",
                self.population
            )));
        }
        if !self.initial_internal.is_finite() || self.initial_internal < 0.0 {
            return Err(VaxlineError::config(format!(
                "initial_internal must be non-negative and finite, got {}",
                self.initial_internal
            )));
        }
        if !self.initial_registered.is_finite() || self.initial_registered < 0.0 {
            return Err(VaxlineError::config(format!(
                "initial_registered must be non-negative and finite, got {}",
                self.initial_registered
            )));
        }
        if self.initial_internal + self.initial_registered > self.population {
            return Err(VaxlineError::config(format!(
                "initial compartments exceed the population: {} + {} > {}",
                self.initial_internal, self.initial_registered, self.population
            )));
        }
        if !self.uptake_rate.is_finite() || self.uptake_rate < 0.0 {
            return Err(VaxlineError::config(format!(
                "uptake_rate must be non-negative and finite, got {}",
                self.uptake_rate
            )));
        }
        if !self.registration_rate.is_finite() || self.registration_rate < 0.0 {
            return Err(VaxlineError::config(format!(
                "registration_rate must be non-negative and finite, got {}",
                self.registration_rate
            )));
        }
        if self.horizon_days == 0 {
            return Err(VaxlineError::config("horizon_days must be at least 1"));
        }
        if self
            .start_date
            .checked_add_days(Days::new(u64::from(self.horizon_days)))
            .is_none()
        {
            return Err(VaxlineError::config(format!(
                "horizon of {} days from {} runs past the representable calendar",
                self.horizon_days, self.start_date
            )));
        }
        if self.window_open >= self.window_close {
            return Err(VaxlineError::config(format!(
                "campaign window is empty: {} .. {}",
                self.window_open, self.window_close
            )));
        }
        if !self.first_dose_fraction.is_finite()
            || !(0.0..=1.0).contains(&self.first_dose_fraction)
        {
            return Err(VaxlineError::config(format!(
                "first_dose_fraction must lie in [0, 1], got {}",
                self.first_dose_fraction
            )));
        }
        if self.steps_per_day == 0 {
            return Err(VaxlineError::config("steps_per_day must be at least 1"));
        }
        Ok(())
    }

    /// Calendar date of simulation day `day`. Valid for `day <=
    /// horizon_days` on validated parameters.
    #[must_use]
    pub fn campaign_date(&self, day: u32) -> NaiveDate {
        self.start_date + TimeDelta::days(i64::from(day))
    }

    /// `true` when `date` lies strictly inside the campaign window.
    #[must_use]
    pub fn in_campaign_window(&self, date: NaiveDate) -> bool {
        date > self.window_open && date < self.window_close
    }
}
