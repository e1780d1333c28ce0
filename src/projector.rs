//! Registration demand projector.
//!
//! A three-compartment model proxies how a population moves toward vaccine
//! registration: `eligible` people enter an `internal` in-progress pool at a
//! rate driven by contact with that pool, and complete into `registered` at
//! a fixed per-day rate. The compartment sum is invariant, so the trajectory
//! doubles as its own consistency check.
//!
//! The projector integrates the system with fixed-step RK4 and reports one
//! [`PopulationState`] per simulated day, day 0 through the horizon
//! inclusive. Only `eligible` and `registered` feed the downstream
//! allocation tables; `internal` exists to shape the dynamics.

use crate::error::VaxlineError;
use crate::log::trace;
use crate::ode::rk4_unit_interval;
use crate::params::Parameters;

/// Compartment values for one simulated day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationState {
    pub eligible: f64,
    pub internal: f64,
    pub registered: f64,
}

impl PopulationState {
    /// Sum of the three compartments. Equal to the configured population up
    /// to integration tolerance.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.eligible + self.internal + self.registered
    }
}

/// Integrates the compartmental model over the configured horizon.
///
/// Returns `horizon_days + 1` states, index = simulated day. The
/// right-hand side is
///
/// ```text
/// d(eligible)/dt   = -uptake_rate * eligible * internal / population
/// d(internal)/dt   =  uptake_rate * eligible * internal / population
///                     - registration_rate * internal
/// d(registered)/dt =  registration_rate * internal
/// ```
///
/// # Errors
/// `VaxlineError::Configuration` if the parameters fail validation;
/// `VaxlineError::Integration` if any compartment turns non-finite, which
/// only happens when the supplied rates put the solver far outside its
/// stability region.
pub fn project(parameters: &Parameters) -> Result<Vec<PopulationState>, VaxlineError> {
    parameters.validate()?;

    let population = parameters.population;
    let uptake_rate = parameters.uptake_rate;
    let registration_rate = parameters.registration_rate;
    let derivative = move |_t: f64, y: &[f64; 3]| {
        let uptake = uptake_rate * y[0] * y[1] / population;
        [
            -uptake,
            uptake - registration_rate * y[1],
            registration_rate * y[1],
        ]
    };

    let mut y = [
        parameters.population - parameters.initial_internal - parameters.initial_registered,
        parameters.initial_internal,
        parameters.initial_registered,
    ];
    let mut trajectory = Vec::with_capacity(parameters.horizon_days as usize + 1);
    trajectory.push(PopulationState {
        eligible: y[0],
        internal: y[1],
        registered: y[2],
    });

    for day in 0..parameters.horizon_days {
        rk4_unit_interval(&mut y, f64::from(day), parameters.steps_per_day, &derivative);
        if !y.iter().all(|value| value.is_finite()) {
            return Err(VaxlineError::Integration(format!(
                "non-finite compartment value at day {}",
                day + 1
            )));
        }
        trace!(
            "day {}: eligible={:.2} internal={:.2} registered={:.2}",
            day + 1,
            y[0],
            y[1],
            y[2]
        );
        trajectory.push(PopulationState {
            eligible: y[0],
            internal: y[1],
            registered: y[2],
        });
    }

    Ok(trajectory)
}
