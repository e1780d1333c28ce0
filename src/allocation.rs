//! Splitting cumulative supply into first- and second-dose pools.

use crate::params::AllocationPolicy;

/// The demand-capped proportional share: a `fraction` of whichever of
/// `supply` and `demand` is smaller.
///
/// While supply runs short of demand the share scales with supply; once
/// supply covers demand the share is capped by demand and surplus doses
/// stop inflating the pool.
#[must_use]
pub fn demand_capped_share(supply: f64, demand: f64, fraction: f64) -> f64 {
    if supply < demand {
        supply * fraction
    } else {
        demand * fraction
    }
}

/// Splits `total_vaccine` into `(first_dose, second_dose)` for one day.
///
/// The first pool is always `demand_capped_share(total_vaccine,
/// registered, fraction)`. The second depends on the policy:
/// [`AllocationPolicy::Remainder`] assigns everything left of the total,
/// so the pools always sum to `total_vaccine`;
/// [`AllocationPolicy::IndependentCap`] caps the second pool against
/// demand on its own, which can leave part of the total unallocated.
#[must_use]
pub fn split_supply(
    total_vaccine: f64,
    registered: f64,
    fraction: f64,
    policy: AllocationPolicy,
) -> (f64, f64) {
    let first_dose = demand_capped_share(total_vaccine, registered, fraction);
    let second_dose = match policy {
        AllocationPolicy::Remainder => total_vaccine - first_dose,
        AllocationPolicy::IndependentCap => {
            demand_capped_share(total_vaccine, registered, 1.0 - fraction)
        }
    };
    (first_dose, second_dose)
}
