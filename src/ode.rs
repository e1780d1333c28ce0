//! Fixed-step fourth-order Runge-Kutta integration for small ODE systems.
//!
//! The compartmental model integrated by [`crate::projector`] has three state variables, so the
//! integrator works on fixed-size arrays and never allocates per step.

/// Advances the state `y` at time `t` by one RK4 step of size `dt`. The derivative function `f`
/// maps `(t, y)` to `dy/dt`.
pub fn rk4_step<const N: usize, F>(y: &mut [f64; N], t: f64, dt: f64, f: F)
where
    F: Fn(f64, &[f64; N]) -> [f64; N],
{
    let k1 = f(t, y);

    let mut ytmp = [0.0; N];
    for i in 0..N {
        ytmp[i] = y[i] + 0.5 * dt * k1[i];
    }
    let k2 = f(t + 0.5 * dt, &ytmp);

    for i in 0..N {
        ytmp[i] = y[i] + 0.5 * dt * k2[i];
    }
    let k3 = f(t + 0.5 * dt, &ytmp);

    for i in 0..N {
        ytmp[i] = y[i] + dt * k3[i];
    }
    let k4 = f(t + dt, &ytmp);

    for i in 0..N {
        y[i] += (dt / 6.0) * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]);
    }
}

/// Advances `y` from `t` across a unit interval using `substeps` equal RK4 steps.
pub fn rk4_unit_interval<const N: usize, F>(y: &mut [f64; N], t: f64, substeps: u32, f: F)
where
    F: Fn(f64, &[f64; N]) -> [f64; N],
{
    let dt = 1.0 / f64::from(substeps);
    for k in 0..substeps {
        let t_sub = t + f64::from(k) * dt;
        rk4_step(y, t_sub, dt, &f);
    }
}
