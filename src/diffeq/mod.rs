//! Integrator schemes evaluated on the two-cell exchange oscillator.
//!
//! Two reservoirs exchange mass at a rate driven by their difference:
//! dv/dt = x − y, dx/dt = −v, dy/dt = v. This is the smallest version of
//! the pressure-driven transport the fluid solver performs on every edge,
//! and its exact solution (x = cos(√2·t) from x=1, y=−1, v=0) makes the
//! error of each scheme measurable.

/// One integration step: (h, x, y, v) → (x, y, v).
pub type Approximation = fn(f64, f64, f64, f64) -> (f64, f64, f64);

/// Advance the oscillator from (x=1, y=−1, v=0) through a quarter period
/// in `steps` steps of the given scheme, returning the final (x, v). The
/// exact endpoint is (0, √2).
pub fn approximate(steps: usize, f: Approximation) -> (f64, f64) {
    let h = std::f64::consts::PI / (2.0 * 2.0_f64.sqrt() * steps as f64);

    let (mut x, mut y, mut v) = (1.0, -1.0, 0.0);
    for _ in 0..steps {
        (x, y, v) = f(h, x, y, v);
    }

    (x, v)
}

/// Forward Euler on the velocity, trapezoid on the positions.
pub fn euler(h: f64, x: f64, y: f64, v: f64) -> (f64, f64, f64) {
    let v2 = v + h * (x - y);
    let transfer = h * (v + v2) / 2.0;
    (x - transfer, y + transfer, v2)
}

/// Trapezoid rule: average the slope at both ends of the step.
pub fn trapezoid(h: f64, x0: f64, y0: f64, v0: f64) -> (f64, f64, f64) {
    // Initial estimate of the driving difference.
    let k1 = x0 - y0;
    let v1 = v0 + h * k1;

    // Second estimate after the positions respond.
    let k2 = k1 - h * (v0 + v1);
    let h_over_2 = h / 2.0;
    let v2 = v0 + h_over_2 * (k1 + k2);
    let transfer = h_over_2 * (v0 + v2);

    (x0 - transfer, y0 + transfer, v2)
}

/// Classic fourth-order Runge–Kutta.
pub fn rk4(h: f64, x0: f64, y0: f64, v0: f64) -> (f64, f64, f64) {
    let k1 = x0 - y0;
    let h_over_2 = h / 2.0;
    let v1 = v0 + h_over_2 * k1;

    let k2 = k1 - h_over_2 * (v0 + v1);
    let v2 = v0 + h_over_2 * k2;
    let midpoint_v = (2.0 * v0 + v1 + v2) / 4.0;

    let k3 = k1 - h * midpoint_v;
    let v3 = v0 + h * k3;
    let h_over_6 = h / 6.0;
    let transfer3 = (v0 + 2.0 * v1 + 2.0 * v2 + v3) * h_over_6;
    let x3 = x0 - transfer3;
    let y3 = y0 + transfer3;

    let k4 = x3 - y3;
    let v = v0 + h_over_6 * (k1 + 2.0 * k2 + 2.0 * k3 + k4);
    let transfer = (v0 + 2.0 * v1 + 2.0 * v2 + (v3 + v) / 2.0) * h_over_6;

    (x0 - transfer, y0 + transfer, v)
}
